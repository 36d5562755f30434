//! Navigator layout: current task, siblings, subtasks and the toast line
//!
//! Everything drawn comes from the session cache; drawing never fetches.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::app::App;
use crate::domain::{position_of, Sibling, TaskId};
use crate::storage::NavCache;

/// What the cache knows around the current task
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub current: Option<TaskId>,
    pub parent: Option<TaskId>,
    pub siblings: Vec<Sibling>,
    pub sibling_idx: Option<usize>,
    pub children: Vec<Sibling>,
    /// The child a move down would pick
    pub child_idx: Option<usize>,
}

impl Snapshot {
    pub fn from_cache(cache: &NavCache, current: Option<&TaskId>) -> Self {
        let Some(current) = current else {
            return Self::default();
        };

        let parent = cache.get_parent(current).cloned();
        let siblings = parent
            .as_ref()
            .and_then(|p| cache.get_children(p))
            .map(|entry| entry.siblings.clone())
            .unwrap_or_default();
        let sibling_idx = position_of(&siblings, current);

        let children = cache
            .get_children(current)
            .map(|entry| entry.siblings.clone())
            .unwrap_or_default();
        let child_idx = (!children.is_empty()).then(|| {
            cache
                .get_last_visited(current)
                .and_then(|last| {
                    if last.still_matches(&children) {
                        Some(last.idx)
                    } else {
                        position_of(&children, &last.id)
                    }
                })
                .unwrap_or(0)
        });

        Self {
            current: Some(current.clone()),
            parent,
            siblings,
            sibling_idx,
            children,
            child_idx,
        }
    }

    /// Name of the current task, when its parent's children are cached
    pub fn current_name(&self) -> Option<&str> {
        self.sibling_idx
            .and_then(|idx| self.siblings.get(idx))
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Cuts `s` to `max` characters, marking the cut with an ellipsis
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut clipped: String = s.chars().take(max.saturating_sub(1)).collect();
    clipped.push('\u{2026}');
    clipped
}

pub fn draw(frame: &mut Frame, app: &App) {
    let snapshot = app.snapshot();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Current task
            Constraint::Min(5),    // Siblings | subtasks
            Constraint::Length(3), // Toast / help
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    draw_header(frame, app, &snapshot, rows[0]);
    draw_list(
        frame,
        columns[0],
        "Siblings",
        &snapshot.siblings,
        snapshot.sibling_idx,
        Color::Cyan,
    );
    draw_list(
        frame,
        columns[1],
        "Subtasks",
        &snapshot.children,
        snapshot.child_idx,
        Color::Green,
    );
    draw_status(frame, app, rows[2]);
}

fn draw_header(frame: &mut Frame, app: &App, snapshot: &Snapshot, area: Rect) {
    let text = match (&snapshot.current, snapshot.current_name()) {
        (None, _) => Line::from("No current task. Run 'subnav goto <id>' first."),
        (Some(id), name) => {
            let mut spans = vec![Span::styled(
                id.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if let Some(name) = name {
                spans.push(Span::raw(format!("  {}", clip(name, 60))));
            }
            if let Some(parent) = &snapshot.parent {
                spans.push(Span::styled(
                    format!("   parent {}", parent),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
    };

    let title = format!("subnav [{}]", app.session_name());
    let header = Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    entries: &[Sibling],
    selected: Option<usize>,
    accent: Color,
) {
    let width = usize::from(area.width.saturating_sub(14));
    let items: Vec<ListItem> = entries
        .iter()
        .map(|s| ListItem::new(format!("{:<8} {}", s.id, clip(&s.name, width))))
        .collect();

    let title = match selected {
        Some(idx) => format!("{} ({} / {})", title, idx + 1, entries.len()),
        None => format!("{} ({})", title, entries.len()),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.toast() {
        Some((message, true)) => Line::from(Span::styled(message, Style::default().fg(Color::Yellow))),
        Some((message, false)) => Line::from(Span::styled(message, Style::default().fg(Color::Green))),
        None => Line::from(Span::styled(
            "\u{2191}\u{2193} siblings  Home/End first/last  \u{2190} parent  \u{2192} subtask  q quit",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let status = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}
