//! Key bindings
//!
//! | Keys | Command |
//! |------|---------|
//! | `Shift+Alt+Up`, `Up`, `k` | previous sibling |
//! | `Shift+Alt+Down`, `Down`, `j` | next sibling |
//! | `Shift+Alt+Home`, `Home` | first sibling |
//! | `Shift+Alt+End`, `End` | last sibling |
//! | `Shift+Alt+Left`, `Left`, `h` | parent |
//! | `Shift+Alt+Right`, `Right`, `l` | remembered (or first) child |
//! | `q`, `Esc`, `Ctrl+C` | quit |

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::domain::{Command, Direction, Edge};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Command),
    Quit,
}

pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    // Arrows and Home/End work bare or with Shift+Alt; letters only bare
    let chord = KeyModifiers::SHIFT | KeyModifiers::ALT;
    let bare = key.modifiers.is_empty();
    if !bare && key.modifiers != chord {
        return None;
    }

    let command = match key.code {
        KeyCode::Up => Command::Step(Direction::Prev),
        KeyCode::Down => Command::Step(Direction::Next),
        KeyCode::Home => Command::Edge(Edge::First),
        KeyCode::End => Command::Edge(Edge::Last),
        KeyCode::Left => Command::ToParent,
        KeyCode::Right => Command::ToChild,
        KeyCode::Char(c) if bare => match c {
            'k' => Command::Step(Direction::Prev),
            'j' => Command::Step(Direction::Next),
            'h' => Command::ToParent,
            'l' => Command::ToChild,
            'q' => return Some(Action::Quit),
            _ => return None,
        },
        KeyCode::Esc if bare => return Some(Action::Quit),
        _ => return None,
    };
    Some(Action::Navigate(command))
}
