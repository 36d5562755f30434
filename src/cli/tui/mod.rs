//! Interactive navigator
//!
//! A full-screen view of the current task with its cached siblings and
//! subtasks. Keys dispatch the same six commands as the CLI (see [`keys`])
//! and results show as a short-lived toast.

mod app;
mod event;
mod keys;
mod view;

use std::io::{self, Stdout};
use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::CrosstermBackend;

use super::Output;
use crate::storage::Project;
use app::App;
use event::EventHandler;

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Idle time between ticks; bounds how late a toast disappears
const TICK_MS: u64 = 100;

fn init_terminal() -> Result<Terminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(ratatui::Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Launches the navigator
pub fn run(output: &Output, session: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    output.verbose_ctx("tui", "Loading session cache");

    // Build the app before touching the terminal so errors print normally
    let mut app = App::new(&project, session)?;

    let mut terminal = init_terminal()?;
    let events = EventHandler::new(TICK_MS);

    let result = panic::catch_unwind(AssertUnwindSafe(|| app.run(&mut terminal, events)));
    let restored = restore_terminal();

    match result {
        Ok(inner) => {
            restored?;
            inner
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown error".to_string());
            Err(anyhow!("Navigator panicked: {}", reason))
        }
    }
}
