//! Navigator state and main loop

use std::cell::RefCell;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::event::{Event, EventHandler};
use super::keys::{self, Action};
use super::view::{self, Snapshot};
use super::Terminal;
use crate::cli::nav_cmd::{open_dispatcher, CliDispatcher};
use crate::domain::{Command, TaskId};
use crate::nav::{Collaborators, Notifier, PageContext, Report};
use crate::storage::{FileSession, Project, StateFile};

struct Toast {
    message: String,
    is_boundary: bool,
    shown_at: Instant,
}

/// Keeps the latest status line until it expires
#[derive(Default)]
pub struct ToastNotifier {
    current: RefCell<Option<Toast>>,
}

impl ToastNotifier {
    /// Message and boundary flag of the visible toast
    pub fn visible(&self) -> Option<(String, bool)> {
        self.current
            .borrow()
            .as_ref()
            .map(|t| (t.message.clone(), t.is_boundary))
    }

    /// Clears the toast once it has been shown for `ttl`
    pub fn expire(&self, now: Instant, ttl: Duration) {
        let mut current = self.current.borrow_mut();
        if current
            .as_ref()
            .is_some_and(|t| now.duration_since(t.shown_at) >= ttl)
        {
            *current = None;
        }
    }
}

impl Notifier for ToastNotifier {
    fn show(&self, message: &str, is_boundary: bool) {
        *self.current.borrow_mut() = Some(Toast {
            message: message.to_string(),
            is_boundary,
            shown_at: Instant::now(),
        });
    }
}

pub struct App {
    dispatcher: CliDispatcher,
    state: StateFile,
    session_name: String,
    toasts: ToastNotifier,
    toast_ttl: Duration,
    should_quit: bool,
}

impl App {
    pub fn new(project: &Project, session: Option<&str>) -> Result<Self> {
        let dispatcher = open_dispatcher(project, session)?;
        let app = Self {
            dispatcher,
            state: project.state(),
            session_name: FileSession::resolve_name(session),
            toasts: ToastNotifier::default(),
            toast_ttl: Duration::from_millis(project.config().project.tui.toast_ms),
            should_quit: false,
        };

        if let Some(task) = app.state.current_task_id() {
            app.prime(&task);
        }
        Ok(app)
    }

    pub fn run(&mut self, terminal: &mut Terminal, events: EventHandler) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| view::draw(frame, self))?;

            match events.next()? {
                Event::Key(key) => match keys::action_for(key) {
                    Some(Action::Quit) => self.should_quit = true,
                    Some(Action::Navigate(command)) => self.navigate(command),
                    None => {}
                },
                Event::Resize => {}
                Event::Tick => self.toasts.expire(Instant::now(), self.toast_ttl),
            }
        }

        Ok(())
    }

    fn navigate(&self, command: Command) {
        let collab = Collaborators {
            page: &self.state,
            router: &self.state,
            notifier: &self.toasts,
        };

        if let Report::Moved { target, .. } = self.dispatcher.dispatch(command, &collab) {
            self.prime(&target);
        }
    }

    /// Loads siblings and subtasks of `task` into the cache for display
    fn prime(&self, task: &TaskId) {
        let result = self
            .dispatcher
            .locate(task)
            .and_then(|_| self.dispatcher.children(task));

        if let Err(err) = result {
            tracing::debug!(%task, error = %err, "could not load surroundings");
            self.toasts.show(err.message(), true);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let current = self.state.current_task_id();
        Snapshot::from_cache(&self.dispatcher.cache(), current.as_ref())
    }

    pub fn toast(&self) -> Option<(String, bool)> {
        self.toasts.visible()
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }
}
