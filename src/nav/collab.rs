//! Collaborators the dispatcher talks to
//!
//! - [`PageContext`]: which task is open right now
//! - [`Router`]: open a different task in place
//! - [`Notifier`]: show a short status line
//!
//! The state file serves as both page context and router for the CLI; a
//! [`Location`] pins the current task to a URL or path given on the command
//! line.

use reqwest::Url;

use crate::domain::TaskId;
use crate::storage::StateFile;

pub trait PageContext {
    /// The open task, or `None` when not looking at a task
    fn current_task_id(&self) -> Option<TaskId>;
}

pub trait Router {
    /// Opens `target`; `false` means a move is not possible from here
    fn navigate_to(&self, target: &TaskId) -> bool;
}

pub trait Notifier {
    /// Shows a transient message; `is_boundary` marks boundary and error text
    fn show(&self, message: &str, is_boundary: bool);
}

/// The three collaborators of one dispatch
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub page: &'a dyn PageContext,
    pub router: &'a dyn Router,
    pub notifier: &'a dyn Notifier,
}

impl PageContext for StateFile {
    fn current_task_id(&self) -> Option<TaskId> {
        match self.current() {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "ignoring unreadable state file");
                None
            }
        }
    }
}

impl Router for StateFile {
    fn navigate_to(&self, target: &TaskId) -> bool {
        match self.set_current(target) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(task = %target, error = %format!("{:#}", e), "failed to open task");
                false
            }
        }
    }
}

/// A task location given as a URL, a path or a bare id
#[derive(Debug, Clone)]
pub struct Location(String);

impl Location {
    pub fn new(input: impl Into<String>) -> Self {
        Self(input.into())
    }
}

impl PageContext for Location {
    fn current_task_id(&self) -> Option<TaskId> {
        let input = self.0.trim();

        if let Ok(url) = Url::parse(input) {
            if url.has_host() {
                return TaskId::from_location(url.path());
            }
        }
        if input.contains('/') {
            return TaskId::from_location(input);
        }
        input.parse().ok()
    }
}

#[cfg(test)]
pub(crate) mod doubles {
    use std::cell::RefCell;

    use super::*;

    /// Address bar plus router: accepted moves change the current task
    pub struct FakePage {
        current: RefCell<Option<TaskId>>,
        accept: bool,
        pub visits: RefCell<Vec<TaskId>>,
    }

    impl FakePage {
        pub fn at(task: &str) -> Self {
            Self {
                current: RefCell::new(Some(task.parse().unwrap())),
                accept: true,
                visits: RefCell::new(Vec::new()),
            }
        }

        pub fn nowhere() -> Self {
            Self {
                current: RefCell::new(None),
                accept: true,
                visits: RefCell::new(Vec::new()),
            }
        }

        pub fn rejecting(task: &str) -> Self {
            Self {
                accept: false,
                ..Self::at(task)
            }
        }

        pub fn current(&self) -> Option<TaskId> {
            self.current.borrow().clone()
        }
    }

    impl PageContext for FakePage {
        fn current_task_id(&self) -> Option<TaskId> {
            self.current()
        }
    }

    impl Router for FakePage {
        fn navigate_to(&self, target: &TaskId) -> bool {
            if !self.accept {
                return false;
            }
            self.visits.borrow_mut().push(target.clone());
            *self.current.borrow_mut() = Some(target.clone());
            true
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub shown: RefCell<Vec<(String, bool)>>,
    }

    impl RecordingNotifier {
        pub fn last(&self) -> Option<(String, bool)> {
            self.shown.borrow().last().cloned()
        }
    }

    impl Notifier for RecordingNotifier {
        fn show(&self, message: &str, is_boundary: bool) {
            self.shown.borrow_mut().push((message.to_string(), is_boundary));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn current(input: &str) -> Option<String> {
        Location::new(input)
            .current_task_id()
            .map(|id| id.to_string())
    }

    #[test]
    fn location_from_url() {
        assert_eq!(current("https://app.asana.com/0/111/222").as_deref(), Some("222"));
        assert_eq!(
            current("https://app.asana.com/1/9/project/111/task/333?focus=true").as_deref(),
            Some("333")
        );
        assert_eq!(current("https://app.asana.com/0/home"), None);
    }

    #[test]
    fn location_from_path_or_id() {
        assert_eq!(current("/0/111/222").as_deref(), Some("222"));
        assert_eq!(current("444").as_deref(), Some("444"));
        assert_eq!(current("  "), None);
    }

    #[test]
    fn state_file_is_page_and_router() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state.json"));
        assert!(state.current_task_id().is_none());

        let target: TaskId = "5".parse().unwrap();
        assert!(state.navigate_to(&target));
        assert_eq!(state.current_task_id(), Some(target));
    }

    #[test]
    fn unwritable_state_rejects_navigation() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("state.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let state = StateFile::new(path);

        assert!(!state.navigate_to(&"5".parse().unwrap()));
    }
}
