//! Navigation failures and their status lines

use thiserror::Error;

use crate::domain::TaskId;
use crate::hierarchy::HierarchyError;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Hierarchy unavailable: {0}")]
    Transport(String),

    #[error("Task {0} has no parent")]
    NoParent(TaskId),

    /// `truncated` is set when the sibling list filled a whole fetch page
    #[error("Task {task} not found among its siblings")]
    SiblingNotFound { task: TaskId, truncated: bool },

    #[error("Could not open task {0}")]
    RouterRejected(TaskId),
}

impl NavError {
    /// Short text for the status line
    pub fn message(&self) -> &'static str {
        match self {
            NavError::NotFound(_) => "Not a task",
            NavError::Transport(_) => "Error, see log",
            NavError::NoParent(_) => "No parent task",
            NavError::SiblingNotFound { truncated: true, .. } => "Too many siblings (100+)",
            NavError::SiblingNotFound { truncated: false, .. } => "Task not found in siblings",
            NavError::RouterRejected(_) => "Navigation unavailable",
        }
    }
}

impl From<HierarchyError> for NavError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::NotFound(id) => NavError::NotFound(id),
            HierarchyError::Transport(msg) => NavError::Transport(msg),
        }
    }
}
