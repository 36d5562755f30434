//! # Hierarchy Clients
//!
//! A hierarchy client answers two questions about a task tree:
//! what is the parent of this task, and what are the children of this
//! parent (in the backend's own order, at most [`PAGE_SIZE`] of them).
//!
//! | Backend | Source |
//! |---------|--------|
//! | [`LocalHierarchy`] | `.subnav/tasks.jsonl` |
//! | [`AsanaClient`] | Asana REST API |
//!
//! Both report an unknown id as [`HierarchyError::NotFound`]; everything
//! else that goes wrong is [`HierarchyError::Transport`].

mod asana;
mod local;
#[cfg(test)]
pub(crate) mod memory;

use anyhow::Result;
use thiserror::Error;

pub use asana::AsanaClient;
pub use local::LocalHierarchy;

use crate::domain::{Sibling, TaskId, TaskRef};
use crate::storage::{Project, SourceKind};

pub use crate::domain::PAGE_SIZE;

#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Hierarchy request failed: {0}")]
    Transport(String),
}

impl HierarchyError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        HierarchyError::Transport(err.to_string())
    }
}

/// Parent/children lookups against a task tree
pub trait HierarchyClient {
    /// Fetches a task's parent link
    fn get_task(&self, id: &TaskId) -> Result<TaskRef, HierarchyError>;

    /// Fetches up to [`PAGE_SIZE`] children of `parent`, in backend order
    fn get_children(&self, parent: &TaskId) -> Result<Vec<Sibling>, HierarchyError>;
}

impl<T: HierarchyClient + ?Sized> HierarchyClient for Box<T> {
    fn get_task(&self, id: &TaskId) -> Result<TaskRef, HierarchyError> {
        (**self).get_task(id)
    }

    fn get_children(&self, parent: &TaskId) -> Result<Vec<Sibling>, HierarchyError> {
        (**self).get_children(parent)
    }
}

/// Opens the backend configured for a project
pub fn open(project: &Project) -> Result<Box<dyn HierarchyClient>> {
    let config = &project.config().project;
    tracing::debug!(source = config.source.as_str(), "opening hierarchy backend");

    match config.source {
        SourceKind::Local => Ok(Box::new(LocalHierarchy::new(project.task_store()))),
        SourceKind::Asana => Ok(Box::new(AsanaClient::from_config(&config.asana)?)),
    }
}
