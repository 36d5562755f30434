//! Hierarchy backed by the project's `tasks.jsonl`

use crate::domain::{Sibling, TaskId, TaskRef, PAGE_SIZE};
use crate::storage::TaskStore;

use super::{HierarchyClient, HierarchyError};

/// Local hierarchy client
///
/// Every call re-reads the store, so edits made between commands (moves,
/// removals) are seen the same way a remote backend's changes would be.
pub struct LocalHierarchy {
    store: TaskStore,
}

impl LocalHierarchy {
    pub fn new(store: TaskStore) -> Self {
        Self { store }
    }
}

impl HierarchyClient for LocalHierarchy {
    fn get_task(&self, id: &TaskId) -> Result<TaskRef, HierarchyError> {
        let task = self
            .store
            .get(id)
            .map_err(|e| HierarchyError::transport(format!("{:#}", e)))?
            .ok_or_else(|| HierarchyError::NotFound(id.clone()))?;

        Ok(TaskRef {
            id: task.id,
            parent: task.parent,
        })
    }

    fn get_children(&self, parent: &TaskId) -> Result<Vec<Sibling>, HierarchyError> {
        let tasks = self
            .store
            .read_all()
            .map_err(|e| HierarchyError::transport(format!("{:#}", e)))?;

        if !tasks.iter().any(|t| &t.id == parent) {
            return Err(HierarchyError::NotFound(parent.clone()));
        }

        Ok(tasks
            .iter()
            .filter(|t| t.parent.as_ref() == Some(parent))
            .take(PAGE_SIZE)
            .map(|t| t.as_sibling())
            .collect())
    }
}
