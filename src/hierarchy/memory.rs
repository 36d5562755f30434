//! In-memory hierarchy for tests, with call counters

use std::cell::{Cell, RefCell};

use crate::domain::{Sibling, TaskId, TaskRecord, TaskRef, PAGE_SIZE};

use super::{HierarchyClient, HierarchyError};

#[derive(Default)]
pub struct MemoryHierarchy {
    tasks: RefCell<Vec<TaskRecord>>,
    task_calls: Cell<usize>,
    children_calls: Cell<usize>,
    offline: Cell<bool>,
}

pub fn id(s: &str) -> TaskId {
    s.parse().unwrap()
}

impl MemoryHierarchy {
    /// `parent` with `children` under it, in order
    pub fn with_family(parent: &str, children: &[&str]) -> Self {
        let hierarchy = Self::default();
        hierarchy.add(parent, None);
        for child in children {
            hierarchy.add(child, Some(parent));
        }
        hierarchy
    }

    pub fn add(&self, task: &str, parent: Option<&str>) {
        self.tasks.borrow_mut().push(TaskRecord {
            id: id(task),
            name: format!("Task {}", task),
            parent: parent.map(id),
        });
    }

    /// Moves `task` to the end of `parent`'s children
    pub fn reparent(&self, task: &str, parent: &str) {
        let mut tasks = self.tasks.borrow_mut();
        let pos = tasks.iter().position(|t| t.id == id(task)).unwrap();
        let mut record = tasks.remove(pos);
        record.parent = Some(id(parent));
        tasks.push(record);
    }

    pub fn remove(&self, task: &str) {
        self.tasks.borrow_mut().retain(|t| t.id != id(task));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn task_calls(&self) -> usize {
        self.task_calls.get()
    }

    pub fn children_calls(&self) -> usize {
        self.children_calls.get()
    }

    fn check_online(&self) -> Result<(), HierarchyError> {
        if self.offline.get() {
            return Err(HierarchyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

impl HierarchyClient for MemoryHierarchy {
    fn get_task(&self, task: &TaskId) -> Result<TaskRef, HierarchyError> {
        self.task_calls.set(self.task_calls.get() + 1);
        self.check_online()?;

        self.tasks
            .borrow()
            .iter()
            .find(|t| &t.id == task)
            .map(|t| TaskRef {
                id: t.id.clone(),
                parent: t.parent.clone(),
            })
            .ok_or_else(|| HierarchyError::NotFound(task.clone()))
    }

    fn get_children(&self, parent: &TaskId) -> Result<Vec<Sibling>, HierarchyError> {
        self.children_calls.set(self.children_calls.get() + 1);
        self.check_online()?;

        let tasks = self.tasks.borrow();
        if !tasks.iter().any(|t| &t.id == parent) {
            return Err(HierarchyError::NotFound(parent.clone()));
        }
        Ok(tasks
            .iter()
            .filter(|t| t.parent.as_ref() == Some(parent))
            .take(PAGE_SIZE)
            .map(TaskRecord::as_sibling)
            .collect())
    }
}
