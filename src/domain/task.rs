//! Task records and the views of them the navigator works with
//!
//! A [`TaskRecord`] is a full row in a hierarchy (id, name, parent).
//! A [`Sibling`] is one entry in a children enumeration: identity is the id,
//! the name is carried along for display only.

use serde::{Deserialize, Serialize};

use super::id::TaskId;

/// Maximum number of children a single hierarchy fetch returns
///
/// A children list of exactly this length may be truncated.
pub const PAGE_SIZE: usize = 100;

/// A task as stored by a hierarchy backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task id
    pub id: TaskId,

    /// Display name
    pub name: String,

    /// Parent task; `None` for a root task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
}

impl TaskRecord {
    /// Creates a root task
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
        }
    }

    /// Creates a subtask under `parent`
    pub fn child_of(id: TaskId, name: impl Into<String>, parent: TaskId) -> Self {
        Self {
            id,
            name: name.into(),
            parent: Some(parent),
        }
    }

    /// Returns true if the task has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The entry this task contributes to its parent's children list
    pub fn as_sibling(&self) -> Sibling {
        Sibling {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// The parent link of a task, as reported by a hierarchy backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub id: TaskId,
    pub parent: Option<TaskId>,
}

/// One entry of an ordered children enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sibling {
    pub id: TaskId,
    #[serde(default)]
    pub name: String,
}

impl Sibling {
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The most recent navigation position under a parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastVisited {
    /// The child that was visited
    pub id: TaskId,
    /// Its index in the parent's children list at the time
    pub idx: usize,
}

impl LastVisited {
    pub fn new(id: TaskId, idx: usize) -> Self {
        Self { id, idx }
    }

    /// Returns true if `siblings[idx]` is still the recorded child
    pub fn still_matches(&self, siblings: &[Sibling]) -> bool {
        siblings.get(self.idx).is_some_and(|s| s.id == self.id)
    }
}

/// Linear scan for the first sibling with the given id
pub fn position_of(siblings: &[Sibling], id: &TaskId) -> Option<usize> {
    siblings.iter().position(|s| &s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn siblings(ids: &[&str]) -> Vec<Sibling> {
        ids.iter().map(|s| Sibling::new(id(s), format!("Task {}", s))).collect()
    }

    #[test]
    fn record_roundtrips_without_parent_field() {
        let root = TaskRecord::new(id("1"), "Root");
        let json = serde_json::to_string(&root).unwrap();
        assert!(!json.contains("parent"));

        let child = TaskRecord::child_of(id("2"), "Child", id("1"));
        let parsed: TaskRecord = serde_json::from_str(&serde_json::to_string(&child).unwrap()).unwrap();
        assert_eq!(parsed.parent, Some(id("1")));
        assert!(!parsed.is_root());
    }

    #[test]
    fn last_visited_matches_only_at_recorded_index() {
        let list = siblings(&["a", "b", "c"]);
        assert!(LastVisited::new(id("b"), 1).still_matches(&list));
        assert!(!LastVisited::new(id("b"), 2).still_matches(&list));
        assert!(!LastVisited::new(id("b"), 7).still_matches(&list));
    }

    #[test]
    fn position_of_finds_first_match() {
        let list = siblings(&["a", "b", "c"]);
        assert_eq!(position_of(&list, &id("c")), Some(2));
        assert_eq!(position_of(&list, &id("z")), None);
    }
}
