//! subnav - keyboard navigation through parent/subtask trees
//!
//! Given the task that is currently open, subnav moves to its previous,
//! next, first or last sibling, up to its parent, or down into the subtask
//! visited last. Hierarchy lookups go through a session-scoped cache that
//! keeps repeated moves cheap and recovers when tasks were moved or deleted
//! behind its back.

pub mod domain;
pub mod storage;
pub mod hierarchy;
pub mod nav;
pub mod cli;

pub use domain::{Command, TaskId};
pub use nav::{Dispatcher, Resolver};
