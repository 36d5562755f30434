//! Domain models for subnav
//!
//! Contains the core navigation logic without any I/O concerns.

mod id;
mod task;
pub mod navigation;

pub use id::{IdError, TaskId};
pub use navigation::{Command, Direction, Edge, Outcome, Resolution};
pub use task::{position_of, LastVisited, Sibling, TaskRecord, TaskRef, PAGE_SIZE};
