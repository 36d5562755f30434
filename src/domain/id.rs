//! Task identifiers
//!
//! A task id is an opaque string handed out by the hierarchy backend.
//! In practice it is a numeric string (`"1204398120943"`), but nothing
//! in the engine depends on that: equality is exact string match.
//!
//! Ids can also be recovered from a location path the way a task page
//! encodes them:
//! - `/…/task/{digits}` anywhere in the path wins
//! - otherwise the last path segment, if it is all digits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Task ID cannot be empty")]
    Empty,

    #[error("Invalid task ID '{0}': whitespace is not allowed")]
    Whitespace(String),
}

/// Opaque task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of the id, if it is a numeric string
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Extracts a task id from a location path (`/0/123/456`, `/task/456`)
    pub fn from_location(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let tagged = segments
            .windows(2)
            .find(|pair| pair[0] == "task" && is_digits(pair[1]))
            .map(|pair| pair[1]);

        let found = tagged.or_else(|| segments.last().copied().filter(|s| is_digits(s)))?;
        Some(Self(found.to_string()))
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
