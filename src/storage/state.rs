//! Current-task state
//!
//! `.subnav/state.json` records which task is "open". It plays the part a
//! browser address bar plays for a web client: navigation reads the current
//! task from it and a successful move writes the target back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::TaskId;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateRecord {
    #[serde(default)]
    current: Option<TaskId>,
}

/// File holding the current task
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".subnav").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current task, if one is open
    pub fn current(&self) -> Result<Option<TaskId>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state: {}", self.path.display()))?;
        let record: StateRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state: {}", self.path.display()))?;
        Ok(record.current)
    }

    /// Opens `task`
    pub fn set_current(&self, task: &TaskId) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let record = StateRecord {
            current: Some(task.clone()),
        };
        let content = serde_json::to_string_pretty(&record).context("Failed to serialize state")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write state: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace state: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_state_means_no_current_task() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state.json"));
        assert!(state.current().unwrap().is_none());
    }

    #[test]
    fn set_and_read_current() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state.json"));
        let task: TaskId = "77".parse().unwrap();

        state.set_current(&task).unwrap();
        assert_eq!(state.current().unwrap(), Some(task));
    }

    #[test]
    fn corrupt_state_is_an_error() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state.json"));
        fs::write(state.path(), "garbage").unwrap();
        assert!(state.current().is_err());
    }
}
