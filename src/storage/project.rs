//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, FileSession, StateFile, TaskStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a subnav project. Run 'subnav init' first.")]
    NotInProject,
}

/// A subnav project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let subnav_dir = root.join(".subnav");

        if !subnav_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let subnav_dir = root.join(".subnav");

        // Create directory structure
        fs::create_dir_all(&subnav_dir).with_context(|| {
            format!("Failed to create .subnav directory: {}", subnav_dir.display())
        })?;

        let cache_dir = subnav_dir.join(".cache");
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

        // Create default config
        let config_path = subnav_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# subnav configuration

# Hierarchy backend: "local" (.subnav/tasks.jsonl) or "asana"
source = "local"

[cache]
# How long a fetched children list is reused (milliseconds)
ttl_ms = 60000
# Maximum number of children lists kept per session
capacity = 20

[asana]
base_url = "https://app.asana.com/api/1.0"
token_env = "ASANA_TOKEN"
timeout_secs = 10

[tui]
toast_ms = 1200
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        // Create .gitignore for .subnav
        let gitignore_path = subnav_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Session caches (per terminal session, regenerated)
.cache/

# Current task is per checkout
state.json
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .subnav directory path
    pub fn subnav_dir(&self) -> PathBuf {
        self.root.join(".subnav")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the local task store
    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_project(&self.root)
    }

    /// Returns the current-task state file
    pub fn state(&self) -> StateFile {
        StateFile::for_project(&self.root)
    }

    /// Returns the session record for `name` (see [`FileSession::resolve_name`])
    pub fn session(&self, name: &str) -> Result<FileSession> {
        Ok(FileSession::for_project(&self.root, name)?)
    }

    /// Returns the cache directory
    pub fn cache_dir(&self) -> PathBuf {
        self.subnav_dir().join(".cache")
    }
}
