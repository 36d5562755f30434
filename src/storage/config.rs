//! Configuration handling for subnav
//!
//! Configuration is stored in `.subnav/config.toml` (project) and
//! `~/.config/subnav/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cache::{DEFAULT_CAPACITY, DEFAULT_TTL_MS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which hierarchy backend answers parent/children lookups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `.subnav/tasks.jsonl`
    #[default]
    Local,
    /// Asana REST API
    Asana,
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Asana => "asana",
        }
    }
}

/// Navigation cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Milliseconds a children list is served without re-fetching
    pub ttl_ms: u64,

    /// Maximum number of children lists kept
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.ttl_ms).unwrap_or(i64::MAX))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("cache.capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Asana backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AsanaConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Environment variable holding the personal access token
    pub token_env: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for AsanaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.asana.com/api/1.0".to_string(),
            token_env: "ASANA_TOKEN".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Interactive navigator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TuiConfig {
    /// How long a status toast stays visible
    pub toast_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { toast_ms: 1200 }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Hierarchy backend
    pub source: SourceKind,

    /// Cache settings
    pub cache: CacheConfig,

    /// Asana settings (used when `source = "asana"`)
    pub asana: AsanaConfig,

    /// TUI settings
    pub tui: TuiConfig,
}

impl ProjectConfig {
    fn validate(self) -> Result<Self, ConfigError> {
        self.cache.validate()?;
        if self.asana.timeout_secs == 0 {
            return Err(ConfigError::Invalid("asana.timeout_secs must be at least 1".to_string()));
        }
        Ok(self)
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self { project, global })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "subnav", "subnav").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".subnav").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str::<ProjectConfig>(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .and_then(ProjectConfig::validate)
            .context("Failed to load project config")
    }

    /// Finds the project root by looking for `.subnav/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let subnav_dir = current.join(".subnav");
            if subnav_dir.is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
        };

        assert_eq!(config.project.source, SourceKind::Local);
        assert_eq!(config.project.cache.ttl_ms, 60_000);
        assert_eq!(config.project.cache.capacity, 20);
        assert_eq!(config.project.tui.toast_ms, 1200);
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
source = "asana"

[cache]
ttl_ms = 5000

[asana]
token_env = "MY_TOKEN"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.source, SourceKind::Asana);
        assert_eq!(config.cache.ttl_ms, 5000);
        assert_eq!(config.cache.capacity, 20);
        assert_eq!(config.cache.ttl(), Duration::milliseconds(5000));
        assert_eq!(config.asana.token_env, "MY_TOKEN");
        assert_eq!(config.asana.timeout_secs, 10);
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".subnav")).unwrap();
        fs::write(
            dir.path().join(".subnav").join("config.toml"),
            "[cache]\ncapacity = 0\n",
        )
        .unwrap();

        assert!(Config::load_project_config(dir.path()).is_err());
    }

    #[test]
    fn missing_project_config_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_project_config(dir.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }
}
