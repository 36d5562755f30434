//! # Storage Layer
//!
//! Persistence layer for subnav.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Local hierarchy | JSONL (one task per line) | `.subnav/tasks.jsonl` |
//! | Current task | JSON | `.subnav/state.json` |
//! | Navigation cache | JSON (per session) | `.subnav/.cache/session-{name}.json` |
//! | Config | TOML | `.subnav/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] and [`FileSession`] use file locking (`fs2`)
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a subnav project
//! - [`NavCache`] - The session-scoped hierarchy cache
//! - [`TaskStore`] - Read/write the local hierarchy as JSONL
//! - [`Config`] - Project and global configuration

mod cache;
mod config;
mod jsonl;
mod project;
pub mod session;
mod state;

pub use cache::{ChildrenEntry, NavCache, DEFAULT_CAPACITY, DEFAULT_TTL_MS};
pub use config::{
    AsanaConfig, CacheConfig, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig,
    SourceKind, TuiConfig,
};
pub use jsonl::TaskStore;
pub use project::{Project, ProjectError};
pub use session::{FileSession, SessionBackend, SessionError};
pub use state::StateFile;
