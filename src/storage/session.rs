//! Session storage for the navigation cache
//!
//! A session is one named JSON record under `.subnav/.cache/`. Writes go
//! through a temp file and an atomic rename while holding an exclusive lock,
//! so a reader never sees half a record.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Environment variable naming the active session
pub const SESSION_ENV: &str = "SUBNAV_SESSION";

/// Session name used when none is given
pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize session cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid session name '{0}'")]
    InvalidName(String),
}

/// Where the cache record lives between commands
pub trait SessionBackend {
    /// Returns the stored record, or `None` if nothing was stored yet
    fn read(&self) -> Result<Option<String>, SessionError>;

    /// Replaces the stored record
    fn write(&self, payload: &str) -> Result<(), SessionError>;
}

/// File-backed session record
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The session file for `name` inside a project
    pub fn for_project(project_root: &Path, name: &str) -> Result<Self, SessionError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SessionError::InvalidName(name.to_string()));
        }

        Ok(Self::new(
            project_root
                .join(".subnav")
                .join(".cache")
                .join(format!("session-{}.json", name)),
        ))
    }

    /// Resolves the session name: explicit, then `$SUBNAV_SESSION`, then default
    pub fn resolve_name(explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(SESSION_ENV).ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_SESSION.to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Ends the session by deleting its record
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionBackend for FileSession {
    fn read(&self) -> Result<Option<String>, SessionError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        file.lock_shared()?;
        let mut payload = String::new();
        file.read_to_string(&mut payload)?;
        Ok(Some(payload))
    }

    fn write(&self, payload: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;
            file.lock_exclusive()?;
            file.write_all(payload.as_bytes())?;
            file.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory session record for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySession {
    payload: std::cell::RefCell<Option<String>>,
    fail_writes: bool,
    writes: std::cell::Cell<usize>,
}

#[cfg(test)]
impl MemorySession {
    pub fn with_payload(payload: &str) -> Self {
        Self {
            payload: std::cell::RefCell::new(Some(payload.to_string())),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn payload(&self) -> Option<String> {
        self.payload.borrow().clone()
    }
}

#[cfg(test)]
impl SessionBackend for MemorySession {
    fn read(&self) -> Result<Option<String>, SessionError> {
        Ok(self.payload.borrow().clone())
    }

    fn write(&self, payload: &str) -> Result<(), SessionError> {
        if self.fail_writes {
            return Err(SessionError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "session storage is read-only",
            )));
        }
        self.writes.set(self.writes.get() + 1);
        *self.payload.borrow_mut() = Some(payload.to_string());
        Ok(())
    }
}
