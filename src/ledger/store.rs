//! Persistence for the score history.
//!
//! The history is always read and written as a whole: `load` returns every
//! entry in insertion order and `save` replaces whatever was stored before.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::entry::ScoreEntry;
use crate::error::{Result, ScorebookError};

/// Full read / full write storage for the score history
#[cfg_attr(test, mockall::automock)]
pub trait ScoreStore {
    /// Read the full history (empty when nothing has been stored yet)
    fn load(&self) -> Result<Vec<ScoreEntry>>;

    /// Replace the stored history with `entries`
    fn save(&self, entries: &[ScoreEntry]) -> Result<()>;
}

/// JSON file backed store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> Result<Vec<ScoreEntry>> {
        if !self.path.exists() {
            debug!("No existing score history at {:?}, starting fresh", self.path);
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let entries: Vec<ScoreEntry> = serde_json::from_str(&content)?;

        debug!("Loaded {} score entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }

    fn save(&self, entries: &[ScoreEntry]) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // serde_json leaves non-ASCII text unescaped
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;

        debug!("Saved {} score entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

/// In-memory store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<ScoreEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<ScoreEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<Vec<ScoreEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ScorebookError::Validation("memory store lock poisoned".to_string()))?;
        Ok(entries.clone())
    }

    fn save(&self, entries: &[ScoreEntry]) -> Result<()> {
        let mut stored = self
            .entries
            .lock()
            .map_err(|_| ScorebookError::Validation("memory store lock poisoned".to_string()))?;
        *stored = entries.to_vec();
        Ok(())
    }
}
