//! JSON-file-backed metadata store with atomic saves and rotating
//! backups.
//!
//! The whole document lives in memory; every save writes a timestamped
//! backup of the previous on-disk state, serializes to a temp file in the
//! same directory, then renames over the live path so a crash never
//! leaves a half-written document.

mod backup;
mod model;

pub use model::{ArchiveRecord, Database, HistoryEntry, ImageRecord, ImageSnapshot, Settings};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::VaultConfig;
use crate::error::Result;

/// The in-memory metadata document plus its persistence machinery.
///
/// Not internally synchronized; callers serialize access (the facade
/// holds it behind a `Mutex`).
pub struct MetaDb {
    path: PathBuf,
    backup_dir: PathBuf,
    retention: usize,
    data: Database,
}

impl MetaDb {
    /// Opens the store, reading the document if present.
    ///
    /// A missing file yields a fresh default document. A corrupt file is
    /// recovered from the newest readable backup; if no backup parses
    /// either, the store starts fresh rather than refusing to open.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read at the
    /// I/O level.
    pub fn open(config: &VaultConfig) -> Result<Self> {
        let path = config.db_path.clone();
        let backup_dir = config.backup_dir.clone();
        let retention = config.backup_retention;

        let data = match load_document(&path)? {
            Some(data) => data,
            None if path.exists() => recover(&path, &backup_dir)?,
            None => Database::default(),
        };

        Ok(Self {
            path,
            backup_dir,
            retention,
            data,
        })
    }

    /// Read access to the document.
    #[must_use]
    pub fn data(&self) -> &Database {
        &self.data
    }

    /// Write access to the document; call [`MetaDb::save`] afterwards.
    pub fn data_mut(&mut self) -> &mut Database {
        &mut self.data
    }

    /// Persists the document: backup, serialize to temp, rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup copy, serialization, or rename
    /// fails; the previous on-disk document stays intact in that case.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        backup::rotate(&self.path, &self.backup_dir, self.retention)?;

        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Reads and parses the live document. `Ok(None)` means missing or
/// unparseable.
fn load_document(path: &Path) -> Result<Option<Database>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(data) => Ok(Some(data)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "metadata document unreadable");
            Ok(None)
        }
    }
}

/// Walks backups newest-first and returns the first one that parses.
fn recover(path: &Path, backup_dir: &Path) -> Result<Database> {
    for candidate in backup::list(path, backup_dir) {
        let raw = fs::read_to_string(&candidate)?;
        match serde_json::from_str(&raw) {
            Ok(data) => {
                info!(backup = %candidate.display(), "metadata recovered from backup");
                return Ok(data);
            }
            Err(e) => {
                warn!(backup = %candidate.display(), error = %e, "backup unreadable, trying older");
            }
        }
    }
    warn!(path = %path.display(), "no readable backup, starting with empty metadata");
    Ok(Database::default())
}
