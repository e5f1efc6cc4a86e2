//! The on-disk archive library.
//!
//! Layout: one slot directory per identity under the library root,
//! `<library_root>/<id>/archive.<ext>`. A failed acquisition removes the
//! whole slot so a half-written archive is never mistaken for a cached
//! one on the next load.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::ProgressCallback;
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::formats::detect_format;
use crate::fsutil;

use super::download::Downloader;
use super::identity;

/// How a local source file enters the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Copy the file, leaving the original in place.
    Copy,
    /// Move the file into the library.
    Move,
}

/// An archive binary sitting in its library slot.
#[derive(Debug, Clone)]
pub struct StoredArchive {
    /// Identity / slot directory name.
    pub id: String,
    /// Slot directory.
    pub slot_dir: PathBuf,
    /// Archive filename inside the slot.
    pub file_name: String,
    /// Size of the archive binary in bytes.
    pub size: u64,
}

impl StoredArchive {
    /// Full path of the archive binary.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.slot_dir.join(&self.file_name)
    }
}

/// Filesystem half of the library: slot directories and the archive
/// binaries inside them. Metadata rows live in [`crate::db::MetaDb`].
pub struct LibraryStore {
    root: PathBuf,
    downloader: Downloader,
}

impl LibraryStore {
    /// Creates the store and its root directory, building the HTTP
    /// client from `config`.
    ///
    /// The root is canonicalized up front so identity and residency
    /// checks compare one spelling of every path.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be created or the HTTP
    /// client fails to initialize.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        fs::create_dir_all(&config.library_root)?;
        Ok(Self {
            root: fs::canonicalize(&config.library_root)?,
            downloader: Downloader::new(config)?,
        })
    }

    /// Library root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slot directory for an identity.
    #[must_use]
    pub fn slot_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Finds the archive binary already stored for `id`, if any.
    ///
    /// The slot may exist with no archive in it after a crashed
    /// acquisition; that counts as absent.
    #[must_use]
    pub fn locate(&self, id: &str) -> Option<StoredArchive> {
        let slot = self.slot_dir(id);
        let entries = fs::read_dir(&slot).ok()?;
        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            if path.is_file() && detect_format(&path).is_ok() {
                let meta = entry.metadata().ok()?;
                return Some(StoredArchive {
                    id: id.to_string(),
                    slot_dir: slot,
                    file_name: entry.file_name().to_string_lossy().into_owned(),
                    size: meta.len(),
                });
            }
        }
        None
    }

    /// Downloads `url` into its slot.
    ///
    /// # Errors
    ///
    /// Propagates download and I/O failures; the slot directory is
    /// removed on failure. Also fails with
    /// [`VaultError::UnsupportedFormat`] when the URL names a file that
    /// is not zip/rar/7z.
    pub fn acquire_from_url(
        &self,
        url: &str,
        progress: &mut dyn ProgressCallback,
    ) -> Result<StoredArchive> {
        let id = identity::id_for_url(url);
        let display = identity::display_name_for_url(url);
        let kind = detect_format(Path::new(&display))?;

        let slot = self.slot_dir(&id);
        fs::create_dir_all(&slot)?;
        let file_name = format!("archive.{}", kind.extension());
        let dest = slot.join(&file_name);

        match self.downloader.fetch(url, &dest, progress) {
            Ok(size) => {
                debug!(id, url, size, "archive stored from url");
                Ok(StoredArchive {
                    id,
                    slot_dir: slot,
                    file_name,
                    size,
                })
            }
            Err(e) => {
                self.discard_slot(&id);
                Err(e)
            }
        }
    }

    /// Copies or moves a local file into its slot.
    ///
    /// The source is canonicalized before its identity is computed, so
    /// relative and absolute spellings of one file share a slot. A
    /// source already inside its own slot is left where it is.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::UnsupportedFormat`] for non-archive
    /// files, [`VaultError::Io`] when the source cannot be read or the
    /// slot cannot be written; the slot is removed on failure.
    pub fn acquire_local(&self, source: &Path, placement: Placement) -> Result<StoredArchive> {
        let source = fs::canonicalize(source)?;
        let kind = detect_format(&source)?;
        let id = identity::id_for_path(&source, &self.root);

        if let Some(existing) = self.locate(&id) {
            if existing.file_path() == source {
                debug!(id, "source already resident in its slot");
                return Ok(existing);
            }
        }

        let metadata = fs::metadata(&source)?;
        if !metadata.is_file() {
            return Err(VaultError::AccessDenied { path: source });
        }

        let slot = self.slot_dir(&id);
        fs::create_dir_all(&slot)?;
        let file_name = format!("archive.{}", kind.extension());
        let dest = slot.join(&file_name);

        let placed = match placement {
            Placement::Copy => fs::copy(&source, &dest).map(|_| ()),
            Placement::Move => fsutil::move_file(&source, &dest),
        };
        if let Err(e) = placed {
            self.discard_slot(&id);
            return Err(e.into());
        }

        let size = fs::metadata(&dest)?.len();
        debug!(id, source = %source.display(), ?placement, size, "archive stored from file");
        Ok(StoredArchive {
            id,
            slot_dir: slot,
            file_name,
            size,
        })
    }

    /// Writes raw archive bytes into their content-addressed slot.
    ///
    /// Identical bytes always resolve to one slot regardless of where
    /// they came from; a repeat call returns the existing archive
    /// without rewriting it. The format is taken from `name_hint`'s
    /// extension.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::UnsupportedFormat`] when `name_hint` is
    /// not a zip/rar/7z name, and with [`VaultError::Io`] on a failed
    /// write; the slot is removed on failure.
    pub fn acquire_bytes(&self, bytes: &[u8], name_hint: &str) -> Result<StoredArchive> {
        let kind = detect_format(Path::new(name_hint))?;
        let id = identity::id_for_bytes(bytes);

        if let Some(existing) = self.locate(&id) {
            debug!(id, "byte content already stored");
            return Ok(existing);
        }

        let slot = self.slot_dir(&id);
        fs::create_dir_all(&slot)?;
        let file_name = format!("archive.{}", kind.extension());
        let dest = slot.join(&file_name);

        let written = fs::write(slot.join(format!("{file_name}.part")), bytes)
            .and_then(|()| fs::rename(slot.join(format!("{file_name}.part")), &dest));
        if let Err(e) = written {
            self.discard_slot(&id);
            return Err(e.into());
        }

        debug!(id, size = bytes.len(), "archive stored from bytes");
        Ok(StoredArchive {
            id,
            slot_dir: slot,
            file_name,
            size: bytes.len() as u64,
        })
    }

    /// Removes a slot and everything in it. Missing slots are fine.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if removal fails for any reason
    /// other than the slot already being gone.
    pub fn remove(&self, id: &str) -> Result<()> {
        fsutil::remove_dir_idempotent(&self.slot_dir(id))?;
        Ok(())
    }

    /// Slot ids present on disk, whether or not metadata knows them.
    #[must_use]
    pub fn slot_ids(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(ToString::to_string))
            .collect()
    }

    fn discard_slot(&self, id: &str) {
        if let Err(e) = fsutil::remove_dir_idempotent(&self.slot_dir(id)) {
            warn!(id, error = %e, "failed to clean up slot after failed acquisition");
        }
    }
}
