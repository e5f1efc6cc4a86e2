//! High-level facade over acquisition, extraction, the library and the
//! metadata store.
//!
//! One [`Vault`] instance owns the data directory. All mutations funnel
//! through the internal database mutex and save the document once per
//! operation, so concurrent callers always observe a consistent
//! metadata file on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use crate::ProgressCallback;
use crate::cache::{self, LibraryUsage};
use crate::config::VaultConfig;
use crate::db::{ArchiveRecord, HistoryEntry, ImageRecord, MetaDb, Settings};
use crate::error::{Result, VaultError};
use crate::ingest::{self, InflightRegistry};
use crate::session::SessionManager;
use crate::store::{self, LibraryStore, Placement, StoredArchive};

/// A completed load.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Identity of the loaded archive.
    pub archive_id: String,
    /// Human label.
    pub display_name: String,
    /// Session directory holding the extracted images.
    pub session_dir: PathBuf,
    /// Extracted images in archive order.
    pub images: Vec<ImageRecord>,
    /// `true` when the archive binary was already in the library and no
    /// acquisition happened.
    pub already_in_library: bool,
    /// Archives evicted to make room for this one.
    pub evicted: Vec<String>,
}

/// Outcome of a local-file load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The archive was loaded.
    Loaded(LoadResult),
    /// The caller must choose copy or move for a file outside the
    /// library, then retry with an explicit [`Placement`].
    NeedsPlacementChoice,
}

/// The archive library core.
pub struct Vault {
    config: VaultConfig,
    db: Mutex<MetaDb>,
    store: LibraryStore,
    sessions: SessionManager,
    registry: InflightRegistry,
}

impl Vault {
    /// Opens a vault rooted at the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata document cannot be read or the
    /// HTTP client fails to initialize.
    pub fn open(config: VaultConfig) -> Result<Self> {
        let db = MetaDb::open(&config)?;
        let store = LibraryStore::new(&config)?;
        let sessions = SessionManager::new(&config);
        Ok(Self {
            config,
            db: Mutex::new(db),
            store,
            sessions,
            registry: InflightRegistry::default(),
        })
    }

    /// Configuration this vault was opened with.
    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Loads an archive from a URL: cache hit or download, then extract,
    /// record and evict.
    ///
    /// Concurrent loads of the same URL serialize; the second caller
    /// reuses the binary the first one stored.
    ///
    /// # Errors
    ///
    /// Propagates acquisition failures ([`VaultError::Network`],
    /// [`VaultError::Timeout`]), [`VaultError::UnsupportedFormat`] and
    /// extraction failures. On failure nothing is recorded and a freshly
    /// downloaded binary is removed again.
    pub fn load_from_url(
        &self,
        url: &str,
        progress: &mut dyn ProgressCallback,
    ) -> Result<LoadResult> {
        let id = store::id_for_url(url);
        let _guard = self.registry.acquire(&id);

        let stored = self.store.locate(&id);
        let already = stored.is_some();
        let stored = match stored {
            Some(stored) => {
                debug!(id, url, "cache hit");
                stored
            }
            None => self.store.acquire_from_url(url, progress)?,
        };

        let display_name = store::display_name_for_url(url);
        self.finish_load(&stored, Some(url), &display_name, already, progress)
    }

    /// Loads a local archive file.
    ///
    /// The source is canonicalized before its identity is computed, so
    /// every spelling of one file resolves to the same library slot,
    /// and its `file://` path is recorded for later re-acquisition.
    ///
    /// With `placement == None`, a file outside the library yields
    /// [`LoadOutcome::NeedsPlacementChoice`] without touching anything;
    /// library-resident files load directly.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::UnsupportedFormat`] for non-archive
    /// files, plus I/O and extraction failures.
    pub fn load_local(
        &self,
        source: &Path,
        placement: Option<Placement>,
        progress: &mut dyn ProgressCallback,
    ) -> Result<LoadOutcome> {
        let source = fs::canonicalize(source)?;
        // Reject non-archives before bothering the user with a
        // copy-or-move prompt.
        crate::formats::detect_format(&source)?;

        let id = store::id_for_path(&source, self.store.root());
        let _guard = self.registry.acquire(&id);

        let resident = self
            .store
            .locate(&id)
            .is_some_and(|stored| stored.file_path() == source);
        let placement = match placement {
            Some(p) => p,
            None if resident => Placement::Copy,
            None => return Ok(LoadOutcome::NeedsPlacementChoice),
        };

        let already = self.store.locate(&id).is_some();
        let display_name = store::display_name_for_path(&source);
        // A library-resident source is the copy we would recover, not a
        // place to recover from; keep whatever source was recorded.
        let source_url = (!resident).then(|| format!("file://{}", source.display()));
        let stored = self.store.acquire_local(&source, placement)?;

        self.finish_load(&stored, source_url.as_deref(), &display_name, already, progress)
            .map(LoadOutcome::Loaded)
    }

    /// Loads an archive supplied as raw bytes (dropped or pasted data).
    ///
    /// Identity is the content hash, so identical bytes dedupe into one
    /// library slot no matter where they came from. The format is taken
    /// from `name_hint`'s extension.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::UnsupportedFormat`] when `name_hint` is
    /// not an archive name, plus I/O and extraction failures.
    pub fn load_from_bytes(
        &self,
        bytes: &[u8],
        name_hint: &str,
        progress: &mut dyn ProgressCallback,
    ) -> Result<LoadResult> {
        let id = store::id_for_bytes(bytes);
        let _guard = self.registry.acquire(&id);

        let stored = self.store.locate(&id);
        let already = stored.is_some();
        let stored = match stored {
            Some(stored) => {
                debug!(id, "byte content already in library");
                stored
            }
            None => self.store.acquire_bytes(bytes, name_hint)?,
        };

        self.finish_load(&stored, None, name_hint, already, progress)
    }

    /// Re-extracts a single image from its persisted archive into a
    /// dedicated session directory, returning the written file path.
    ///
    /// Works without a prior bulk load in this process; a missing binary
    /// is re-acquired from its recorded source, re-downloading a URL or
    /// re-copying a `file://` path.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::ImageNotFound`] or
    /// [`VaultError::ArchiveNotFound`] for unknown ids, and
    /// [`VaultError::ArchiveMissing`] when the binary is gone and its
    /// recorded source is unreachable.
    pub fn extract_single_image(
        &self,
        archive_id: &str,
        image_id: &str,
        progress: &mut dyn ProgressCallback,
    ) -> Result<PathBuf> {
        let (original_name, source_url, name) = {
            let db = self.lock_db();
            let image = db
                .data()
                .images
                .get(image_id)
                .filter(|img| img.archive_id == archive_id)
                .ok_or_else(|| VaultError::ImageNotFound {
                    image_id: image_id.to_string(),
                })?;
            let archive = db.data().archives.get(archive_id).ok_or_else(|| {
                VaultError::ArchiveNotFound {
                    archive_id: archive_id.to_string(),
                }
            })?;
            (
                image.original_name.clone(),
                archive.source_url.clone(),
                archive.display_name.clone(),
            )
        };

        let _guard = self.registry.acquire(archive_id);
        let stored = match self.store.locate(archive_id) {
            Some(stored) => stored,
            None => {
                let url = source_url.ok_or_else(|| VaultError::ArchiveMissing {
                    archive_id: archive_id.to_string(),
                    name: name.clone(),
                })?;
                info!(archive = %archive_id, "binary missing, re-acquiring from source");
                self.reacquire(archive_id, &name, &url, progress)?
            }
        };

        let dest = self.sessions.create_single(archive_id)?;
        let kind = crate::formats::detect_format(&stored.file_path())?;
        let written = crate::formats::extractor_for(kind).extract_entry(
            &stored.file_path(),
            &original_name,
            &dest,
        )?;

        let mut db = self.lock_db();
        db.data_mut().touch_archive(archive_id, Utc::now());
        db.save()?;
        Ok(written)
    }

    /// Toggles one image's star; the owning archive's star becomes the
    /// OR of its images. Returns the image's new state.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::ImageNotFound`] for unknown ids, and on
    /// a failed metadata save.
    pub fn toggle_image_star(&self, archive_id: &str, image_id: &str) -> Result<bool> {
        let mut db = self.lock_db();
        let current = db
            .data()
            .images
            .get(image_id)
            .filter(|img| img.archive_id == archive_id)
            .map(|img| img.starred)
            .ok_or_else(|| VaultError::ImageNotFound {
                image_id: image_id.to_string(),
            })?;
        let state = db
            .data_mut()
            .set_image_starred(archive_id, image_id, !current)
            .ok_or_else(|| VaultError::ImageNotFound {
                image_id: image_id.to_string(),
            })?;
        db.save()?;
        Ok(state)
    }

    /// Toggles an archive's star directly. Returns the new state.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::ArchiveNotFound`] for unknown ids, and
    /// on a failed metadata save.
    pub fn toggle_archive_star(&self, archive_id: &str) -> Result<bool> {
        let mut db = self.lock_db();
        let current = db
            .data()
            .archives
            .get(archive_id)
            .map(|a| a.starred)
            .ok_or_else(|| VaultError::ArchiveNotFound {
                archive_id: archive_id.to_string(),
            })?;
        let state = db
            .data_mut()
            .set_archive_starred(archive_id, !current)
            .ok_or_else(|| VaultError::ArchiveNotFound {
                archive_id: archive_id.to_string(),
            })?;
        db.save()?;
        Ok(state)
    }

    /// Current library occupancy.
    #[must_use]
    pub fn library_usage(&self) -> LibraryUsage {
        cache::usage(self.lock_db().data())
    }

    /// Removes every non-starred archive. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Fails only on a failed metadata save; individual removal failures
    /// are logged and skipped.
    pub fn clear_library(&self) -> Result<usize> {
        let mut db = self.lock_db();
        let removed = cache::clear_all(db.data_mut(), &self.store, &self.registry.pinned());
        db.save()?;
        Ok(removed)
    }

    /// All archive rows, most recently accessed first.
    #[must_use]
    pub fn list_archives(&self) -> Vec<ArchiveRecord> {
        let db = self.lock_db();
        let mut archives: Vec<ArchiveRecord> = db.data().archives.values().cloned().collect();
        archives.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        archives
    }

    /// Image rows of one archive in archive order.
    #[must_use]
    pub fn list_images(&self, archive_id: &str) -> Vec<ImageRecord> {
        self.lock_db().data().ordered_images(archive_id)
    }

    /// Load history, most recent first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        let db = self.lock_db();
        let mut history = db.data().history.clone();
        history.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        history
    }

    /// Renames a history entry.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::ArchiveNotFound`] when no entry has the
    /// given id, and on a failed metadata save.
    pub fn rename_history_entry(&self, entry_id: &str, name: &str) -> Result<()> {
        let mut db = self.lock_db();
        let entry = db
            .data_mut()
            .history
            .iter_mut()
            .find(|h| h.id == entry_id)
            .ok_or_else(|| VaultError::ArchiveNotFound {
                archive_id: entry_id.to_string(),
            })?;
        entry.name = name.to_string();
        db.save()?;
        Ok(())
    }

    /// Stars or unstars a history entry, protecting it from history
    /// eviction. Returns the new state.
    ///
    /// # Errors
    ///
    /// Fails with [`VaultError::ArchiveNotFound`] when no entry has the
    /// given id, and on a failed metadata save.
    pub fn toggle_history_star(&self, entry_id: &str) -> Result<bool> {
        let mut db = self.lock_db();
        let entry = db
            .data_mut()
            .history
            .iter_mut()
            .find(|h| h.id == entry_id)
            .ok_or_else(|| VaultError::ArchiveNotFound {
                archive_id: entry_id.to_string(),
            })?;
        entry.starred = !entry.starred;
        let state = entry.starred;
        db.save()?;
        Ok(state)
    }

    /// Current persisted settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.lock_db().data().settings.clone()
    }

    /// Replaces the persisted settings. A shrunk budget evicts
    /// immediately; returns the ids evicted, if any.
    ///
    /// # Errors
    ///
    /// Fails on a failed metadata save.
    pub fn update_settings(&self, settings: Settings) -> Result<Vec<String>> {
        let mut db = self.lock_db();
        db.data_mut().settings = settings;
        let evicted = cache::enforce_budget(db.data_mut(), &self.store, &self.registry.pinned());
        db.save()?;
        Ok(evicted)
    }

    /// Sweeps stale session directories. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session root cannot be listed.
    pub fn sweep_sessions(&self) -> Result<usize> {
        self.sessions.sweep()
    }

    /// Releases a session so the sweeper may reclaim it.
    pub fn release_session(&self, archive_id: &str) {
        self.sessions.release(archive_id);
    }

    /// Removes all session directories and saves the metadata. Call on
    /// application exit.
    ///
    /// # Errors
    ///
    /// Fails if session cleanup or the final save fails.
    pub fn shutdown(&self) -> Result<()> {
        self.sessions.shutdown()?;
        self.lock_db().save()?;
        Ok(())
    }

    /// Re-acquires a missing library binary from its recorded source:
    /// `file://` sources are copied back in, anything else is
    /// re-downloaded.
    fn reacquire(
        &self,
        archive_id: &str,
        name: &str,
        source_url: &str,
        progress: &mut dyn ProgressCallback,
    ) -> Result<StoredArchive> {
        match source_url.strip_prefix("file://") {
            Some(path) => {
                let path = Path::new(path);
                if !path.is_file() {
                    return Err(VaultError::ArchiveMissing {
                        archive_id: archive_id.to_string(),
                        name: name.to_string(),
                    });
                }
                self.store.acquire_local(path, Placement::Copy)
            }
            None => self.store.acquire_from_url(source_url, progress),
        }
    }

    /// Shared tail of both load paths: extract, record, evict, save.
    fn finish_load(
        &self,
        stored: &StoredArchive,
        source_url: Option<&str>,
        display_name: &str,
        already: bool,
        progress: &mut dyn ProgressCallback,
    ) -> Result<LoadResult> {
        let (prior_stars, date_added, prior_name, prior_source) = {
            let db = self.lock_db();
            match db.data().archives.get(&stored.id) {
                Some(prior) => {
                    let stars: HashMap<String, bool> = db
                        .data()
                        .images
                        .values()
                        .filter(|img| img.archive_id == stored.id)
                        .map(|img| (img.original_name.clone(), img.starred))
                        .collect();
                    (
                        stars,
                        Some(prior.date_added),
                        Some(prior.display_name.clone()),
                        prior.source_url.clone(),
                    )
                }
                None => (HashMap::new(), None, None, None),
            }
        };

        let source_url = source_url.map(ToString::to_string).or(prior_source);
        let ingested = match ingest::ingest(
            stored,
            source_url.as_deref(),
            prior_name.as_deref().unwrap_or(display_name),
            &prior_stars,
            date_added,
            &self.sessions,
            progress,
        ) {
            Ok(ingested) => ingested,
            Err(e) => {
                // A binary that was freshly acquired for this load must
                // not survive as a plausible cache entry.
                if !already {
                    let _ = self.store.remove(&stored.id);
                }
                return Err(e);
            }
        };

        let result = {
            let mut db = self.lock_db();
            let image_count = ingested.images.len();
            db.data_mut()
                .insert_archive_with_images(ingested.record.clone(), ingested.images.clone());

            let history_url = source_url
                .clone()
                .unwrap_or_else(|| format!("file://{}", stored.file_path().display()));
            db.data_mut().record_history(
                &stored.id,
                &history_url,
                ingested.record.display_name.as_str(),
                image_count,
                Utc::now(),
            );

            let evicted =
                cache::enforce_budget(db.data_mut(), &self.store, &self.registry.pinned());
            db.save()?;

            LoadResult {
                archive_id: stored.id.clone(),
                display_name: ingested.record.display_name.clone(),
                session_dir: ingested.session_dir,
                images: ingested.images,
                already_in_library: already,
                evicted,
            }
        };

        progress.on_complete();
        Ok(result)
    }

    fn lock_db(&self) -> std::sync::MutexGuard<'_, MetaDb> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
