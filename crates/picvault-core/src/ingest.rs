//! Load orchestration: in-flight dedup and the extraction pipeline.
//!
//! Two concurrent loads of the same identity must not race each other on
//! the library slot, and an in-flight archive must not be evicted while
//! its download is still streaming. Both are handled by a registry of
//! in-flight ids: the second load blocks until the first finishes, and
//! eviction treats registered ids as pinned.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, PoisonError};

use chrono::Utc;
use tracing::{info, warn};

use crate::ProgressCallback;
use crate::db::{ArchiveRecord, ImageRecord};
use crate::error::Result;
use crate::formats::{detect_format, extractor_for};
use crate::fsutil;
use crate::session::SessionManager;
use crate::store::StoredArchive;

/// Tracks archive ids with a load in progress.
#[derive(Default)]
pub struct InflightRegistry {
    ids: Mutex<HashSet<String>>,
    freed: Condvar,
}

impl InflightRegistry {
    /// Blocks until no other load holds `id`, then registers it.
    ///
    /// The returned guard deregisters on drop, including on panic.
    pub fn acquire(&self, id: &str) -> InflightGuard<'_> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        while ids.contains(id) {
            ids = self
                .freed
                .wait(ids)
                .unwrap_or_else(PoisonError::into_inner);
        }
        ids.insert(id.to_string());
        InflightGuard {
            registry: self,
            id: id.to_string(),
        }
    }

    /// Snapshot of ids currently loading; eviction treats these as
    /// pinned.
    #[must_use]
    pub fn pinned(&self) -> HashSet<String> {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Registration of one in-flight load.
pub struct InflightGuard<'a> {
    registry: &'a InflightRegistry,
    id: String,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        let mut ids = self
            .registry
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ids.remove(&self.id);
        self.registry.freed.notify_all();
    }
}

/// Everything a completed ingestion produced.
pub(crate) struct Ingested {
    pub record: ArchiveRecord,
    pub images: Vec<ImageRecord>,
    pub session_dir: PathBuf,
}

/// Extracts a stored archive into a fresh session and builds its
/// metadata rows.
///
/// `prior_stars` maps original entry names to star states from a
/// previous ingestion of the same identity; matching images keep their
/// stars even though their ids are regenerated. The session directory
/// is removed if extraction fails.
pub(crate) fn ingest(
    stored: &StoredArchive,
    source_url: Option<&str>,
    display_name: &str,
    prior_stars: &HashMap<String, bool>,
    date_added: Option<chrono::DateTime<Utc>>,
    sessions: &SessionManager,
    progress: &mut dyn ProgressCallback,
) -> Result<Ingested> {
    let archive_path = stored.file_path();
    let kind = detect_format(&archive_path)?;
    let extractor = extractor_for(kind);

    let session_dir = sessions.create(&stored.id)?;
    let extracted = match extractor.extract_images(&archive_path, &session_dir, progress) {
        Ok(images) => images,
        Err(e) => {
            if let Err(cleanup) = fsutil::remove_dir_idempotent(&session_dir) {
                warn!(session = %session_dir.display(), error = %cleanup, "failed to remove session after extraction failure");
            }
            sessions.release(&stored.id);
            return Err(e);
        }
    };

    let now = Utc::now();
    let images: Vec<ImageRecord> = extracted
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let starred = prior_stars
                .get(&image.original_name)
                .copied()
                .unwrap_or(false);
            ImageRecord {
                id: format!("{}-img-{index:04}", stored.id),
                archive_id: stored.id.clone(),
                name: image
                    .relative_path
                    .file_name()
                    .map_or_else(|| image.original_name.clone(), |n| n.to_string_lossy().into_owned()),
                original_name: image.original_name.clone(),
                relative_path: image.relative_path.clone(),
                size: image.size,
                starred,
            }
        })
        .collect();

    let record = ArchiveRecord {
        id: stored.id.clone(),
        source_url: source_url.map(ToString::to_string),
        library_path: stored.slot_dir.clone(),
        archive_file_name: stored.file_name.clone(),
        archive_size: stored.size,
        date_added: date_added.unwrap_or(now),
        last_accessed: now,
        starred: false,
        display_name: display_name.to_string(),
        extracted_images: Vec::new(),
    };

    info!(
        archive = %stored.id,
        images = images.len(),
        format = extractor.format_name(),
        "archive ingested"
    );

    Ok(Ingested {
        record,
        images,
        session_dir,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::NoopProgress;
    use crate::VaultConfig;
    use crate::store::{LibraryStore, Placement};
    use crate::test_utils::write_zip_fixture;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_guard_releases_on_drop() {
        let registry = InflightRegistry::default();
        {
            let _guard = registry.acquire("abc");
            assert!(registry.pinned().contains("abc"));
        }
        assert!(registry.pinned().is_empty());
    }

    #[test]
    fn test_second_acquire_blocks_until_release() {
        let registry = Arc::new(InflightRegistry::default());
        let order = Arc::new(AtomicUsize::new(0));

        let guard = registry.acquire("abc");
        let handle = {
            let registry = Arc::clone(&registry);
            let order = Arc::clone(&order);
            std::thread::spawn(move || {
                let _second = registry.acquire("abc");
                order.store(2, Ordering::SeqCst);
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(order.load(Ordering::SeqCst), 0, "second load still waiting");
        order.store(1, Ordering::SeqCst);
        drop(guard);

        handle.join().unwrap();
        assert_eq!(order.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distinct_ids_do_not_block() {
        let registry = InflightRegistry::default();
        let _a = registry.acquire("aaa");
        let _b = registry.acquire("bbb");
        assert_eq!(registry.pinned().len(), 2);
    }

    #[test]
    fn test_ingest_builds_rows_and_preserves_stars() {
        let dir = TempDir::new().unwrap();
        let config = VaultConfig::new(dir.path().to_path_buf());
        let store = LibraryStore::new(&config).unwrap();
        let sessions = SessionManager::new(&config);

        let src = TempDir::new().unwrap();
        let source = src.path().join("cats.zip");
        write_zip_fixture(&source, &[("a.jpg", b"aa"), ("b.jpg", b"bbb")]);
        let stored = store.acquire_local(&source, Placement::Copy).unwrap();

        let prior: HashMap<String, bool> = [("b.jpg".to_string(), true)].into();
        let ingested = ingest(
            &stored,
            None,
            "cats.zip",
            &prior,
            None,
            &sessions,
            &mut NoopProgress,
        )
        .unwrap();

        assert_eq!(ingested.images.len(), 2);
        assert_eq!(ingested.record.archive_size, stored.size);
        assert!(!ingested.images[0].starred);
        assert!(ingested.images[1].starred, "star survives re-ingestion");
        assert!(ingested.session_dir.join("a.jpg").exists());
        assert!(ingested.images[0].id.starts_with(&stored.id));
    }

    #[test]
    fn test_ingest_failure_removes_session() {
        let dir = TempDir::new().unwrap();
        let config = VaultConfig::new(dir.path().to_path_buf());
        let store = LibraryStore::new(&config).unwrap();
        let sessions = SessionManager::new(&config);

        // A corrupt zip in a valid slot.
        let slot = store.slot_dir("feedfacefeedfacefeedfacefeedface");
        std::fs::create_dir_all(&slot).unwrap();
        std::fs::write(slot.join("archive.zip"), b"not a zip").unwrap();
        let stored = store.locate("feedfacefeedfacefeedfacefeedface").unwrap();

        let result = ingest(
            &stored,
            None,
            "broken.zip",
            &HashMap::new(),
            None,
            &sessions,
            &mut NoopProgress,
        );
        assert!(result.is_err());
        assert!(!sessions.root().join(&stored.id).exists());
    }
}
