//! Persisted data model: archives, images, history and settings.
//!
//! Field names serialize in camelCase so the document stays readable by
//! the gallery frontends that grew up around the original JSON layout.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted archive, one per distinct content identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    /// Stable identity (hash of source URL/path or content).
    pub id: String,
    /// Original URL or `file://` path used to acquire the archive.
    pub source_url: Option<String>,
    /// Library directory holding the archive binary.
    pub library_path: PathBuf,
    /// Filename of the persisted binary inside `library_path`.
    pub archive_file_name: String,
    /// Size of the archive file in bytes; the only size counted toward
    /// the library budget.
    pub archive_size: u64,
    /// When the archive first entered the library.
    pub date_added: DateTime<Utc>,
    /// Drives eviction order.
    pub last_accessed: DateTime<Utc>,
    /// Starred archives are exempt from eviction and clear.
    pub starred: bool,
    /// Human label, basename of the source.
    pub display_name: String,
    /// Ordered image snapshots captured at ingestion time.
    pub extracted_images: Vec<ImageSnapshot>,
}

impl ArchiveRecord {
    /// Full path of the persisted archive binary.
    #[must_use]
    pub fn archive_file_path(&self) -> PathBuf {
        self.library_path.join(&self.archive_file_name)
    }
}

/// One extracted image entry, keyed by generated id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Generated identifier, regenerated on re-extraction.
    pub id: String,
    /// Owning archive.
    pub archive_id: String,
    /// Display name (sanitized basename).
    pub name: String,
    /// Raw entry path inside the archive, forward-slash normalized.
    pub original_name: String,
    /// Sanitized, collision-resolved path relative to the session root.
    pub relative_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Independent of the archive star, but starring any image stars the
    /// owning archive.
    pub starred: bool,
}

/// Image metadata snapshot embedded in the owning archive row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSnapshot {
    /// Image id at snapshot time.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Raw entry path inside the archive.
    pub original_name: String,
    /// Relative extraction path.
    pub relative_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Star state.
    pub starred: bool,
}

impl From<&ImageRecord> for ImageSnapshot {
    fn from(image: &ImageRecord) -> Self {
        Self {
            id: image.id.clone(),
            name: image.name.clone(),
            original_name: image.original_name.clone(),
            relative_path: image.relative_path.clone(),
            size: image.size,
            starred: image.starred,
        }
    }
}

/// One remembered load, deduplicated by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Stable identifier derived from the URL.
    pub id: String,
    /// Source URL or `file://` path.
    pub url: String,
    /// User-renameable label.
    pub name: String,
    /// Images found at last load.
    pub image_count: usize,
    /// Most recent load time.
    pub last_accessed: DateTime<Utc>,
    /// Starred entries are preferred during history eviction.
    pub starred: bool,
}

/// User-facing preferences persisted with the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Library byte budget expressed in gigabytes.
    pub library_size_gb: f64,
    /// Load archives straight from clipboard URLs.
    pub clipboard_autoload: bool,
    /// Bound on history entries.
    pub max_history_items: usize,
    /// Upscale images below screen size in fullscreen view.
    pub fullscreen_upscaling: bool,
    /// Automatically load the adjacent archive when paging past the end.
    pub autoload_adjacent: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_size_gb: 2.0,
            clipboard_autoload: false,
            max_history_items: 100,
            fullscreen_upscaling: false,
            autoload_adjacent: false,
        }
    }
}

impl Settings {
    /// Library budget in bytes.
    #[must_use]
    pub fn library_budget_bytes(&self) -> u64 {
        let gb = self.library_size_gb.max(0.0);
        (gb * 1024.0 * 1024.0 * 1024.0) as u64
    }
}

/// The whole persisted document.
///
/// `BTreeMap` keys keep serialization deterministic, which keeps the
/// rotating backups diffable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Database {
    /// Archive rows keyed by id.
    pub archives: BTreeMap<String, ArchiveRecord>,
    /// Image rows keyed by id.
    pub images: BTreeMap<String, ImageRecord>,
    /// Load history, newest entries appended.
    pub history: Vec<HistoryEntry>,
    /// User preferences.
    pub settings: Settings,
}

impl Database {
    /// Inserts or replaces an archive row together with its child images,
    /// dropping any images left over from a previous ingestion of the
    /// same id.
    pub fn insert_archive_with_images(
        &mut self,
        mut archive: ArchiveRecord,
        images: Vec<ImageRecord>,
    ) {
        self.images.retain(|_, img| img.archive_id != archive.id);
        archive.extracted_images = images.iter().map(ImageSnapshot::from).collect();
        archive.starred = archive.starred || images.iter().any(|i| i.starred);
        for image in images {
            self.images.insert(image.id.clone(), image);
        }
        self.archives.insert(archive.id.clone(), archive);
    }

    /// Removes an archive row and all of its child images.
    pub fn remove_archive(&mut self, archive_id: &str) -> Option<ArchiveRecord> {
        self.images.retain(|_, img| img.archive_id != archive_id);
        self.archives.remove(archive_id)
    }

    /// Child images of an archive in ingestion order.
    #[must_use]
    pub fn ordered_images(&self, archive_id: &str) -> Vec<ImageRecord> {
        let Some(archive) = self.archives.get(archive_id) else {
            return Vec::new();
        };
        archive
            .extracted_images
            .iter()
            .filter_map(|snap| self.images.get(&snap.id))
            .cloned()
            .collect()
    }

    /// Sets one image's star and propagates to the owning archive:
    /// `archive.starred == OR over all its images' starred`.
    ///
    /// Returns the image's new star state, or `None` if image or archive
    /// is unknown.
    pub fn set_image_starred(
        &mut self,
        archive_id: &str,
        image_id: &str,
        starred: bool,
    ) -> Option<bool> {
        let image = self.images.get_mut(image_id)?;
        if image.archive_id != archive_id {
            return None;
        }
        image.starred = starred;

        let any_starred = self
            .images
            .values()
            .any(|img| img.archive_id == archive_id && img.starred);
        let archive = self.archives.get_mut(archive_id)?;
        archive.starred = any_starred;
        for snap in &mut archive.extracted_images {
            if snap.id == image_id {
                snap.starred = starred;
            }
        }
        Some(starred)
    }

    /// Stars or unstars an archive directly, aligning all child images so
    /// the propagation invariant keeps holding.
    pub fn set_archive_starred(&mut self, archive_id: &str, starred: bool) -> Option<bool> {
        let archive = self.archives.get_mut(archive_id)?;
        archive.starred = starred;
        if !starred {
            // Unstarring the archive clears its images, otherwise the OR
            // invariant would immediately flip it back.
            for snap in &mut archive.extracted_images {
                snap.starred = false;
            }
            for image in self.images.values_mut() {
                if image.archive_id == archive_id {
                    image.starred = false;
                }
            }
        }
        Some(starred)
    }

    /// Updates an archive's access time.
    pub fn touch_archive(&mut self, archive_id: &str, now: DateTime<Utc>) {
        if let Some(archive) = self.archives.get_mut(archive_id) {
            archive.last_accessed = now;
        }
    }

    /// Records a load in history, deduplicated by URL, bounded by
    /// `settings.max_history_items` with starred-preferred retention.
    pub fn record_history(
        &mut self,
        id: &str,
        url: &str,
        name: &str,
        image_count: usize,
        now: DateTime<Utc>,
    ) {
        if let Some(existing) = self.history.iter_mut().find(|h| h.url == url) {
            existing.image_count = image_count;
            existing.last_accessed = now;
        } else {
            self.history.push(HistoryEntry {
                id: id.to_string(),
                url: url.to_string(),
                name: name.to_string(),
                image_count,
                last_accessed: now,
                starred: false,
            });
        }
        self.prune_history();
    }

    /// Evicts history entries beyond the bound: non-starred oldest first,
    /// then starred oldest if everything left is starred.
    fn prune_history(&mut self) {
        let max = self.settings.max_history_items.max(1);
        while self.history.len() > max {
            let victim = self
                .history
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.starred)
                .min_by_key(|(_, h)| h.last_accessed)
                .map(|(i, _)| i)
                .or_else(|| {
                    self.history
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, h)| h.last_accessed)
                        .map(|(i, _)| i)
                });
            match victim {
                Some(index) => {
                    self.history.remove(index);
                }
                None => break,
            }
        }
    }
}
