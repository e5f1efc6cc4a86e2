//! Uniform extraction contract implemented by every format adapter.

use std::path::{Path, PathBuf};

use crate::ProgressCallback;
use crate::error::Result;

use super::ArchiveKind;

/// One entry as listed inside an archive, before any sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Raw entry path, forward-slash normalized.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

/// One image materialized on disk by a bulk extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Raw entry path inside the archive, forward-slash normalized.
    pub original_name: String,
    /// Sanitized, collision-resolved path relative to the destination.
    pub relative_path: PathBuf,
    /// Size on disk in bytes.
    pub size: u64,
}

/// Capability contract shared by all format adapters.
///
/// Failure semantics: individual entry failures during `extract_images`
/// are logged and skipped; only whole-archive failures (cannot open, wrong
/// signature, all fallbacks exhausted) bubble up. `extract_entry` must
/// work without a prior `extract_images` run, and entry-level problems
/// there are fatal.
pub trait EntryExtractor {
    /// Lists all entries in the archive.
    fn list_entries(&self, archive: &Path) -> Result<Vec<EntryInfo>>;

    /// Extracts every image entry into `dest`, reporting progress as
    /// `(processed, total)` with a final call at `processed == total`.
    fn extract_images(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<ExtractedImage>>;

    /// Extracts a single named entry into `dest_dir`, returning the
    /// written file path.
    fn extract_entry(&self, archive: &Path, entry_name: &str, dest_dir: &Path) -> Result<PathBuf>;

    /// Returns the adapter's format name for diagnostics.
    fn format_name(&self) -> &'static str;
}

/// Returns the adapter for a detected format.
#[must_use]
pub fn extractor_for(kind: ArchiveKind) -> Box<dyn EntryExtractor> {
    match kind {
        ArchiveKind::Zip => Box::new(super::zip::ZipExtractor),
        ArchiveKind::Rar => Box::new(super::rar::RarExtractor),
        ArchiveKind::SevenZ => Box::new(super::sevenz::SevenZExtractor),
    }
}
