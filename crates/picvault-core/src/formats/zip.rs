//! ZIP archive adapter.
//!
//! Reads the central directory in memory, iterates entries, and
//! decompresses only image entries. Per-entry failures are logged and
//! skipped; only a failure to open the archive itself is fatal.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::ProgressCallback;
use crate::error::{Result, VaultError};
use crate::formats::images::is_image_name;
use crate::security::{ClaimedPaths, resolve_entry_path};

use super::traits::{EntryExtractor, EntryInfo, ExtractedImage};

/// ZIP adapter backed by the `zip` crate.
pub struct ZipExtractor;

impl ZipExtractor {
    fn open(archive: &Path) -> Result<zip::ZipArchive<File>> {
        let file = File::open(archive)?;
        zip::ZipArchive::new(file).map_err(|e| VaultError::Extraction {
            archive: display_name(archive),
            reason: format!("cannot open zip archive: {e}"),
        })
    }
}

impl EntryExtractor for ZipExtractor {
    fn list_entries(&self, archive: &Path) -> Result<Vec<EntryInfo>> {
        let mut zip = Self::open(archive)?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let entry = zip.by_index(index).map_err(|e| VaultError::Extraction {
                archive: display_name(archive),
                reason: format!("cannot read entry {index}: {e}"),
            })?;
            entries.push(EntryInfo {
                name: entry.name().replace('\\', "/"),
                is_directory: entry.is_dir(),
            });
        }
        Ok(entries)
    }

    fn extract_images(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<ExtractedImage>> {
        let mut zip = Self::open(archive)?;

        // First pass over the central directory: image entries only, so the
        // progress total reflects what will actually be written.
        let mut wanted = Vec::new();
        for index in 0..zip.len() {
            match zip.by_index(index) {
                Ok(entry) => {
                    let name = entry.name().replace('\\', "/");
                    if !entry.is_dir() && is_image_name(&name) {
                        wanted.push((index, name));
                    }
                }
                Err(e) => {
                    warn!(archive = %display_name(archive), index, error = %e, "skipping unreadable zip entry");
                }
            }
        }

        let total = wanted.len();
        let mut claims = ClaimedPaths::new();
        let mut extracted = Vec::with_capacity(total);

        for (processed, (index, name)) in wanted.into_iter().enumerate() {
            match extract_indexed(&mut zip, index, &name, dest, &mut claims) {
                Ok(image) => extracted.push(image),
                Err(e) if e.is_entry_local() => {
                    warn!(archive = %display_name(archive), entry = %name, error = %e, "skipping zip entry");
                }
                Err(e) => return Err(e),
            }
            progress.on_entry(processed + 1, total);
        }

        progress.on_entry(total, total);
        Ok(extracted)
    }

    fn extract_entry(&self, archive: &Path, entry_name: &str, dest_dir: &Path) -> Result<PathBuf> {
        let mut zip = Self::open(archive)?;

        // Entry names recorded at ingestion are forward-slash normalized;
        // the archive may store backslashes.
        let stored_name = find_stored_name(&mut zip, entry_name).ok_or_else(|| {
            VaultError::Extraction {
                archive: display_name(archive),
                reason: format!("entry not found: {entry_name}"),
            }
        })?;

        let mut entry = zip
            .by_name(&stored_name)
            .map_err(|e| VaultError::Extraction {
                archive: display_name(archive),
                reason: format!("cannot read entry {entry_name}: {e}"),
            })?;

        let target = resolve_entry_path(dest_dir, entry_name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        Ok(target)
    }

    fn format_name(&self) -> &'static str {
        "zip"
    }
}

fn extract_indexed(
    zip: &mut zip::ZipArchive<File>,
    index: usize,
    name: &str,
    dest: &Path,
    claims: &mut ClaimedPaths,
) -> Result<ExtractedImage> {
    let mut entry = zip.by_index(index).map_err(|e| {
        VaultError::Io(io::Error::other(format!("zip entry {index}: {e}")))
    })?;

    let target = claims.claim(resolve_entry_path(dest, name)?);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&target)?;
    let size = io::copy(&mut entry, &mut out)?;

    let relative_path = target
        .strip_prefix(dest)
        .map_or_else(|_| target.clone(), Path::to_path_buf);

    Ok(ExtractedImage {
        original_name: name.to_string(),
        relative_path,
        size,
    })
}

/// Finds the stored entry name matching a forward-slash normalized name.
fn find_stored_name(zip: &mut zip::ZipArchive<File>, wanted: &str) -> Option<String> {
    let names: Vec<String> = zip.file_names().map(ToString::to_string).collect();
    names
        .iter()
        .find(|n| n.as_str() == wanted)
        .or_else(|| names.iter().find(|n| n.replace('\\', "/") == wanted))
        .cloned()
}

fn display_name(archive: &Path) -> String {
    archive
        .file_name()
        .map_or_else(|| archive.display().to_string(), |n| n.to_string_lossy().into_owned())
}
