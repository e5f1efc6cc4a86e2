//! 7z archive adapter.
//!
//! Entries are listed first so the progress total is known up front, then
//! extraction runs through the sevenz-rust2 callback API writing only
//! image entries. Password-protected archives are rejected with a clear
//! message rather than a cryptic decoder error.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use sevenz_rust2::{Archive, Password};
use tracing::warn;

use crate::ProgressCallback;
use crate::error::{Result, VaultError};
use crate::formats::images::is_image_name;
use crate::security::{ClaimedPaths, resolve_entry_path};

use super::traits::{EntryExtractor, EntryInfo, ExtractedImage};

/// 7z adapter backed by sevenz-rust2.
pub struct SevenZExtractor;

impl SevenZExtractor {
    fn read_metadata(archive: &Path) -> Result<(File, Vec<EntryInfo>)> {
        let mut file = File::open(archive)?;
        let password = Password::empty();
        let meta = Archive::read(&mut file, &password).map_err(|e| {
            let err_str = e.to_string().to_lowercase();
            let reason = if err_str.contains("encrypt") || err_str.contains("password") {
                "archive is password-protected".to_string()
            } else {
                format!("cannot open 7z archive: {e}")
            };
            VaultError::Extraction {
                archive: display_name(archive),
                reason,
            }
        })?;

        let entries = meta
            .files
            .iter()
            .map(|f| EntryInfo {
                name: f.name.replace('\\', "/"),
                is_directory: f.is_directory(),
            })
            .collect();

        file.rewind()?;
        Ok((file, entries))
    }
}

impl EntryExtractor for SevenZExtractor {
    fn list_entries(&self, archive: &Path) -> Result<Vec<EntryInfo>> {
        let (_, entries) = Self::read_metadata(archive)?;
        Ok(entries)
    }

    fn extract_images(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<ExtractedImage>> {
        let (mut file, entries) = Self::read_metadata(archive)?;

        let total = entries
            .iter()
            .filter(|e| !e.is_directory && is_image_name(&e.name))
            .count();

        // The callback API hands us one borrow per entry; interior
        // mutability lets one closure accumulate results and progress.
        let extracted = RefCell::new(Vec::with_capacity(total));
        let claims = RefCell::new(ClaimedPaths::new());
        let progress = RefCell::new(progress);
        let processed = RefCell::new(0usize);
        let archive_name = display_name(archive);

        let extract_fn = |entry: &sevenz_rust2::ArchiveEntry,
                          reader: &mut dyn Read,
                          _dest_dir: &PathBuf|
         -> std::result::Result<bool, sevenz_rust2::Error> {
            let name = entry.name.replace('\\', "/");
            if entry.is_directory() || !is_image_name(&name) {
                return Ok(true);
            }

            match write_image_entry(dest, &name, reader, &mut claims.borrow_mut()) {
                Ok(image) => extracted.borrow_mut().push(image),
                Err(e) if e.is_entry_local() => {
                    warn!(archive = %archive_name, entry = %name, error = %e, "skipping 7z entry");
                }
                Err(e) => {
                    return Err(sevenz_rust2::Error::Other(e.to_string().into()));
                }
            }

            let mut count = processed.borrow_mut();
            *count += 1;
            progress.borrow_mut().on_entry(*count, total);
            Ok(true)
        };

        sevenz_rust2::decompress_with_extract_fn(&mut file, dest, extract_fn).map_err(|e| {
            VaultError::Extraction {
                archive: display_name(archive),
                reason: format!("7z extraction failed: {e}"),
            }
        })?;

        progress.borrow_mut().on_entry(total, total);
        Ok(extracted.into_inner())
    }

    fn extract_entry(&self, archive: &Path, entry_name: &str, dest_dir: &Path) -> Result<PathBuf> {
        let (mut file, _) = Self::read_metadata(archive)?;

        let written = RefCell::new(None::<PathBuf>);
        let failure = RefCell::new(None::<VaultError>);

        let extract_fn = |entry: &sevenz_rust2::ArchiveEntry,
                          reader: &mut dyn Read,
                          _dest_dir: &PathBuf|
         -> std::result::Result<bool, sevenz_rust2::Error> {
            let name = entry.name.replace('\\', "/");
            if entry.is_directory() || name != entry_name {
                return Ok(true);
            }

            match write_single_entry(dest_dir, &name, reader) {
                Ok(path) => {
                    *written.borrow_mut() = Some(path);
                }
                Err(e) => {
                    *failure.borrow_mut() = Some(e);
                }
            }
            // Target found; stop walking the remaining entries.
            Ok(false)
        };

        sevenz_rust2::decompress_with_extract_fn(&mut file, dest_dir, extract_fn).map_err(|e| {
            VaultError::Extraction {
                archive: display_name(archive),
                reason: format!("7z extraction failed: {e}"),
            }
        })?;

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        written.into_inner().ok_or_else(|| VaultError::Extraction {
            archive: display_name(archive),
            reason: format!("entry not found: {entry_name}"),
        })
    }

    fn format_name(&self) -> &'static str {
        "7z"
    }
}

fn write_image_entry(
    dest: &Path,
    name: &str,
    reader: &mut dyn Read,
    claims: &mut ClaimedPaths,
) -> Result<ExtractedImage> {
    let target = claims.claim(resolve_entry_path(dest, name)?);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&target)?;
    let size = io::copy(reader, &mut out)?;

    let relative_path = target
        .strip_prefix(dest)
        .map_or_else(|_| target.clone(), Path::to_path_buf);

    Ok(ExtractedImage {
        original_name: name.to_string(),
        relative_path,
        size,
    })
}

fn write_single_entry(dest_dir: &Path, name: &str, reader: &mut dyn Read) -> Result<PathBuf> {
    let target = resolve_entry_path(dest_dir, name)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&target)?;
    io::copy(reader, &mut out)?;
    Ok(target)
}

fn display_name(archive: &Path) -> String {
    archive
        .file_name()
        .map_or_else(|| archive.display().to_string(), |n| n.to_string_lossy().into_owned())
}
