//! RAR archive adapter with an ordered fallback chain.
//!
//! The in-process extractor (the `unrar` crate) is attempted first; on
//! failure an external `unrar` binary, then an external `7z` binary are
//! tried. Only after all three fail is the operation reported as failed,
//! with every cause collected into one message.
//!
//! None of these extractors can reliably filter entries at extraction
//! time, so each strategy extracts into a scratch directory whose contents
//! are rescanned from disk afterwards; only image files are moved into the
//! real destination.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::ProgressCallback;
use crate::error::{Result, VaultError};
use crate::formats::images::is_image_name;
use crate::fsutil;
use crate::security::{ClaimedPaths, resolve_entry_path};

use super::traits::{EntryExtractor, EntryInfo, ExtractedImage};

/// RAR adapter with in-process and external-binary strategies.
pub struct RarExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    InProcess,
    UnrarBinary,
    SevenZipBinary,
}

const STRATEGY_ORDER: [Strategy; 3] = [
    Strategy::InProcess,
    Strategy::UnrarBinary,
    Strategy::SevenZipBinary,
];

impl Strategy {
    const fn name(self) -> &'static str {
        match self {
            Self::InProcess => "in-process unrar",
            Self::UnrarBinary => "unrar binary",
            Self::SevenZipBinary => "7z binary",
        }
    }
}

impl EntryExtractor for RarExtractor {
    fn list_entries(&self, archive: &Path) -> Result<Vec<EntryInfo>> {
        let mut causes = Vec::new();

        match list_in_process(archive) {
            Ok(entries) => return Ok(entries),
            Err(e) => causes.push(format!("{}: {e}", Strategy::InProcess.name())),
        }
        match list_with_unrar_binary(archive) {
            Ok(entries) => return Ok(entries),
            Err(e) => causes.push(format!("{}: {e}", Strategy::UnrarBinary.name())),
        }
        match list_with_sevenzip_binary(archive) {
            Ok(entries) => return Ok(entries),
            Err(e) => causes.push(format!("{}: {e}", Strategy::SevenZipBinary.name())),
        }

        Err(VaultError::Extraction {
            archive: display_name(archive),
            reason: causes.join("; "),
        })
    }

    fn extract_images(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<ExtractedImage>> {
        let scratch = tempfile::Builder::new()
            .prefix("picvault-rar-")
            .tempdir()?;

        let mut causes = Vec::new();
        let mut succeeded = false;
        for strategy in STRATEGY_ORDER {
            match run_bulk(strategy, archive, scratch.path()) {
                Ok(()) => {
                    debug!(archive = %display_name(archive), strategy = strategy.name(), "rar extraction succeeded");
                    succeeded = true;
                    break;
                }
                Err(e) => {
                    warn!(archive = %display_name(archive), strategy = strategy.name(), error = %e, "rar strategy failed");
                    causes.push(format!("{}: {e}", strategy.name()));
                    // Leftovers from the failed attempt must not leak into
                    // the next strategy's rescan.
                    clear_dir(scratch.path())?;
                }
            }
        }

        if !succeeded {
            return Err(VaultError::Extraction {
                archive: display_name(archive),
                reason: causes.join("; "),
            });
        }

        sweep_images(scratch.path(), dest, progress)
    }

    fn extract_entry(&self, archive: &Path, entry_name: &str, dest_dir: &Path) -> Result<PathBuf> {
        let scratch = tempfile::Builder::new()
            .prefix("picvault-rar-")
            .tempdir()?;

        let mut causes = Vec::new();
        for strategy in STRATEGY_ORDER {
            match run_single(strategy, archive, entry_name, scratch.path()) {
                Ok(()) => {
                    if let Some(found) = find_entry_on_disk(scratch.path(), entry_name) {
                        let target = resolve_entry_path(dest_dir, entry_name)?;
                        if let Some(parent) = target.parent() {
                            fs::create_dir_all(parent)?;
                        }
                        fsutil::move_file(&found, &target)?;
                        return Ok(target);
                    }
                    causes.push(format!("{}: entry not present after extraction", strategy.name()));
                }
                Err(e) => causes.push(format!("{}: {e}", strategy.name())),
            }
            clear_dir(scratch.path())?;
        }

        Err(VaultError::Extraction {
            archive: display_name(archive),
            reason: format!("cannot extract '{entry_name}': {}", causes.join("; ")),
        })
    }

    fn format_name(&self) -> &'static str {
        "rar"
    }
}

fn run_bulk(strategy: Strategy, archive: &Path, scratch: &Path) -> Result<()> {
    match strategy {
        Strategy::InProcess => extract_in_process(archive, scratch, None),
        Strategy::UnrarBinary => run_unrar_binary(archive, scratch, None),
        Strategy::SevenZipBinary => run_sevenzip_binary(archive, scratch, None),
    }
}

fn run_single(strategy: Strategy, archive: &Path, entry_name: &str, scratch: &Path) -> Result<()> {
    match strategy {
        Strategy::InProcess => extract_in_process(archive, scratch, Some(entry_name)),
        Strategy::UnrarBinary => run_unrar_binary(archive, scratch, Some(entry_name)),
        Strategy::SevenZipBinary => run_sevenzip_binary(archive, scratch, Some(entry_name)),
    }
}

fn list_in_process(archive: &Path) -> Result<Vec<EntryInfo>> {
    let opened = unrar::Archive::new(archive)
        .open_for_listing()
        .map_err(|e| rar_error(archive, &e.to_string()))?;

    let mut entries = Vec::new();
    for item in opened {
        let header = item.map_err(|e| rar_error(archive, &e.to_string()))?;
        entries.push(EntryInfo {
            name: header.filename.to_string_lossy().replace('\\', "/"),
            is_directory: !header.is_file(),
        });
    }
    Ok(entries)
}

fn extract_in_process(archive: &Path, scratch: &Path, only: Option<&str>) -> Result<()> {
    let mut opened = unrar::Archive::new(archive)
        .open_for_processing()
        .map_err(|e| rar_error(archive, &e.to_string()))?;

    let mut matched = only.is_none();
    while let Some(header) = opened
        .read_header()
        .map_err(|e| rar_error(archive, &e.to_string()))?
    {
        let name = header.entry().filename.to_string_lossy().replace('\\', "/");
        let wanted = header.entry().is_file()
            && match only {
                Some(target) => name == target,
                None => is_image_name(&name),
            };

        opened = if wanted {
            matched = true;
            header
                .extract_with_base(scratch)
                .map_err(|e| rar_error(archive, &e.to_string()))?
        } else {
            header
                .skip()
                .map_err(|e| rar_error(archive, &e.to_string()))?
        };
    }

    if !matched {
        return Err(rar_error(
            archive,
            &format!("entry not found: {}", only.unwrap_or_default()),
        ));
    }
    Ok(())
}

fn run_unrar_binary(archive: &Path, scratch: &Path, only: Option<&str>) -> Result<()> {
    let binary = which::which("unrar")
        .map_err(|_| rar_error(archive, "unrar binary not found on PATH"))?;

    let mut command = Command::new(binary);
    command.arg("x").arg("-o+").arg("-inul").arg(archive);
    if let Some(entry) = only {
        command.arg(entry);
    }
    // unrar treats the trailing separator as "this is the output directory".
    command.arg(format!("{}/", scratch.display()));

    let output = command.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(rar_error(
            archive,
            &format!("unrar exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(())
}

fn run_sevenzip_binary(archive: &Path, scratch: &Path, only: Option<&str>) -> Result<()> {
    let binary =
        which::which("7z").map_err(|_| rar_error(archive, "7z binary not found on PATH"))?;

    let mut command = Command::new(binary);
    command
        .arg("x")
        .arg("-y")
        .arg(format!("-o{}", scratch.display()))
        .arg(archive);
    if let Some(entry) = only {
        command.arg(entry);
    }

    let output = command.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(rar_error(
            archive,
            &format!("7z exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(())
}

fn list_with_unrar_binary(archive: &Path) -> Result<Vec<EntryInfo>> {
    let binary = which::which("unrar")
        .map_err(|_| rar_error(archive, "unrar binary not found on PATH"))?;

    let output = Command::new(binary).arg("lb").arg(archive).output()?;
    if !output.status.success() {
        return Err(rar_error(
            archive,
            &format!("unrar lb exited with {}", output.status),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| EntryInfo {
            name: l.replace('\\', "/"),
            // Bare listing carries no type flag; treat trailing slash as
            // the only directory marker.
            is_directory: l.ends_with('/'),
        })
        .collect())
}

fn list_with_sevenzip_binary(archive: &Path) -> Result<Vec<EntryInfo>> {
    let binary =
        which::which("7z").map_err(|_| rar_error(archive, "7z binary not found on PATH"))?;

    let output = Command::new(binary)
        .arg("l")
        .arg("-ba")
        .arg("-slt")
        .arg(archive)
        .output()?;
    if !output.status.success() {
        return Err(rar_error(
            archive,
            &format!("7z l exited with {}", output.status),
        ));
    }

    Ok(parse_sevenzip_listing(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Parses `7z l -ba -slt` output into entry infos.
fn parse_sevenzip_listing(listing: &str) -> Vec<EntryInfo> {
    let mut entries = Vec::new();
    let mut current: Option<EntryInfo> = None;

    for line in listing.lines() {
        let line = line.trim();
        if let Some(path) = line.strip_prefix("Path = ") {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(EntryInfo {
                name: path.replace('\\', "/"),
                is_directory: false,
            });
        } else if let Some(attrs) = line.strip_prefix("Attributes = ")
            && let Some(entry) = current.as_mut()
        {
            entry.is_directory = attrs.contains('D');
        }
    }
    if let Some(done) = current.take() {
        entries.push(done);
    }
    entries
}

/// Moves image files found under `scratch` into `dest`, preserving
/// relative layout and resolving collisions deterministically.
fn sweep_images(
    scratch: &Path,
    dest: &Path,
    progress: &mut dyn ProgressCallback,
) -> Result<Vec<ExtractedImage>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(scratch)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(scratch) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");
        if is_image_name(&name) {
            found.push((entry.path().to_path_buf(), name));
        }
    }

    let total = found.len();
    let mut claims = ClaimedPaths::new();
    let mut images = Vec::with_capacity(total);

    for (processed, (source, name)) in found.into_iter().enumerate() {
        match place_image(&source, &name, dest, &mut claims) {
            Ok(image) => images.push(image),
            Err(e) if e.is_entry_local() => {
                warn!(entry = %name, error = %e, "skipping rar entry");
            }
            Err(e) => return Err(e),
        }
        progress.on_entry(processed + 1, total);
    }

    progress.on_entry(total, total);
    Ok(images)
}

fn place_image(
    source: &Path,
    name: &str,
    dest: &Path,
    claims: &mut ClaimedPaths,
) -> Result<ExtractedImage> {
    let target = claims.claim(resolve_entry_path(dest, name)?);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let size = fs::metadata(source)?.len();
    fsutil::move_file(source, &target)?;

    let relative_path = target
        .strip_prefix(dest)
        .map_or_else(|_| target.clone(), Path::to_path_buf);

    Ok(ExtractedImage {
        original_name: name.to_string(),
        relative_path,
        size,
    })
}

/// Locates the file produced for `entry_name` under a scratch directory.
fn find_entry_on_disk(scratch: &Path, entry_name: &str) -> Option<PathBuf> {
    WalkDir::new(scratch)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            e.path()
                .strip_prefix(scratch)
                .map(|rel| rel.to_string_lossy().replace('\\', "/") == entry_name)
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
}

fn clear_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn rar_error(archive: &Path, reason: &str) -> VaultError {
    VaultError::Extraction {
        archive: display_name(archive),
        reason: reason.to_string(),
    }
}

fn display_name(archive: &Path) -> String {
    archive
        .file_name()
        .map_or_else(|| archive.display().to_string(), |n| n.to_string_lossy().into_owned())
}
