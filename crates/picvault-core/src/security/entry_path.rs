//! Sanitization and containment checks for archive entry names.
//!
//! Entry names come straight out of untrusted archives and may contain
//! backslash separators, traversal sequences, absolute paths, drive
//! letters, or characters illegal on the host filesystem. Every path the
//! core derives from an entry name passes through here before anything is
//! written to disk.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, VaultError};
use crate::fsutil;

/// Characters stripped from each path segment.
///
/// Windows-reserved characters are removed everywhere so a library copied
/// between platforms stays readable.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Sanitizes a raw entry name into a safe relative path.
///
/// Backslashes are normalized to forward slashes, segments are cleaned of
/// illegal and control characters, empty and `.` segments are dropped.
/// Returns `Err(PathTraversal)` for `..` segments, absolute paths and
/// drive-letter prefixes, and `Ok(None)` when nothing usable remains
/// after sanitization.
pub fn sanitize_entry_name(raw: &str) -> Result<Option<PathBuf>> {
    let normalized = raw.replace('\\', "/");

    let mut out = PathBuf::new();
    for segment in normalized.split('/') {
        if segment == ".." {
            return Err(VaultError::PathTraversal { entry: raw.into() });
        }
        if segment.is_empty() || segment == "." {
            continue;
        }
        // Drive letters ("C:") reduce to "C" after the colon is stripped;
        // reject them explicitly before that happens.
        if segment.len() == 2 && segment.ends_with(':') {
            return Err(VaultError::PathTraversal { entry: raw.into() });
        }
        let cleaned: String = segment
            .chars()
            .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
            .collect();
        let cleaned = cleaned.trim_end_matches([' ', '.']).to_string();
        if cleaned.is_empty() || cleaned == ".." {
            continue;
        }
        out.push(cleaned);
    }

    if normalized.starts_with('/') {
        return Err(VaultError::PathTraversal { entry: raw.into() });
    }

    if out.as_os_str().is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

/// Resolves an untrusted entry name to a concrete output path under `root`.
///
/// After sanitization the joined path is re-resolved and verified to be
/// equal to or a descendant of the root; any mismatch is a
/// [`VaultError::PathTraversal`]. A sanitized name that reduces to nothing
/// also counts as traversal here, because single-entry extraction has no
/// way to skip.
pub fn resolve_entry_path(root: &Path, raw: &str) -> Result<PathBuf> {
    let relative = sanitize_entry_name(raw)?.ok_or_else(|| VaultError::PathTraversal {
        entry: raw.to_string(),
    })?;

    let joined = root.join(&relative);

    // Belt and braces: sanitization already removed every way out, but the
    // final path is still re-checked against the root before use.
    let resolved = fsutil::normalize_lexically(&joined);
    let resolved_root = fsutil::normalize_lexically(root);
    if !resolved.starts_with(&resolved_root) {
        return Err(VaultError::PathTraversal {
            entry: raw.to_string(),
        });
    }
    if resolved
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(VaultError::PathTraversal {
            entry: raw.to_string(),
        });
    }

    Ok(joined)
}
