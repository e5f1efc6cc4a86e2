//! Stable archive identity.
//!
//! Identity is the dedup key: two loads with the same identity resolve
//! to the same library slot. URLs hash by their exact string; raw byte
//! sources hash by their content; local files hash by their canonical
//! path string. A path already inside the library keeps the identity of
//! its enclosing slot directory so re-opening a persisted archive never
//! creates a second copy.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Hex digest length kept in identifiers.
const ID_LEN: usize = 32;

/// Identity for a URL source.
#[must_use]
pub fn id_for_url(url: &str) -> String {
    digest(url.as_bytes())
}

/// Identity for an archive supplied as raw bytes.
///
/// Content-hashed, so identical bytes arriving from different places
/// dedupe into one slot.
#[must_use]
pub fn id_for_bytes(bytes: &[u8]) -> String {
    digest(bytes)
}

/// Identity for a local file source. Callers hash the canonicalized
/// path so different spellings of one file agree.
///
/// Files living inside `library_root/<id>/` reuse `<id>` instead of
/// hashing the path.
#[must_use]
pub fn id_for_path(path: &Path, library_root: &Path) -> String {
    if let Some(id) = library_slot_id(path, library_root) {
        return id;
    }
    digest(path.to_string_lossy().as_bytes())
}

/// Extracts the slot id when `path` is `library_root/<id>/<file>`.
fn library_slot_id(path: &Path, library_root: &Path) -> Option<String> {
    let parent = path.parent()?;
    if parent.parent()? != library_root {
        return None;
    }
    let id = parent.file_name()?.to_str()?;
    (id.len() == ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit())).then(|| id.to_string())
}

/// Human label for a URL: the final path segment, query stripped.
#[must_use]
pub fn display_name_for_url(url: &str) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = trimmed.split_once("://").map_or(trimmed, |(_, rest)| rest);
    let path_part = after_scheme.trim_end_matches('/');
    if !path_part.contains('/') {
        // Host only, no path segment to name after.
        return "archive".to_string();
    }
    let name = path_part.rsplit('/').next().unwrap_or(path_part);
    if name.is_empty() {
        "archive".to_string()
    } else {
        name.to_string()
    }
}

/// Human label for a local path: its file name.
#[must_use]
pub fn display_name_for_path(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "archive".to_string(), |n| n.to_string_lossy().into_owned())
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let full = hex::encode(hasher.finalize());
    full[..ID_LEN].to_string()
}
