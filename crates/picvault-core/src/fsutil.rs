//! Small filesystem and path-algebra helpers shared across the core.
//!
//! Lexical normalization is kept as a pure function here so entry-path
//! containment checks can be unit-tested without touching the
//! filesystem.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path: drops `.` components and applies `..`
/// against previously seen components. Does not touch the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Moves a file, falling back to copy-then-delete when rename crosses a
/// filesystem boundary.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }
}

/// Removes a directory tree, treating "already gone" as success.
pub fn remove_dir_idempotent(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
