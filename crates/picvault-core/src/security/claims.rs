//! Deterministic filename collision resolution.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Tracks output paths claimed during one extraction pass and resolves
/// collisions deterministically.
///
/// If a target path already exists on disk, or was claimed earlier in the
/// same pass, `-N` is appended before the extension, incrementing N until
/// a free name is found. Given the same entry ordering the result is
/// always the same, so `a.jpg` colliding twice yields `a.jpg`, `a-1.jpg`,
/// `a-2.jpg` in first-seen order.
#[derive(Debug, Default)]
pub struct ClaimedPaths {
    seen: HashSet<PathBuf>,
}

impl ClaimedPaths {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `wanted`, returning the possibly-renamed path to write to.
    pub fn claim(&mut self, wanted: PathBuf) -> PathBuf {
        let mut candidate = wanted.clone();
        let mut counter = 1;
        while self.seen.contains(&candidate) || candidate.exists() {
            candidate = numbered_variant(&wanted, counter);
            counter += 1;
        }
        self.seen.insert(candidate.clone());
        candidate
    }
}

/// Builds `name-N.ext` next to the original path.
fn numbered_variant(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "file".to_string(), |s| s.to_string_lossy().into_owned());
    let renamed = match path.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    };
    path.with_file_name(renamed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_first_claim_unchanged() {
        let mut claims = ClaimedPaths::new();
        let p = claims.claim(PathBuf::from("/nonexistent-root/a.jpg"));
        assert_eq!(p, PathBuf::from("/nonexistent-root/a.jpg"));
    }

    #[test]
    fn test_collision_appends_counter() {
        let mut claims = ClaimedPaths::new();
        let first = claims.claim(PathBuf::from("/nonexistent-root/a.jpg"));
        let second = claims.claim(PathBuf::from("/nonexistent-root/a.jpg"));
        let third = claims.claim(PathBuf::from("/nonexistent-root/a.jpg"));
        assert_eq!(first, PathBuf::from("/nonexistent-root/a.jpg"));
        assert_eq!(second, PathBuf::from("/nonexistent-root/a-1.jpg"));
        assert_eq!(third, PathBuf::from("/nonexistent-root/a-2.jpg"));
    }

    #[test]
    fn test_no_extension() {
        let mut claims = ClaimedPaths::new();
        claims.claim(PathBuf::from("/nonexistent-root/README"));
        let second = claims.claim(PathBuf::from("/nonexistent-root/README"));
        assert_eq!(second, PathBuf::from("/nonexistent-root/README-1"));
    }

    #[test]
    fn test_existing_file_counts_as_claimed() {
        let dir = TempDir::new().unwrap();
        let on_disk = dir.path().join("img.png");
        fs::write(&on_disk, b"x").unwrap();

        let mut claims = ClaimedPaths::new();
        let resolved = claims.claim(on_disk);
        assert_eq!(resolved, dir.path().join("img-1.png"));
    }

    #[test]
    fn test_distinct_directories_do_not_collide() {
        let mut claims = ClaimedPaths::new();
        let a = claims.claim(PathBuf::from("/nonexistent-root/x/a.jpg"));
        let b = claims.claim(PathBuf::from("/nonexistent-root/y/a.jpg"));
        assert_eq!(a, PathBuf::from("/nonexistent-root/x/a.jpg"));
        assert_eq!(b, PathBuf::from("/nonexistent-root/y/a.jpg"));
    }
}
