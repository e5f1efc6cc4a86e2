//! Rotating backups of the metadata document.
//!
//! Every save first copies the current on-disk document into the backup
//! directory with a millisecond timestamp in the name, then prunes old
//! copies beyond the retention count.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::Result;

/// Copies the current document to a timestamped backup, if it exists.
///
/// Returns the backup path, or `None` when there is nothing to back up
/// yet (first save).
pub fn rotate(db_path: &Path, backup_dir: &Path, retention: usize) -> Result<Option<PathBuf>> {
    if !db_path.exists() {
        return Ok(None);
    }
    fs::create_dir_all(backup_dir)?;

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let backup_path = backup_dir.join(format!("{}-{stamp}.json", stem(db_path)));
    fs::copy(db_path, &backup_path)?;
    debug!(backup = %backup_path.display(), "metadata backed up");

    prune(db_path, backup_dir, retention);
    Ok(Some(backup_path))
}

/// Existing backups for `db_path`, newest first.
pub fn list(db_path: &Path, backup_dir: &Path) -> Vec<PathBuf> {
    let prefix = format!("{}-", stem(db_path));
    let Ok(entries) = fs::read_dir(backup_dir) else {
        return Vec::new();
    };

    let mut backups: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "json")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();
    // Timestamped names sort chronologically.
    backups.sort();
    backups.reverse();
    backups
}

fn prune(db_path: &Path, backup_dir: &Path, retention: usize) {
    for stale in list(db_path, backup_dir).into_iter().skip(retention) {
        if let Err(e) = fs::remove_file(&stale) {
            warn!(backup = %stale.display(), error = %e, "failed to prune backup");
        }
    }
}

fn stem(db_path: &Path) -> String {
    db_path
        .file_stem()
        .map_or_else(|| "metadata".to_string(), |s| s.to_string_lossy().into_owned())
}
