//! Library budget accounting and eviction.
//!
//! Usage counts only non-starred archive bytes: starred archives are
//! outside the budget entirely, so starring an archive can never cause
//! another one to be evicted. Eviction walks least-recently-accessed
//! first and stops as soon as usage fits the budget again.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::db::Database;
use crate::store::LibraryStore;

/// Snapshot of library occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryUsage {
    /// Bytes counted toward the budget (non-starred archives only).
    pub total_bytes: u64,
    /// All archive rows, starred included.
    pub archive_count: usize,
    /// Starred archive rows.
    pub starred_count: usize,
}

/// Computes occupancy from metadata rows.
#[must_use]
pub fn usage(db: &Database) -> LibraryUsage {
    let mut total_bytes = 0;
    let mut starred_count = 0;
    for archive in db.archives.values() {
        if archive.starred {
            starred_count += 1;
        } else {
            total_bytes += archive.archive_size;
        }
    }
    LibraryUsage {
        total_bytes,
        archive_count: db.archives.len(),
        starred_count,
    }
}

/// Evicts least-recently-accessed archives until usage fits the budget.
///
/// Starred and pinned archives are never candidates. A slot that fails
/// to delete is logged and skipped, keeping its metadata row so the
/// library never forgets an archive that is still on disk. Returns the
/// ids actually evicted.
pub fn enforce_budget(
    db: &mut Database,
    store: &LibraryStore,
    pinned: &HashSet<String>,
) -> Vec<String> {
    let budget = db.settings.library_budget_bytes();
    let mut counted = usage(db).total_bytes;
    if counted <= budget {
        return Vec::new();
    }

    let mut candidates: Vec<(String, u64)> = db
        .archives
        .values()
        .filter(|a| !a.starred && !pinned.contains(&a.id))
        .map(|a| (a.id.clone(), a.archive_size))
        .collect();
    candidates.sort_by_key(|(id, _)| db.archives[id].last_accessed);

    let mut evicted = Vec::new();
    for (id, size) in candidates {
        if counted <= budget {
            break;
        }
        if let Err(e) = store.remove(&id) {
            warn!(archive = %id, error = %e, "eviction failed, keeping archive");
            continue;
        }
        db.remove_archive(&id);
        counted = counted.saturating_sub(size);
        info!(archive = %id, freed = size, "archive evicted");
        evicted.push(id);
    }
    evicted
}

/// Removes every non-starred, non-pinned archive: metadata rows, library
/// slots, and any orphan slot directories metadata does not know about.
///
/// Returns the number of archives removed. Idempotent; a second call on
/// an already-clear library removes nothing.
pub fn clear_all(db: &mut Database, store: &LibraryStore, pinned: &HashSet<String>) -> usize {
    let victims: Vec<String> = db
        .archives
        .values()
        .filter(|a| !a.starred && !pinned.contains(&a.id))
        .map(|a| a.id.clone())
        .collect();

    let mut removed = 0;
    for id in &victims {
        if let Err(e) = store.remove(id) {
            warn!(archive = %id, error = %e, "clear failed for archive, keeping it");
            continue;
        }
        db.remove_archive(id);
        removed += 1;
    }

    // Slots on disk with no metadata row are leftovers from crashes.
    for id in store.slot_ids() {
        if !db.archives.contains_key(&id) && !pinned.contains(&id) {
            if let Err(e) = store.remove(&id) {
                warn!(slot = %id, error = %e, "failed to remove orphan slot");
            }
        }
    }

    info!(removed, "library cleared");
    removed
}
