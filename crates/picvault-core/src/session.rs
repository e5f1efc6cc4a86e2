//! Ephemeral extraction sessions.
//!
//! Every load extracts into `<session_root>/<archive_id>/`, recreated
//! from scratch so stale files from an earlier load never leak into the
//! new one. Single-image extractions get their own `<id>-single-<n>`
//! directories. A sweeper removes inactive directories past a
//! configurable age, verifying each candidate really lives under the
//! session root before deleting it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::config::VaultConfig;
use crate::error::Result;
use crate::fsutil;

/// Creates, tracks and sweeps session directories.
pub struct SessionManager {
    root: PathBuf,
    max_age: Duration,
    active: Mutex<HashSet<String>>,
}

impl SessionManager {
    /// Creates the manager; the session root itself is created lazily.
    #[must_use]
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            root: config.session_root.clone(),
            max_age: config.session_max_age,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Session root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a fresh session directory for an archive, removing any
    /// previous directory of the same id first, and marks it active.
    ///
    /// # Errors
    ///
    /// Returns an error if the old directory cannot be removed or the
    /// new one cannot be created.
    pub fn create(&self, archive_id: &str) -> Result<PathBuf> {
        let dir = self.root.join(archive_id);
        fsutil::remove_dir_idempotent(&dir)?;
        fs::create_dir_all(&dir)?;
        self.mark_active(archive_id);
        debug!(session = %dir.display(), "session created");
        Ok(dir)
    }

    /// Creates a directory for a single-image extraction, numbered to
    /// avoid clashing with concurrent extractions of the same archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create_single(&self, archive_id: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        for n in 0.. {
            let name = format!("{archive_id}-single-{n}");
            let dir = self.root.join(&name);
            match fs::create_dir(&dir) {
                Ok(()) => {
                    self.mark_active(&name);
                    return Ok(dir);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }
        unreachable!("directory numbering is unbounded")
    }

    /// Marks a session inactive, making it eligible for sweeping.
    pub fn release(&self, session_name: &str) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(session_name);
        }
    }

    /// Removes inactive session directories older than the configured
    /// age. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session root exists but cannot be
    /// listed; individual removal failures are logged and skipped.
    pub fn sweep(&self) -> Result<usize> {
        if !self.root.exists() {
            return Ok(0);
        }
        let active = self
            .active
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default();
        let canonical_root = self.root.canonicalize()?;

        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if active.contains(&name) {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if !self.expired(&path) {
                continue;
            }
            // A symlinked entry could resolve elsewhere; only delete
            // directories that truly live under the root.
            match path.canonicalize() {
                Ok(real) if real.starts_with(&canonical_root) => {
                    if let Err(e) = fsutil::remove_dir_idempotent(&path) {
                        warn!(session = %path.display(), error = %e, "sweep failed for session");
                    } else {
                        removed += 1;
                    }
                }
                Ok(real) => {
                    warn!(session = %path.display(), resolved = %real.display(), "session resolves outside root, skipping");
                }
                Err(e) => {
                    warn!(session = %path.display(), error = %e, "cannot resolve session, skipping");
                }
            }
        }
        if removed > 0 {
            info!(removed, "stale sessions swept");
        }
        Ok(removed)
    }

    /// Removes every session directory, active ones included. Called on
    /// application shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the session root cannot be removed.
    pub fn shutdown(&self) -> Result<()> {
        fsutil::remove_dir_idempotent(&self.root)?;
        if let Ok(mut active) = self.active.lock() {
            active.clear();
        }
        Ok(())
    }

    fn mark_active(&self, name: &str) {
        if let Ok(mut active) = self.active.lock() {
            active.insert(name.to_string());
        }
    }

    fn expired(&self, path: &Path) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        SystemTime::now()
            .duration_since(modified)
            .map(|age| age > self.max_age)
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir, max_age: Duration) -> SessionManager {
        let config =
            VaultConfig::new(dir.path().to_path_buf()).with_session_max_age(max_age);
        SessionManager::new(&config)
    }

    #[test]
    fn test_create_recreates_fresh() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(60));

        let session = mgr.create("abc").unwrap();
        fs::write(session.join("stale.jpg"), b"old").unwrap();

        let again = mgr.create("abc").unwrap();
        assert_eq!(session, again);
        assert!(!again.join("stale.jpg").exists());
    }

    #[test]
    fn test_single_dirs_are_numbered() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(60));

        let first = mgr.create_single("abc").unwrap();
        let second = mgr.create_single("abc").unwrap();
        assert_ne!(first, second);
        assert!(first.file_name().unwrap().to_str().unwrap().starts_with("abc-single-"));
    }

    #[test]
    fn test_sweep_skips_active_and_fresh() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(0));

        let active = mgr.create("active").unwrap();
        let stale = mgr.create("stale").unwrap();
        mgr.release("stale");

        std::thread::sleep(Duration::from_millis(20));
        let removed = mgr.sweep().unwrap();
        assert_eq!(removed, 1);
        assert!(active.exists());
        assert!(!stale.exists());
    }

    #[test]
    fn test_sweep_respects_age() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(3600));

        mgr.create("recent").unwrap();
        mgr.release("recent");

        let removed = mgr.sweep().unwrap();
        assert_eq!(removed, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_sweep_skips_symlinked_session() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(0));
        fs::create_dir_all(mgr.root()).unwrap();

        let victim = TempDir::new().unwrap();
        fs::write(victim.path().join("precious.txt"), b"keep me").unwrap();
        std::os::unix::fs::symlink(victim.path(), mgr.root().join("evil")).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        mgr.sweep().unwrap();
        assert!(victim.path().join("precious.txt").exists());
    }

    #[test]
    fn test_shutdown_removes_everything() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(60));
        mgr.create("a").unwrap();
        mgr.create("b").unwrap();

        mgr.shutdown().unwrap();
        assert!(!mgr.root().exists());
    }

    #[test]
    fn test_sweep_on_missing_root_is_noop() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir, Duration::from_secs(60));
        assert_eq!(mgr.sweep().unwrap(), 0);
    }
}
