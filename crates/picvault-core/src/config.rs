//! Runtime configuration for the archive library core.

use std::path::PathBuf;
use std::time::Duration;

/// Filesystem and network configuration for a [`crate::Vault`].
///
/// These are deployment-level knobs chosen by the embedding application.
/// User-facing preferences (library budget, history bound, autoload
/// toggles) live in the persisted [`crate::db::Settings`] document instead,
/// so they survive restarts together with the rest of the metadata.
///
/// # Examples
///
/// ```
/// use picvault_core::VaultConfig;
/// use std::path::PathBuf;
///
/// let config = VaultConfig::new(PathBuf::from("/tmp/picvault"));
/// assert!(config.library_root.ends_with("library"));
/// ```
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Directory holding one subdirectory per persisted archive.
    pub library_root: PathBuf,

    /// Root for ephemeral per-load session directories.
    pub session_root: PathBuf,

    /// Path of the JSON metadata document.
    pub db_path: PathBuf,

    /// Directory receiving timestamped database backups.
    pub backup_dir: PathBuf,

    /// Backups retained per filename (oldest pruned first).
    pub backup_retention: usize,

    /// Connect timeout for archive downloads.
    pub connect_timeout: Duration,

    /// Overall per-request timeout for archive downloads.
    pub request_timeout: Duration,

    /// Maximum redirects followed during acquisition.
    pub max_redirects: usize,

    /// Age after which an inactive session directory is swept.
    pub session_max_age: Duration,
}

impl VaultConfig {
    /// Creates a configuration rooted at `data_dir` with default layout:
    /// `library/`, `sessions/`, `metadata.json` and `backups/` underneath.
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            library_root: data_dir.join("library"),
            session_root: data_dir.join("sessions"),
            db_path: data_dir.join("metadata.json"),
            backup_dir: data_dir.join("backups"),
            backup_retention: 10,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            max_redirects: 10,
            session_max_age: Duration::from_secs(30 * 60),
        }
    }

    /// Overrides the session sweep age threshold.
    #[must_use]
    pub fn with_session_max_age(mut self, age: Duration) -> Self {
        self.session_max_age = age;
        self
    }

    /// Overrides the overall download timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
