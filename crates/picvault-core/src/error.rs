//! Error types for library, extraction and acquisition operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `VaultError`.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Errors that can occur in the archive library core.
#[derive(Error, Debug)]
pub enum VaultError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An archive entry would resolve outside its extraction root.
    #[error("path traversal detected in entry: {entry}")]
    PathTraversal {
        /// The offending entry name as stored in the archive.
        entry: String,
    },

    /// Archive extension is not one of zip/rar/7z.
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: PathBuf,
    },

    /// The extractor could not open or parse the archive after exhausting
    /// all fallback strategies.
    #[error("failed to extract '{archive}': {reason}")]
    Extraction {
        /// Display name of the archive.
        archive: String,
        /// Combined underlying causes.
        reason: String,
    },

    /// Network acquisition failed.
    #[error("download failed for {url}: {reason}")]
    Network {
        /// Source URL.
        url: String,
        /// Underlying cause.
        reason: String,
    },

    /// Network acquisition exceeded its time budget.
    #[error("download timed out for {url} after {seconds}s")]
    Timeout {
        /// Source URL.
        url: String,
        /// Configured time budget.
        seconds: u64,
    },

    /// Filesystem permission or sandbox boundary violation.
    #[error("access denied: {path}")]
    AccessDenied {
        /// The path that could not be read or written.
        path: PathBuf,
    },

    /// A recorded archive's backing file is gone and no reachable source
    /// exists to recover it.
    #[error("archive file for '{name}' is missing and its source is unavailable")]
    ArchiveMissing {
        /// Archive identifier.
        archive_id: String,
        /// Human-readable archive name.
        name: String,
    },

    /// No archive row with the given id.
    #[error("unknown archive: {archive_id}")]
    ArchiveNotFound {
        /// Requested archive identifier.
        archive_id: String,
    },

    /// No image row with the given id.
    #[error("unknown image: {image_id}")]
    ImageNotFound {
        /// Requested image identifier.
        image_id: String,
    },

    /// The metadata database could not be read or written.
    #[error("metadata database error: {0}")]
    Database(#[from] serde_json::Error),
}

impl VaultError {
    /// Returns `true` if this error is fatal only for a single entry and a
    /// bulk extraction may continue past it.
    ///
    /// # Examples
    ///
    /// ```
    /// use picvault_core::VaultError;
    ///
    /// let err = VaultError::PathTraversal { entry: "../etc/passwd".into() };
    /// assert!(err.is_entry_local());
    ///
    /// let err = VaultError::Extraction {
    ///     archive: "set.zip".into(),
    ///     reason: "bad signature".into(),
    /// };
    /// assert!(!err.is_entry_local());
    /// ```
    #[must_use]
    pub const fn is_entry_local(&self) -> bool {
        matches!(self, Self::PathTraversal { .. } | Self::Io(_))
    }

    /// Returns `true` if this error indicates a security violation rather
    /// than an environmental failure.
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathTraversal { .. } | Self::AccessDenied { .. })
    }

    /// Returns `true` if retrying the operation could plausibly succeed
    /// (transient network or I/O conditions).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

/// Converts a reqwest error into the appropriate taxonomy entry.
///
/// Timeouts get their own variant so callers can distinguish "server slow"
/// from "server broken".
pub(crate) fn map_http_error(err: &reqwest::Error, url: &str, timeout_secs: u64) -> VaultError {
    if err.is_timeout() {
        VaultError::Timeout {
            url: url.to_string(),
            seconds: timeout_secs,
        }
    } else {
        VaultError::Network {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
