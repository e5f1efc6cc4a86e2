//! Error conversion utilities for CLI.
//!
//! Converts picvault-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use picvault_core::VaultError;

/// Converts `VaultError` to a user-friendly anyhow error with context
pub fn convert_vault_error(err: VaultError, source: &str) -> anyhow::Error {
    match err {
        VaultError::PathTraversal { entry } => {
            anyhow!(
                "Security violation: '{source}' attempted path traversal with '{entry}'\n\
                 HINT: This archive may be malicious. Do not load it from untrusted sources."
            )
        }
        VaultError::UnsupportedFormat { path } => {
            anyhow!(
                "Archive format not supported: {}\n\
                 HINT: Supported formats: zip, cbz, rar, cbr, 7z, cb7",
                path.display()
            )
        }
        VaultError::Network { url, reason } => {
            anyhow!(
                "Download failed for {url}: {reason}\n\
                 HINT: Check the URL and your network connection, then retry."
            )
        }
        VaultError::Timeout { url, seconds } => {
            anyhow!(
                "Download timed out for {url} after {seconds}s\n\
                 HINT: The server may be slow; retrying often helps."
            )
        }
        VaultError::ArchiveMissing { name, .. } => {
            anyhow!(
                "The archive file for '{name}' is gone and its original source is unavailable\n\
                 HINT: Re-load the archive from a URL or local file to restore it."
            )
        }
        VaultError::Extraction { archive, reason } => {
            anyhow!(
                "Failed to extract '{archive}': {reason}\n\
                 HINT: The archive may be corrupted or password-protected."
            )
        }
        VaultError::ArchiveNotFound { archive_id } => {
            anyhow!("No archive with id '{archive_id}'. Run `picvault list` to see known ids.")
        }
        VaultError::ImageNotFound { image_id } => {
            anyhow!(
                "No image with id '{image_id}'. Run `picvault list --images` to see known ids."
            )
        }
        other => anyhow::Error::from(other).context(format!("Error processing '{source}'")),
    }
}

/// Adds source context to a core result.
pub fn add_source_context<T>(
    result: Result<T, VaultError>,
    source: &str,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_vault_error(e, source))
}
