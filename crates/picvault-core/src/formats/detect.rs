//! Archive format detection.

use std::path::Path;

use crate::error::{Result, VaultError};

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// ZIP archive.
    Zip,
    /// RAR archive.
    Rar,
    /// 7z archive.
    SevenZ,
}

impl ArchiveKind {
    /// Canonical lowercase extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Rar => "rar",
            Self::SevenZ => "7z",
        }
    }
}

/// Detects the archive format from a file path.
///
/// Classification is purely by extension, case-insensitive. Anything that
/// is not zip/rar/7z fails the whole ingestion immediately.
///
/// # Errors
///
/// Returns [`VaultError::UnsupportedFormat`] for unknown extensions.
pub fn detect_format(path: &Path) -> Result<ArchiveKind> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| VaultError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    match extension.to_ascii_lowercase().as_str() {
        "zip" | "cbz" => Ok(ArchiveKind::Zip),
        "rar" | "cbr" => Ok(ArchiveKind::Rar),
        "7z" | "cb7" => Ok(ArchiveKind::SevenZ),
        _ => Err(VaultError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
