//! Output formatter trait for CLI results.

use anyhow::Result;
use picvault_core::db::{ArchiveRecord, HistoryEntry, ImageRecord, Settings};
use picvault_core::{LibraryUsage, LoadResult};
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of a completed load
    fn format_load_result(&self, result: &LoadResult) -> Result<()>;

    /// Format library occupancy against the budget
    fn format_usage(&self, usage: &LibraryUsage, budget_bytes: u64) -> Result<()>;

    /// Format the archive listing, optionally with per-archive images
    fn format_archives(&self, archives: &[(ArchiveRecord, Vec<ImageRecord>)]) -> Result<()>;

    /// Format the load history
    fn format_history(&self, entries: &[HistoryEntry]) -> Result<()>;

    /// Format the path of a single extracted image
    fn format_extracted(&self, path: &Path) -> Result<()>;

    /// Format persisted settings
    fn format_settings(&self, settings: &Settings) -> Result<()>;

    /// Format a count of removed items (clear, sweep)
    fn format_removed(&self, operation: &str, removed: usize) -> Result<()>;

    /// Format success message
    fn format_success(&self, message: &str);

    /// Format warning message
    #[allow(dead_code)]
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    #[allow(dead_code)]
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}
