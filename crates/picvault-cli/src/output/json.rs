//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use picvault_core::db::{ArchiveRecord, HistoryEntry, ImageRecord, Settings};
use picvault_core::{LibraryUsage, LoadResult};
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_load_result(&self, result: &LoadResult) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct LoadOutput<'a> {
            archive_id: &'a str,
            display_name: &'a str,
            session_dir: String,
            image_count: usize,
            already_in_library: bool,
            evicted: &'a [String],
            images: &'a [ImageRecord],
        }

        let data = LoadOutput {
            archive_id: &result.archive_id,
            display_name: &result.display_name,
            session_dir: result.session_dir.display().to_string(),
            image_count: result.images.len(),
            already_in_library: result.already_in_library,
            evicted: &result.evicted,
            images: &result.images,
        };
        Self::output(&JsonOutput::success("load", data))
    }

    fn format_usage(&self, usage: &LibraryUsage, budget_bytes: u64) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct UsageOutput {
            total_bytes: u64,
            budget_bytes: u64,
            archive_count: usize,
            starred_count: usize,
        }

        let data = UsageOutput {
            total_bytes: usage.total_bytes,
            budget_bytes,
            archive_count: usage.archive_count,
            starred_count: usage.starred_count,
        };
        Self::output(&JsonOutput::success("usage", data))
    }

    fn format_archives(&self, archives: &[(ArchiveRecord, Vec<ImageRecord>)]) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ArchiveOutput<'a> {
            #[serde(flatten)]
            archive: &'a ArchiveRecord,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            images: &'a Vec<ImageRecord>,
        }

        let data: Vec<ArchiveOutput> = archives
            .iter()
            .map(|(archive, images)| ArchiveOutput { archive, images })
            .collect();
        Self::output(&JsonOutput::success("list", data))
    }

    fn format_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        Self::output(&JsonOutput::success("history", entries))
    }

    fn format_extracted(&self, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractOutput {
            path: String,
        }
        Self::output(&JsonOutput::success(
            "extract",
            ExtractOutput {
                path: path.display().to_string(),
            },
        ))
    }

    fn format_settings(&self, settings: &Settings) -> Result<()> {
        Self::output(&JsonOutput::success("config", settings))
    }

    fn format_removed(&self, operation: &str, removed: usize) -> Result<()> {
        #[derive(Serialize)]
        struct RemovedOutput {
            removed: usize,
        }
        Self::output(&JsonOutput::success(operation, RemovedOutput { removed }))
    }

    fn format_success(&self, _message: &str) {
        // Structured outputs carry their own status field.
    }

    fn format_warning(&self, message: &str) {
        let _ = writeln!(io::stderr(), "{message}");
    }
}
