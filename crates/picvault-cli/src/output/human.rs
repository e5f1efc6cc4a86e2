//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use picvault_core::db::{ArchiveRecord, HistoryEntry, ImageRecord, Settings};
use picvault_core::{LibraryUsage, LoadResult};
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn star_marker(&self, starred: bool) -> String {
        if !starred {
            return " ".to_string();
        }
        if self.use_colors {
            style("★").yellow().to_string()
        } else {
            "*".to_string()
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_load_result(&self, result: &LoadResult) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let headline = if result.already_in_library {
            format!("Loaded '{}' from library", result.display_name)
        } else {
            format!("Loaded '{}'", result.display_name)
        };
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {headline}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(&headline);
        }

        let _ = self
            .term
            .write_line(&format!("  Images: {}", result.images.len()));
        let _ = self
            .term
            .write_line(&format!("  Session: {}", result.session_dir.display()));

        if !result.evicted.is_empty() {
            let _ = self.term.write_line(&format!(
                "  Evicted {} archive(s) to stay within the budget",
                result.evicted.len()
            ));
        }
        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Archive id: {}", result.archive_id));
        }
        Ok(())
    }

    fn format_usage(&self, usage: &LibraryUsage, budget_bytes: u64) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        let _ = self.term.write_line(&format!(
            "Library usage: {} of {}",
            Self::format_size(usage.total_bytes),
            Self::format_size(budget_bytes)
        ));
        let _ = self.term.write_line(&format!(
            "  Archives: {} ({} starred, exempt from the budget)",
            usage.archive_count, usage.starred_count
        ));
        Ok(())
    }

    fn format_archives(&self, archives: &[(ArchiveRecord, Vec<ImageRecord>)]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if archives.is_empty() {
            let _ = self.term.write_line("Library is empty");
            return Ok(());
        }

        for (archive, images) in archives {
            let _ = self.term.write_line(&format!(
                "{} {}  {:>10}  {} images  {}",
                self.star_marker(archive.starred),
                archive.id,
                Self::format_size(archive.archive_size),
                archive.extracted_images.len(),
                archive.display_name
            ));
            for image in images {
                let _ = self.term.write_line(&format!(
                    "    {} {}  {:>10}  {}",
                    self.star_marker(image.starred),
                    image.id,
                    Self::format_size(image.size),
                    image.name
                ));
            }
        }
        Ok(())
    }

    fn format_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if entries.is_empty() {
            let _ = self.term.write_line("No history");
            return Ok(());
        }
        for entry in entries {
            let _ = self.term.write_line(&format!(
                "{} {}  {}  {} images  {}",
                self.star_marker(entry.starred),
                entry.id,
                entry.last_accessed.format("%Y-%m-%d %H:%M"),
                entry.image_count,
                entry.name
            ));
            if self.verbose {
                let _ = self.term.write_line(&format!("    {}", entry.url));
            }
        }
        Ok(())
    }

    fn format_extracted(&self, path: &Path) -> Result<()> {
        // The path is the command's output proper; print it even in
        // quiet mode so scripts can capture it.
        let _ = self.term.write_line(&format!("{}", path.display()));
        Ok(())
    }

    fn format_settings(&self, settings: &Settings) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        let _ = self.term.write_line(&format!(
            "library-size-gb:    {}",
            settings.library_size_gb
        ));
        let _ = self.term.write_line(&format!(
            "max-history-items:  {}",
            settings.max_history_items
        ));
        Ok(())
    }

    fn format_removed(&self, operation: &str, removed: usize) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.format_success(&format!("{operation}: {removed} removed"));
        Ok(())
    }

    fn format_success(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(HumanFormatter::format_size(0), "0 B");
        assert_eq!(HumanFormatter::format_size(1024), "1.0 KB");
        assert_eq!(HumanFormatter::format_size(1536 * 1024), "1.5 MB");
        assert_eq!(HumanFormatter::format_size(2 * 1024 * 1024 * 1024), "2.0 GB");
    }
}
