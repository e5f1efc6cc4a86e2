//! Progress bar implementation for CLI operations.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use picvault_core::ProgressCallback;

/// CLI progress wrapper implementing `ProgressCallback`.
///
/// Shows a byte bar while downloading (a spinner when the server sends
/// no Content-Length) and an entry counter during extraction. Cleans up
/// on drop.
pub struct CliProgress {
    bar: ProgressBar,
    phase: Phase,
}

#[derive(PartialEq, Eq)]
enum Phase {
    Download,
    Extract,
}

impl CliProgress {
    /// Creates a progress display starting in the download phase.
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message.to_string());
        Self {
            bar,
            phase: Phase::Download,
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }

    fn switch_to_extract(&mut self, total: usize) {
        self.bar.finish_and_clear();
        self.bar = ProgressBar::new(total as u64);
        self.bar.set_style(entry_style());
        self.bar.set_message("Extracting");
        self.phase = Phase::Extract;
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_download(&mut self, transferred: u64, total: Option<u64>) {
        if let Some(total) = total {
            if self.bar.length() != Some(total) {
                self.bar.set_style(byte_style());
                self.bar.set_length(total);
            }
            self.bar.set_position(transferred);
        } else {
            self.bar.set_message(format!("Downloading ({transferred} bytes)"));
            self.bar.tick();
        }
    }

    fn on_entry(&mut self, processed: usize, total: usize) {
        if self.phase == Phase::Download {
            self.switch_to_extract(total);
        }
        self.bar.set_position(processed as u64);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn byte_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("Downloading [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

fn entry_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} images")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}
