//! Terminal progress display using indicatif.
//!
//! A single spinner shows the running counters of a scan and is refreshed
//! after every scan step. It draws to stderr, so stdout stays clean for
//! reports.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::duplicates::ScanStats;

/// Spinner with scan counters.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a spinner; `quiet` disables all drawing.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message("Starting scan...");
        Self { bar: Some(bar) }
    }

    /// Create a reporter that draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self::new(true)
    }

    /// Whether anything is drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Refresh the counters.
    pub fn update(&self, stats: &ScanStats, pending: usize) {
        if let Some(bar) = &self.bar {
            bar.set_message(status_line(stats, pending));
        }
    }

    /// Print a line above the spinner.
    pub fn println(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.println(message);
        }
    }

    /// Stop the spinner, leaving `message` in its place.
    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Stop the spinner and erase it.
    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
    }
}

fn status_line(stats: &ScanStats, pending: usize) -> String {
    format!(
        "{} folders, {} files ({}), {} folders queued",
        stats.folders_discovered,
        stats.files_scanned,
        stats.bytes_display(),
        pending
    )
}
