//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for a snapshot comparison
#[derive(Debug)]
pub struct ProgressReporter {
    pub load_pb: Option<ProgressBar>,
    pub diff_pb: Option<ProgressBar>,
    pub report_pb: Option<ProgressBar>,
    show_progress: bool,
}

impl ProgressReporter {
    /// Create progress reporter for a comparison run
    pub fn new_for_compare() -> Self {
        Self {
            load_pb: Some(create_spinner("Loading snapshots...")),
            diff_pb: None,
            report_pb: None,
            show_progress: true,
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            load_pb: None,
            diff_pb: None,
            report_pb: None,
            show_progress: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.show_progress
    }

    /// Finish loading and start the diff spinner
    pub fn finish_load(&mut self, message: &str) {
        if let Some(pb) = self.load_pb.take() {
            pb.finish_with_message(message.to_string());
        }
        if self.show_progress && self.diff_pb.is_none() {
            self.diff_pb = Some(create_spinner("Identifying new entries..."));
        }
    }

    pub fn finish_diff(&mut self, message: &str) {
        if let Some(pb) = self.diff_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    /// Update report progress message without finishing
    pub fn update_report(&mut self, message: &str) {
        if self.show_progress && self.report_pb.is_none() {
            self.report_pb = Some(create_spinner(message));
        } else if let Some(pb) = &self.report_pb {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_report(&mut self, message: &str) {
        if let Some(pb) = self.report_pb.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        for pb in [self.load_pb.take(), self.diff_pb.take(), self.report_pb.take()]
            .into_iter()
            .flatten()
        {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a byte progress bar for downloads; a spinner when the size is unknown
pub fn create_file_progress(total: Option<u64>, message: &str) -> ProgressBar {
    let pb = match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes:>7}/{total_bytes:7} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb
        }
    };
    pb.set_message(message.to_string());
    pb
}
