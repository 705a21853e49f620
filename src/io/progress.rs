//! Batch progress display for multi-job runs

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static JOB_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Coordinates progress display across the jobs of a batch
///
/// One bar tracks the outputs of the job currently running; status lines
/// print above it without tearing the bar.
pub struct ProgressManager {
    multi: MultiProgress,
    current: Option<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a progress manager with no active job
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current: None,
        }
    }

    /// Start tracking a job expected to produce `outputs` images
    pub fn start_job(&mut self, name: &str, outputs: usize) {
        let bar = ProgressBar::new(outputs as u64);
        bar.set_style(JOB_STYLE.clone());
        bar.set_message(name.to_owned());
        self.current = Some(self.multi.add(bar));
    }

    /// Record one completed output of the current job
    pub fn record_output(&self) {
        if let Some(ref bar) = self.current {
            bar.inc(1);
        }
    }

    /// Finish the current job's bar
    pub fn finish_job(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish();
        }
    }

    /// Print a status line without disturbing the active bar
    pub fn note(&self, text: &str) {
        let _ = self.multi.println(text);
    }

    /// Clear all progress displays
    pub fn finish(&self) {
        let _ = self.multi.clear();
    }
}
