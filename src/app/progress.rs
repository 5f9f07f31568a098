//! Progress UI for batch runs: one log line per item plus a progress bar.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use model_fetcher_core::{ProgressObserver, TransferTask};
use tracing::{info, warn};

/// Terminal observer for the batch engine.
///
/// Log lines are emitted through `tracing` with the bar suspended so the two
/// never interleave on screen.
pub(crate) struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Creates the observer for `total` candidate tasks.
    ///
    /// When `show_bar` is false the bar is hidden and only log lines remain.
    pub(crate) fn new(total: usize, show_bar: bool) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_bar} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Clears the bar once the batch has settled.
    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for CliProgress {
    fn on_skipped(&self, task: &TransferTask) {
        self.bar.suspend(|| {
            info!(kind = %task.kind(), reference = task.reference(), "→ already present, skipped");
        });
        self.bar.inc(1);
    }

    fn on_success(&self, task: &TransferTask, bytes: u64) {
        self.bar.suspend(|| {
            info!(kind = %task.kind(), reference = task.reference(), bytes, "✓ downloaded");
        });
        self.bar.set_message(task.reference().to_string());
        self.bar.inc(1);
    }

    fn on_failure(&self, task: &TransferTask, reason: &str) {
        self.bar.suspend(|| {
            warn!(kind = %task.kind(), reference = task.reference(), error = reason, "✗ failed");
        });
        self.bar.inc(1);
    }
}
