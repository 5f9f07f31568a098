//! Progress signals emitted by the batch orchestrator.

use super::task::TransferTask;

/// Receives one signal per skipped, succeeded and failed task.
///
/// Signals are delivered from the orchestrating task as outcomes settle, so
/// implementations do not need to be thread-safe. Every method defaults to
/// a no-op.
pub trait ProgressObserver {
    /// Called once per task whose destination already existed.
    fn on_skipped(&self, task: &TransferTask) {
        let _ = task;
    }

    /// Called once per task that settled successfully.
    fn on_success(&self, task: &TransferTask, bytes: u64) {
        let _ = (task, bytes);
    }

    /// Called once per task that settled as a failure.
    fn on_failure(&self, task: &TransferTask, reason: &str) {
        let _ = (task, reason);
    }
}

/// Observer that ignores every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
