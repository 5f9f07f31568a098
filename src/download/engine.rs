//! Batch orchestrator: catalog expansion, skip filtering and bounded fan-out.
//!
//! This module provides the `DownloadEngine` which dispatches one Tokio task
//! per pending [`TransferTask`] behind a semaphore, waits for every task to
//! settle, and collects the outcomes as values.
//!
//! # Example
//!
//! ```no_run
//! use model_fetcher_core::download::{DownloadEngine, HttpClient, NoopObserver, plan_batch};
//! use model_fetcher_core::CatalogEntry;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entries = vec![CatalogEntry {
//!     img: Some("/a.png".into()),
//!     thumb: None,
//!     model_url: Some("/m.glb".into()),
//! }];
//! let plan = plan_batch(&entries, Path::new("./downloaded_models"), "https://example.com").await;
//! let engine = DownloadEngine::new(10)?;
//! let summary = engine.run(plan, &HttpClient::new(), &NoopObserver).await;
//! println!("succeeded: {}, failed: {}", summary.succeeded(), summary.failed());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::constants::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use super::observer::ProgressObserver;
use super::task::{TransferOutcome, TransferTask, destination_exists};
use super::{DownloadError, HttpClient};
use crate::catalog::CatalogEntry;
use crate::report::FailureRecord;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The concurrency semaphore was closed while tasks were waiting.
    #[error("concurrency semaphore closed before the transfer could start")]
    SemaphoreClosed,
}

/// Candidate tasks split by the existence check.
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// Tasks whose destination was absent at planning time.
    pub pending: Vec<TransferTask>,
    /// Tasks whose destination already existed.
    pub skipped: Vec<TransferTask>,
}

impl BatchPlan {
    /// Number of candidate tasks (pending + skipped).
    #[must_use]
    pub fn total(&self) -> usize {
        self.pending.len() + self.skipped.len()
    }
}

/// Result of one batch run.
///
/// Successes are only counted; failures are kept in the order they settled.
#[derive(Debug, Default)]
pub struct BatchSummary {
    planned: usize,
    skipped: usize,
    succeeded: usize,
    failures: Vec<FailureRecord>,
}

impl BatchSummary {
    /// Number of candidate tasks, including skipped ones.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.planned
    }

    /// Number of tasks dropped because the destination existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of tasks that settled successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of tasks that settled as failures.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failed transfers in completion order.
    #[must_use]
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Consumes the summary, returning the failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<FailureRecord> {
        self.failures
    }
}

/// Expands entries into one task per present asset reference.
#[must_use]
pub fn expand_tasks(
    entries: &[CatalogEntry],
    output_root: &Path,
    asset_host: &str,
) -> Vec<TransferTask> {
    entries
        .iter()
        .flat_map(|entry| {
            entry
                .references()
                .map(|(kind, reference)| TransferTask::new(asset_host, output_root, kind, reference))
        })
        .collect()
}

/// Expands `entries` and partitions the tasks with the existence check.
///
/// The check runs once per task, here, against the filesystem as it is
/// before dispatch.
#[instrument(skip(entries, output_root), fields(entries = entries.len(), root = %output_root.display()))]
pub async fn plan_batch(entries: &[CatalogEntry], output_root: &Path, asset_host: &str) -> BatchPlan {
    let mut plan = BatchPlan::default();
    for task in expand_tasks(entries, output_root, asset_host) {
        if destination_exists(task.destination()).await {
            plan.skipped.push(task);
        } else {
            plan.pending.push(task);
        }
    }
    info!(
        pending = plan.pending.len(),
        skipped = plan.skipped.len(),
        "batch planned"
    );
    plan
}

/// Download engine for bounded concurrent transfers.
///
/// # Concurrency Model
///
/// - Each pending task runs in its own Tokio task inside a [`JoinSet`]
/// - A semaphore permit is held for the duration of each transfer (RAII)
/// - Outcomes are collected as tasks settle; nothing is shared between tasks
/// - A failed or panicking task never cancels its siblings
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
    /// Optional bound on each transfer.
    transfer_timeout: Option<Duration>,
}

impl DownloadEngine {
    /// Creates a new engine allowing `concurrency` simultaneous transfers.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use model_fetcher_core::download::DownloadEngine;
    ///
    /// let engine = DownloadEngine::new(10).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, "creating download engine");

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            transfer_timeout: None,
        })
    }

    /// Bounds every transfer; expiry settles the task as a failure.
    #[must_use]
    pub fn with_transfer_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Expands `entries` into tasks under `output_root` and runs the
    /// existence check. See [`plan_batch`].
    pub async fn plan(
        &self,
        entries: &[CatalogEntry],
        output_root: &Path,
        asset_host: &str,
    ) -> BatchPlan {
        plan_batch(entries, output_root, asset_host).await
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the per-transfer bound, if any.
    #[must_use]
    pub fn transfer_timeout(&self) -> Option<Duration> {
        self.transfer_timeout
    }

    /// Runs every pending task of `plan` and waits for all of them to settle.
    ///
    /// Skipped tasks are reported to `observer` first; each pending task is
    /// reported as it settles. No task is retried.
    #[instrument(skip_all, fields(pending = plan.pending.len(), skipped = plan.skipped.len()))]
    pub async fn run(
        &self,
        plan: BatchPlan,
        client: &HttpClient,
        observer: &dyn ProgressObserver,
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            planned: plan.total(),
            skipped: plan.skipped.len(),
            ..BatchSummary::default()
        };

        for task in &plan.skipped {
            debug!(destination = %task.destination().display(), "destination exists, skipping");
            observer.on_skipped(task);
        }

        let mut in_flight = JoinSet::new();
        let mut dispatched = HashMap::with_capacity(plan.pending.len());
        for task in plan.pending {
            let semaphore = Arc::clone(&self.semaphore);
            let client = client.clone();
            let timeout = self.transfer_timeout;
            let spawned = task.clone();

            let handle = in_flight.spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return TransferOutcome::Failure {
                        reason: EngineError::SemaphoreClosed.to_string(),
                        task: spawned,
                    };
                };
                settle(&client, spawned, timeout).await
            });
            dispatched.insert(handle.id(), task);
        }

        debug!(task_count = in_flight.len(), "waiting for transfers to settle");

        while let Some(joined) = in_flight.join_next_with_id().await {
            let Some(outcome) = settled_outcome(joined, &mut dispatched) else {
                continue;
            };
            match outcome {
                TransferOutcome::Success { task, bytes } => {
                    summary.succeeded += 1;
                    observer.on_success(&task, bytes);
                }
                TransferOutcome::Failure { task, reason } => {
                    observer.on_failure(&task, &reason);
                    summary.failures.push(FailureRecord::new(&task, reason));
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failures.len(),
            skipped = summary.skipped,
            "batch complete"
        );

        summary
    }
}

/// Maps one joined task back to an outcome.
///
/// A task that never settled (cancelled or aborted) still becomes a failure
/// for the task it was spawned with. Returns `None` only for an id that was
/// never dispatched.
fn settled_outcome(
    joined: Result<(Id, TransferOutcome), JoinError>,
    dispatched: &mut HashMap<Id, TransferTask>,
) -> Option<TransferOutcome> {
    match joined {
        Ok((id, outcome)) => {
            dispatched.remove(&id);
            Some(outcome)
        }
        Err(e) => {
            let task = dispatched.remove(&e.id());
            warn!(error = %e, "transfer task did not settle");
            task.map(|task| TransferOutcome::Failure {
                reason: format!("transfer task did not settle: {e}"),
                task,
            })
        }
    }
}

/// Executes one task and turns every failure mode into a value.
async fn settle(client: &HttpClient, task: TransferTask, timeout: Option<Duration>) -> TransferOutcome {
    let transfer = AssertUnwindSafe(transfer_with_timeout(client, &task, timeout)).catch_unwind();

    match transfer.await {
        Ok(Ok(bytes)) => TransferOutcome::Success { task, bytes },
        Ok(Err(e)) => {
            debug!(url = %task.source_url(), error = %e, "transfer failed");
            TransferOutcome::Failure {
                reason: e.to_string(),
                task,
            }
        }
        Err(_) => {
            warn!(url = %task.source_url(), "transfer panicked");
            TransferOutcome::Failure {
                reason: "transfer task panicked".to_string(),
                task,
            }
        }
    }
}

async fn transfer_with_timeout(
    client: &HttpClient,
    task: &TransferTask,
    timeout: Option<Duration>,
) -> Result<u64, DownloadError> {
    let transfer = client.transfer(task.source_url(), task.destination());
    let Some(limit) = timeout else {
        return transfer.await;
    };

    if let Ok(result) = tokio::time::timeout(limit, transfer).await {
        result
    } else {
        // Dropping the transfer future removed its partial file.
        Err(DownloadError::timeout(task.source_url(), limit))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::AssetKind;

    fn entry(img: Option<&str>, thumb: Option<&str>, model: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            img: img.map(String::from),
            thumb: thumb.map(String::from),
            model_url: model.map(String::from),
        }
    }

    #[test]
    fn test_engine_new_valid_concurrency() {
        assert_eq!(DownloadEngine::new(1).unwrap().concurrency(), 1);
        assert_eq!(DownloadEngine::new(10).unwrap().concurrency(), 10);
        assert_eq!(DownloadEngine::new(100).unwrap().concurrency(), 100);
    }

    #[test]
    fn test_engine_new_invalid_concurrency() {
        assert!(matches!(
            DownloadEngine::new(0),
            Err(EngineError::InvalidConcurrency { value: 0 })
        ));
        assert!(matches!(
            DownloadEngine::new(101),
            Err(EngineError::InvalidConcurrency { value: 101 })
        ));
    }

    #[test]
    fn test_engine_transfer_timeout_defaults_to_none() {
        let engine = DownloadEngine::new(4).unwrap();
        assert_eq!(engine.transfer_timeout(), None);

        let engine = engine.with_transfer_timeout(Some(Duration::from_secs(9)));
        assert_eq!(engine.transfer_timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_engine_error_display() {
        let msg = EngineError::InvalidConcurrency { value: 0 }.to_string();
        assert!(msg.contains("invalid concurrency"));
        assert!(msg.contains("100"));
        assert!(EngineError::SemaphoreClosed.to_string().contains("semaphore closed"));
    }

    #[test]
    fn test_expand_tasks_one_per_present_reference() {
        let entries = vec![
            entry(Some("/a.png"), Some("/t/a.png"), Some("/a.glb")),
            entry(Some("/b.png"), None, None),
            entry(None, None, None),
            entry(None, Some("/t/c.png"), Some("/c.glb")),
        ];

        let tasks = expand_tasks(&entries, Path::new("out"), "https://h");

        assert_eq!(tasks.len(), 6);
        assert_eq!(
            tasks.iter().filter(|t| t.kind() == AssetKind::Thumbnail).count(),
            2
        );
    }

    #[test]
    fn test_expand_tasks_concrete_scenario() {
        let entries = vec![entry(Some("/a.png"), None, Some("/m.glb"))];

        let tasks = expand_tasks(&entries, Path::new("root"), "https://h");

        let destinations: Vec<_> = tasks.iter().map(TransferTask::destination).collect();
        assert_eq!(
            destinations,
            vec![Path::new("root/img/a.png"), Path::new("root/models/m.glb")]
        );
        assert_eq!(tasks[0].source_url(), "https://h/a.png");
        assert_eq!(tasks[1].source_url(), "https://h/m.glb");
    }

    #[tokio::test]
    async fn test_plan_batch_skips_existing_destinations() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("img")).unwrap();
        std::fs::write(temp.path().join("img").join("a.png"), b"done").unwrap();
        let entries = vec![entry(Some("/a.png"), None, Some("/m.glb"))];

        let plan = plan_batch(&entries, temp.path(), "https://h").await;

        assert_eq!(plan.total(), 2);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].kind(), AssetKind::Image);
        assert_eq!(plan.pending.len(), 1);
        assert_eq!(plan.pending[0].kind(), AssetKind::Model);
    }

    #[tokio::test]
    async fn test_settled_outcome_turns_cancelled_task_into_failure() {
        let mut set = JoinSet::new();
        let handle = set.spawn(std::future::pending::<TransferOutcome>());
        let task = TransferTask::new("https://h", Path::new("root"), AssetKind::Model, "/m.glb");
        let mut dispatched = HashMap::from([(handle.id(), task.clone())]);
        handle.abort();

        let joined = set.join_next_with_id().await.unwrap();
        let outcome = settled_outcome(joined, &mut dispatched).unwrap();

        match outcome {
            TransferOutcome::Failure {
                task: failed,
                reason,
            } => {
                assert_eq!(failed, task);
                assert!(reason.starts_with("transfer task did not settle"), "got: {reason}");
                assert!(reason.contains("cancelled"), "got: {reason}");
            }
            TransferOutcome::Success { .. } => panic!("a cancelled task cannot succeed"),
        }
        assert!(dispatched.is_empty());
    }

    #[tokio::test]
    async fn test_settled_outcome_passes_settled_task_through() {
        let task = TransferTask::new("https://h", Path::new("root"), AssetKind::Image, "/a.png");
        let mut set = JoinSet::new();
        let settled = task.clone();
        let handle = set.spawn(async move {
            TransferOutcome::Success {
                task: settled,
                bytes: 3,
            }
        });
        let mut dispatched = HashMap::from([(handle.id(), task)]);

        let joined = set.join_next_with_id().await.unwrap();
        let outcome = settled_outcome(joined, &mut dispatched).unwrap();

        assert!(matches!(outcome, TransferOutcome::Success { bytes: 3, .. }));
        assert!(dispatched.is_empty());
    }

    #[test]
    fn test_batch_summary_default() {
        let summary = BatchSummary::default();
        assert_eq!(summary.planned(), 0);
        assert_eq!(summary.succeeded(), 0);
        assert_eq!(summary.failed(), 0);
        assert!(summary.into_failures().is_empty());
    }
}
