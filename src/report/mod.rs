//! Failure report written once at the end of a batch.
//!
//! The report is only written when at least one transfer failed; the absence
//! of the file signals a clean run. Shape:
//!
//! ```json
//! {
//!   "timestamp": "2026-01-01T00:00:00Z",
//!   "failures": [
//!     { "url": "...", "path": "...", "error": "download failed, status: 404", "type": "img" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::download::{AssetKind, TransferTask};

/// File name of the report under the output root.
pub const REPORT_FILE_NAME: &str = "failed_downloads.json";

/// One failed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Absolute source URL.
    pub url: String,
    /// Destination path the asset was meant for.
    pub path: PathBuf,
    /// Human-readable reason.
    pub error: String,
    /// Asset kind.
    #[serde(rename = "type")]
    pub kind: AssetKind,
}

impl FailureRecord {
    /// Builds the record for a task that settled as a failure.
    #[must_use]
    pub fn new(task: &TransferTask, reason: impl Into<String>) -> Self {
        Self {
            url: task.source_url().to_string(),
            path: task.destination().to_path_buf(),
            error: reason.into(),
            kind: task.kind(),
        }
    }
}

/// Timestamped list of failures, in the order they settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// When the report was produced.
    pub timestamp: DateTime<Utc>,
    /// Failed transfers.
    pub failures: Vec<FailureRecord>,
}

/// Errors writing the report. Never fatal to the run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization failed.
    #[error("could not serialize failure report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing or publishing the file failed.
    #[error("could not write failure report to {path}: {source}")]
    Io {
        /// Report path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes `failures` to `output_path` when non-empty.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing
/// to report. Otherwise the whole report is written to a temporary sibling
/// and renamed over `output_path`, replacing any report from an earlier run.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization or the write fails. Callers log
/// it; downloads already on disk are unaffected.
#[instrument(skip(failures), fields(count = failures.len(), path = %output_path.display()))]
pub async fn record(
    failures: &[FailureRecord],
    output_path: &Path,
) -> Result<Option<FailureReport>, ReportError> {
    if failures.is_empty() {
        debug!("no failures, skipping report");
        return Ok(None);
    }

    let report = FailureReport {
        timestamp: Utc::now(),
        failures: failures.to_vec(),
    };
    let json = serde_json::to_vec_pretty(&report)?;

    let staging = output_path.with_extension("json.tmp");
    let io_error = |source: std::io::Error| ReportError::Io {
        path: output_path.to_path_buf(),
        source,
    };
    if let Err(e) = tokio::fs::write(&staging, &json).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(io_error(e));
    }
    if let Err(e) = tokio::fs::rename(&staging, output_path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(io_error(e));
    }

    info!("failure report written");
    Ok(Some(report))
}
