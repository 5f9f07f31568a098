//! Concurrent transfer engine.
//!
//! This module turns catalog entries into transfer tasks, filters out the
//! ones already on disk, and streams the rest to disk under a concurrency
//! bound.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large model payloads)
//! - Publish-by-rename from a per-transfer partial file: a destination only
//!   ever holds a complete file
//! - Per-task failure capture; one failure never aborts the batch
//! - Configurable concurrency limit and optional per-transfer timeout
//!
//! # Example
//!
//! ```no_run
//! use model_fetcher_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client
//!     .transfer("https://example.com/a.png", Path::new("./downloaded_models/img/a.png"))
//!     .await?;
//! println!("Downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod observer;
mod task;

pub use client::HttpClient;
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY,
    READ_TIMEOUT_SECS,
};
pub use engine::{BatchPlan, BatchSummary, DownloadEngine, EngineError, expand_tasks, plan_batch};
pub use error::DownloadError;
pub use observer::{NoopObserver, ProgressObserver};
pub use task::{AssetKind, TransferOutcome, TransferTask, destination_exists, resolve_destination};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
