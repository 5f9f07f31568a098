//! Model Fetcher Core Library
//!
//! This library mirrors a remote model catalog to disk: one listing call
//! discovers the entries, and every referenced preview image, thumbnail and
//! model payload is streamed into a local directory layout. Files already
//! present are skipped, and every failed transfer is recorded in a single
//! JSON report for offline follow-up.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Listing endpoint client and response decoding
//! - [`download`] - Transfer tasks, the HTTP transfer unit and the batch engine
//! - [`layout`] - Output root and per-kind subdirectories
//! - [`report`] - Failure report written once per batch

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod download;
pub mod layout;
pub mod report;
mod user_agent;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogEntry, CatalogError, parse_catalog};
pub use download::{
    AssetKind, BatchPlan, BatchSummary, DEFAULT_CONCURRENCY, DownloadEngine, DownloadError,
    EngineError, HttpClient, NoopObserver, ProgressObserver, TransferOutcome, TransferTask,
    plan_batch,
};
pub use layout::{DEFAULT_OUTPUT_DIR, LayoutError, OutputLayout};
pub use report::{FailureRecord, FailureReport, REPORT_FILE_NAME, ReportError, record};
