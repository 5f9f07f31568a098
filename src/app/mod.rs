//! Binary-side orchestration: configuration, progress output and the run.

pub(crate) mod config;
pub(crate) mod progress;
pub(crate) mod runtime;
