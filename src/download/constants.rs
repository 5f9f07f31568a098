//! Constants for the download module (timeouts, concurrency bounds).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large model payloads).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous transfers.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Suffix appended to the hidden temporary file a transfer streams into.
pub const PARTIAL_SUFFIX: &str = ".part";
