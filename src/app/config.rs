//! Configuration lifecycle: load file config, merge CLI, resolve defaults.

use std::path::PathBuf;
use std::time::Duration;

use model_fetcher_core::DEFAULT_CONCURRENCY;
use model_fetcher_core::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use model_fetcher_core::layout::DEFAULT_OUTPUT_DIR;

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Upstream listing endpoint.
pub(crate) const DEFAULT_CATALOG_URL: &str = "https://studio.nsdt.cloud/api/models";

/// Host that catalog references are relative to.
pub(crate) const DEFAULT_ASSET_HOST: &str = "https://studio.nsdt.cloud";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedConfig {
    pub(crate) output_dir: PathBuf,
    pub(crate) catalog_url: String,
    pub(crate) asset_host: String,
    pub(crate) concurrency: usize,
    pub(crate) transfer_timeout: Option<Duration>,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) read_timeout_secs: u64,
}

/// Merges CLI arguments over file config over built-in defaults.
pub(crate) fn resolve_config(args: &Args, file: Option<&FileConfig>) -> ResolvedConfig {
    let file = file.cloned().unwrap_or_default();

    let timeout_secs = args.timeout.or(file.transfer_timeout_secs).unwrap_or(0);

    ResolvedConfig {
        output_dir: args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        catalog_url: args
            .catalog_url
            .clone()
            .or(file.catalog_url)
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
        asset_host: args
            .asset_host
            .clone()
            .or(file.asset_host)
            .unwrap_or_else(|| DEFAULT_ASSET_HOST.to_string()),
        concurrency: args
            .concurrency
            .or(file.concurrency)
            .map_or(DEFAULT_CONCURRENCY, usize::from),
        transfer_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
    }
}

/// Log filter directive.
///
/// Priority: quiet flag > verbose flag > file verbosity > default (info).
/// `RUST_LOG` still wins over all of these at subscriber setup.
pub(crate) fn log_level(args: &Args, file: Option<&FileConfig>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => {}
        1 => return "debug",
        _ => return "trace",
    }
    match file.and_then(|f| f.verbosity) {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose | VerbositySetting::Debug) => "debug",
        Some(VerbositySetting::Default) | None => "info",
    }
}
