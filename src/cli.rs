//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Mirror a remote model catalog to disk.
///
/// Fetches the catalog listing once, then downloads every referenced preview
/// image, thumbnail and model payload that is not already on disk. Failed
/// transfers are written to `failed_downloads.json` under the output
/// directory.
#[derive(Parser, Debug)]
#[command(name = "model-fetcher")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output root; img/, thumb/ and models/ are created beneath it [default: ./downloaded_models]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Catalog listing endpoint [default: https://studio.nsdt.cloud/api/models]
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Host that asset references are resolved against [default: https://studio.nsdt.cloud]
    #[arg(long)]
    pub asset_host: Option<String>,

    /// Maximum concurrent transfers (1-100) [default: 10]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Per-transfer timeout in seconds (0 disables, max 86400) [default: 0]
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(0..=86_400))]
    pub timeout: Option<u64>,

    /// Read defaults from this config file instead of the XDG location
    #[arg(long)]
    pub config: Option<PathBuf>,
}
