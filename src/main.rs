//! CLI entry point for the model-fetcher tool.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod app;
mod app_config;
mod cli;

use app::config::{log_level, resolve_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // A broken config file is reported after the subscriber is up
    let file_config = app_config::load_file_config(args.config.as_deref());

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config file > default (info)
    let default_level = log_level(&args, file_config.as_ref().ok().and_then(Option::as_ref));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file_config = file_config?;
    let config = resolve_config(&args, file_config.as_ref());
    debug!(?args, ?config, "configuration resolved");
    info!(catalog = %config.catalog_url, "model-fetcher starting");

    let show_progress = !args.quiet && io::stderr().is_terminal();
    app::runtime::run(&config, show_progress).await?;

    Ok(())
}
