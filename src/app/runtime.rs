//! One mirror run: bootstrap, catalog fetch, batch, summary, report.

use anyhow::{Context, Result};
use model_fetcher_core::{AssetKind, CatalogClient, DownloadEngine, HttpClient, OutputLayout, record};
use tracing::{error, info, warn};

use super::config::ResolvedConfig;
use super::progress::CliProgress;

/// Runs the whole pipeline.
///
/// Only directory bootstrap and the catalog fetch are fatal. Per-item
/// failures land in the report, and a report write failure is logged.
pub(crate) async fn run(config: &ResolvedConfig, show_progress: bool) -> Result<()> {
    let layout = OutputLayout::new(&config.output_dir);
    layout.ensure_dirs().await?;

    let engine = DownloadEngine::new(config.concurrency)?
        .with_transfer_timeout(config.transfer_timeout);
    let client =
        HttpClient::new_with_timeouts(config.connect_timeout_secs, config.read_timeout_secs);

    let entries = CatalogClient::new(&client)
        .fetch(&config.catalog_url)
        .await
        .context("Could not load the model catalog; nothing was downloaded")?;

    let plan = engine.plan(&entries, layout.root(), &config.asset_host).await;
    info!(
        entries = entries.len(),
        files = plan.total(),
        pending = plan.pending.len(),
        "catalog loaded, starting downloads"
    );

    let progress = CliProgress::new(plan.total(), show_progress);
    let summary = engine.run(plan, &client, &progress).await;
    progress.finish();

    info!(
        planned = summary.planned(),
        skipped = summary.skipped(),
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        root = %layout.root().display(),
        "run complete"
    );
    for kind in AssetKind::ALL {
        info!(kind = %kind, dir = %layout.dir_for(kind).display(), "output directory");
    }

    let report_path = layout.report_path();
    match record(&summary.into_failures(), &report_path).await {
        Ok(Some(report)) => warn!(
            failed = report.failures.len(),
            report = %report_path.display(),
            "some downloads failed; see the report"
        ),
        Ok(None) => info!("all downloads succeeded, no failure report written"),
        Err(e) => error!(error = %e, "could not write the failure report"),
    }

    Ok(())
}
