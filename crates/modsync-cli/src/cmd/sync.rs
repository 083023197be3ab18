//! Sync command
use crate::ui::ConsoleReporter;
use crate::ui::list::print_plan;
use anyhow::{Context, Result};
use modsync_core::SyncConfig;
use modsync_core::downloader::{Login, SteamCmd};
use modsync_core::metadata::WorkshopClient;
use modsync_core::pipeline::{Pipeline, SyncOptions};

/// Resolve, plan, download and mirror every wanted mod
pub async fn sync(
    mut config: SyncConfig,
    options: SyncOptions,
    scratch_cache: bool,
    verbose: bool,
) -> Result<()> {
    config.scratch_cache |= scratch_cache;

    let reporter = ConsoleReporter::new(verbose);
    let metadata = WorkshopClient::new(&config).context("Failed to create HTTP client")?;
    let downloader = SteamCmd::new(&config, Login::from_env());

    let outcome = Pipeline::new(&config, &metadata, &downloader, &reporter)
        .run(options)
        .await
        .context("Sync failed")?;

    if options.dry_run {
        print_plan(&outcome.resolution, &outcome.plan);
    } else if let Some(report) = &outcome.report {
        tracing::debug!(
            "synced={} retained={} skipped={} removed={}",
            report.synced.len(),
            report.retained.len(),
            report.skipped.len(),
            report.removed.len()
        );
    }

    Ok(())
}
