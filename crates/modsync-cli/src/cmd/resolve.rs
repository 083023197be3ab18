//! Resolve command: print the dependency closure without syncing
use crate::ui::ConsoleReporter;
use crate::ui::list::print_resolution;
use anyhow::{Context, Result};
use modsync_core::metadata::WorkshopClient;
use modsync_core::resolver::Resolver;
use modsync_core::sources::SourceList;
use modsync_core::{Reporter, SyncConfig};
use modsync_schema::LockStore;
use std::time::Instant;

/// Print every mod the source list resolves to
pub async fn resolve(config: &SyncConfig, verbose: bool) -> Result<()> {
    let start = Instant::now();
    let reporter = ConsoleReporter::new(verbose);

    let sources = SourceList::load(&config.sources_path()).context("Failed to read source list")?;
    if sources.is_empty() {
        reporter.info(&format!(
            "No external mods defined in {}",
            config.sources_file.display()
        ));
        return Ok(());
    }

    let lock = LockStore::load(&config.lock_path()).context("Failed to read lock record")?;
    let client = WorkshopClient::new(config).context("Failed to create HTTP client")?;
    let resolution = Resolver::new(&client, &reporter)
        .with_concurrency(config.fetch_concurrency)
        .with_locked(&lock)
        .resolve(&sources)
        .await;

    print_resolution(&resolution);
    reporter.summary(
        resolution.resolved.len(),
        "resolved",
        start.elapsed().as_secs_f64(),
    );
    Ok(())
}
