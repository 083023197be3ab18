//! Check command: freshness of the lock record against the workshop
use crate::ui::ConsoleReporter;
use crate::ui::list::print_check;
use anyhow::{Context, Result};
use modsync_core::check::{CheckStatus, check_lock};
use modsync_core::metadata::WorkshopClient;
use modsync_core::{Reporter, SyncConfig};
use modsync_schema::LockStore;

/// Report which locked mods have newer workshop versions
pub async fn check(config: &SyncConfig) -> Result<()> {
    let reporter = ConsoleReporter::new(false);
    let lock_path = config.lock_path();
    let lock = LockStore::load(&lock_path).context("Failed to read lock record")?;

    if lock.is_empty() {
        reporter.info("No mods locked");
        return Ok(());
    }

    let written = std::fs::metadata(&lock_path)
        .and_then(|m| m.modified())
        .map_or_else(
            |_| "unknown".to_string(),
            |t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            },
        );
    reporter.section(&format!(
        "Checking {} locked mods (lock written {written})",
        lock.len()
    ));

    let client = WorkshopClient::new(config).context("Failed to create HTTP client")?;
    let rows = check_lock(&lock, &client, config.fetch_concurrency).await;
    print_check(&rows);

    let outdated = rows
        .iter()
        .filter(|r| matches!(r.status, CheckStatus::Outdated { .. }))
        .count();
    let unreachable = rows
        .iter()
        .filter(|r| matches!(r.status, CheckStatus::Unreachable { .. }))
        .count();

    println!();
    if outdated == 0 {
        reporter.success("All locked mods are up to date");
    } else {
        reporter.warning(&format!(
            "{outdated} mods have updates; run `modsync sync` to fetch them"
        ));
    }
    if unreachable > 0 {
        reporter.warning(&format!("{unreachable} mods could not be checked"));
    }
    Ok(())
}
