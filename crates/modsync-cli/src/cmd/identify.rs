//! Identify command
use crate::ui::ConsoleReporter;
use crate::ui::list::print_identification;
use anyhow::{Context, Result};
use modsync_core::identify;
use modsync_core::mirror::discover_cache_root;
use modsync_core::{Reporter, SyncConfig};

/// Map mirrored packages to the workshop items that ship them
pub fn identify(config: &SyncConfig) -> Result<()> {
    let reporter = ConsoleReporter::new(false);
    let cache_root = discover_cache_root(config)
        .context("Could not find the workshop cache to identify packages")?;

    let mirror = config.mirror_path();
    if !mirror.is_dir() {
        reporter.warning(&format!(
            "Mirror directory {} does not exist",
            config.mirror_dir.display()
        ));
        return Ok(());
    }

    reporter.section("Identifying Package Origins");
    let result = identify::identify(&cache_root, &mirror, &config.package_extension)
        .context("Failed to identify packages")?;
    print_identification(&result);

    let matched: usize = result.matches.values().map(Vec::len).sum();
    reporter.info(&format!(
        "{matched} identified, {} unidentified",
        result.unidentified.len()
    ));
    Ok(())
}
