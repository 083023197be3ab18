pub mod check;
pub mod identify;
pub mod resolve;
pub mod sync;

use anyhow::{Context, Result};
use modsync_core::SyncConfig;
use std::path::Path;

/// Build the run configuration: defaults, then `modsync.toml`, then flags.
pub fn load_config(project: Option<&Path>, app_id: Option<&str>) -> Result<SyncConfig> {
    let root = match project {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let mut config = SyncConfig::load(&root).context("Failed to load configuration")?;
    if let Some(app_id) = app_id {
        config.app_id = app_id.to_string();
    }
    Ok(config)
}
