//! modsync CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use modsync_cli::cmd;
use modsync_cli::{Cli, Commands};
use modsync_core::pipeline::SyncOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("modsync_core=debug,modsync_cli=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cmd::load_config(cli.project.as_deref(), cli.app_id.as_deref())?;

    match cli.command {
        Commands::Sync {
            dry_run,
            skip_download,
            scratch_cache,
        } => {
            let options = SyncOptions {
                dry_run,
                skip_download,
            };
            cmd::sync::sync(config, options, scratch_cache, cli.verbose).await
        }
        Commands::Check => cmd::check::check(&config).await,
        Commands::Identify => cmd::identify::identify(&config),
        Commands::Resolve => cmd::resolve::resolve(&config, cli.verbose).await,
    }
}
