//! modsync - workshop mod mirror
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Keeps a project's `addons/` directory in sync with the Steam Workshop
//! mods listed in `mod_sources.txt`.
//!
//! # Project Layout
//!
//! ```text
//! <project>/
//! ├── mod_sources.txt      # Wanted mods, one per line
//! ├── mods.lock            # What is mirrored right now
//! ├── modsync.toml         # Optional overrides
//! ├── addons/              # Mirrored .pbo files
//! ├── keys/                # Purged on every sync
//! └── .hemtt/launch.toml   # workshop = [...] is kept in sync
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "modsync")]
#[command(author, version, about = "modsync - Steam Workshop mod mirror")]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, short = 'C', global = true, env = "MODSYNC_PROJECT")]
    pub project: Option<PathBuf>,

    /// Workshop application id
    #[arg(long, global = true, env = "MODSYNC_APP_ID")]
    pub app_id: Option<String>,

    /// Show per-mod progress and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve, download and mirror every wanted mod
    Sync {
        /// Resolve and plan, then stop without downloading or mirroring
        #[arg(long)]
        dry_run: bool,
        /// Do not run the downloader; mirror whatever is already cached
        #[arg(long)]
        skip_download: bool,
        /// Use an empty scratch cache when no workshop cache exists (CI)
        #[arg(long, env = "MODSYNC_SCRATCH_CACHE")]
        scratch_cache: bool,
    },
    /// Compare the lock record against the workshop without changing anything
    Check,
    /// Show which workshop item each mirrored package came from
    Identify,
    /// Print the resolved dependency closure
    Resolve,
}
