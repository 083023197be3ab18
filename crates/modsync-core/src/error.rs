//! Fatal errors for a sync run.
//!
//! Per-mod problems (an unreachable item page, a mod missing from the
//! workshop cache) are reported as warnings and never surface here.

use modsync_schema::LockError;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Lock record error: {0}")]
    Lock(#[from] LockError),

    #[error("Failed to {operation} '{}'", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{}'", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not find the workshop download directory (searched: {searched})")]
    CacheRootNotFound { searched: String },

    #[error("Downloader '{program}' not found on PATH")]
    DownloaderNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to launch downloader '{program}'")]
    DownloaderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloader exited with {status}")]
    DownloaderFailed { status: ExitStatus },

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl SyncError {
    /// Wrap an I/O failure with the operation and path it happened on.
    pub fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}
