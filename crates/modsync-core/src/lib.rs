pub mod check;
pub mod config;
pub mod downloader;
pub mod error;
pub mod identify;
pub mod launch;
pub mod metadata;
pub mod mirror;
pub mod pipeline;
pub mod planner;
pub mod resolver;
pub mod sources;

pub mod reporter;

pub use config::SyncConfig;
pub use error::SyncError;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for item page requests
pub const USER_AGENT: &str = concat!("modsync-core/", env!("CARGO_PKG_VERSION"));
