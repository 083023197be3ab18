//! Shared types and the lock record format for modsync.
//!
//! Everything here is plain data: the engine in `modsync-core` produces and
//! consumes these types, and reporting tools only ever read the lock record.

pub mod lock;
pub mod types;

// Re-exports
pub use lock::{LockEntry, LockError, LockStore};
pub use types::*;
