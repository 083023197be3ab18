//! Read-only freshness check of the lock record.
//!
//! Fetches every locked mod's item page through a bounded pool and compares
//! update tokens. Nothing is written and nothing is downloaded.

use crate::metadata::{FetchOutcome, MetadataSource};
use futures::stream::{self, StreamExt};
use modsync_schema::{LockStore, ModId};

/// Freshness of one locked mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    UpToDate,
    /// The remote token differs from the locked one.
    Outdated { remote: String },
    /// Locked before freshness tracking; there is nothing to compare.
    Untracked,
    Unreachable { reason: String },
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::Outdated { .. } => "outdated",
            Self::Untracked => "untracked",
            Self::Unreachable { .. } => "unreachable",
        }
    }
}

/// One line of the check report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRow {
    pub id: ModId,
    pub name: String,
    pub locked: String,
    pub status: CheckStatus,
}

/// Check every entry of `lock` against `source`, at most `concurrency`
/// fetches in flight. Rows come back sorted by id.
pub async fn check_lock<S>(lock: &LockStore, source: &S, concurrency: usize) -> Vec<CheckRow>
where
    S: MetadataSource + ?Sized,
{
    let mut rows: Vec<CheckRow> = stream::iter(lock.mods.iter())
        .map(|(id, entry)| async move {
            let outcome = source.fetch(id).await;
            let status = match outcome {
                FetchOutcome::Unreachable { reason, .. } => CheckStatus::Unreachable { reason },
                FetchOutcome::Fetched(_) if !entry.has_known_update() => CheckStatus::Untracked,
                FetchOutcome::Fetched(meta)
                    if meta.has_known_update() && meta.updated != entry.updated =>
                {
                    CheckStatus::Outdated {
                        remote: meta.updated,
                    }
                }
                FetchOutcome::Fetched(_) => CheckStatus::UpToDate,
            };
            CheckRow {
                id: id.clone(),
                name: entry.name.clone(),
                locked: entry.updated.clone(),
                status,
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    rows.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!("Checked {} locked mods", rows.len());
    rows
}
