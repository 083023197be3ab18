//! Download planning.
//!
//! Diffs resolved metadata against the previous lock record to find the
//! smallest set of mods the bulk downloader has to fetch. A mod is only
//! downloaded again when its remote update token changed or its mirrored
//! files are gone.

use crate::resolver::ResolvedSet;
use modsync_schema::{LockEntry, LockStore, ModId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Why a resolved mod does or does not need downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Never synced before.
    Missing,
    /// Locked, but at least one recorded file is gone (or none were recorded).
    FilesMissing,
    /// The remote update token differs from the locked one.
    Stale,
    /// Synced before freshness tracking; files present, token adopted.
    Retroactive,
    /// Locked token matches (or the remote token is unknown) and files exist.
    Current,
}

impl Freshness {
    /// Whether the downloader must fetch this mod.
    pub fn needs_download(self) -> bool {
        matches!(self, Self::Missing | Self::FilesMissing | Self::Stale)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Missing => "new",
            Self::FilesMissing => "files missing",
            Self::Stale => "updated",
            Self::Retroactive => "retroactive lock",
            Self::Current => "current",
        }
    }
}

/// The planner's verdict for a whole resolved set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    /// Decision per resolved id.
    pub decisions: BTreeMap<ModId, Freshness>,
    /// Ids the downloader must fetch.
    pub downloads: BTreeSet<ModId>,
    /// Lock entries carried forward for ids that need no download.
    /// Retroactive entries already hold the adopted remote token.
    pub carried: BTreeMap<ModId, LockEntry>,
}

impl DownloadPlan {
    pub fn decision(&self, id: &ModId) -> Option<Freshness> {
        self.decisions.get(id).copied()
    }

    /// Ids with a given decision, in sorted order.
    pub fn with_decision(&self, freshness: Freshness) -> impl Iterator<Item = &ModId> {
        self.decisions
            .iter()
            .filter(move |(_, f)| **f == freshness)
            .map(|(id, _)| id)
    }
}

/// Plan downloads for `resolved` against `previous`.
///
/// `root` is the directory lock entry file paths are relative to.
pub fn plan(resolved: &ResolvedSet, previous: &LockStore, root: &Path) -> DownloadPlan {
    let mut plan = DownloadPlan::default();

    for (id, current) in resolved {
        let locked = previous.get(id);

        let freshness = match locked {
            None => Freshness::Missing,
            Some(entry) if !entry.files_exist(root) => Freshness::FilesMissing,
            Some(entry) if !entry.has_known_update() => Freshness::Retroactive,
            Some(_) if !current.has_known_update() => Freshness::Current,
            Some(entry) if entry.updated != current.updated => Freshness::Stale,
            Some(_) => Freshness::Current,
        };

        tracing::debug!("{id}: {}", freshness.label());

        if freshness.needs_download() {
            plan.downloads.insert(id.clone());
        } else if let Some(entry) = locked {
            let mut carried = entry.clone();
            if freshness == Freshness::Retroactive {
                carried.updated.clone_from(&current.updated);
            }
            plan.carried.insert(id.clone(), carried);
        }

        plan.decisions.insert(id.clone(), freshness);
    }

    plan
}
