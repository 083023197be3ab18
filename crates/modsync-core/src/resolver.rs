//! Transitive dependency resolution.
//!
//! Breadth-first worklist over a frontier seeded with the wanted ids. The
//! frontier is drained in batches of up to `concurrency` ids whose metadata is
//! fetched concurrently; results are merged back here, in batch order, so the
//! resolver remains the only writer of the resolved set, the processed set and
//! the frontier.
//!
//! Ignored ids are pre-marked as processed: they are never fetched and never
//! resolved, even when another mod depends on them.
//!
//! An unreachable id resolves to a placeholder with no dependencies, so its
//! dependency subtree drops out of the closure. When a previous lock record is
//! supplied, an unreachable id that it knows about keeps the locked name and
//! dependencies instead, and the subtree survives a transient outage. The
//! token stays unknown either way.

use crate::metadata::{FetchOutcome, MetadataSource};
use crate::reporter::Reporter;
use crate::sources::SourceList;
use futures::stream::{self, StreamExt};
use modsync_schema::{LockStore, ModId, ModMetadata};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// The transitive closure of wanted mods, keyed by id.
pub type ResolvedSet = BTreeMap<ModId, ModMetadata>;

/// Output of a resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every wanted mod and its transitive dependencies, minus ignored ids.
    pub resolved: ResolvedSet,
    /// Ids whose metadata could not be fetched; they carry placeholders.
    pub unreachable: Vec<ModId>,
}

impl Resolution {
    /// Resolved ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &ModId> {
        self.resolved.keys()
    }
}

/// Expands a source list into its dependency closure.
pub struct Resolver<'a, S: MetadataSource + ?Sized, R: Reporter + ?Sized> {
    source: &'a S,
    reporter: &'a R,
    concurrency: usize,
    locked: Option<&'a LockStore>,
}

impl<'a, S: MetadataSource + ?Sized, R: Reporter + ?Sized> Resolver<'a, S, R> {
    pub fn new(source: &'a S, reporter: &'a R) -> Self {
        Self {
            source,
            reporter,
            concurrency: 1,
            locked: None,
        }
    }

    /// Fall back to `lock` for ids whose metadata cannot be fetched.
    pub fn with_locked(mut self, lock: &'a LockStore) -> Self {
        self.locked = Some(lock);
        self
    }

    /// Fetch up to `n` independent ids at a time.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Resolve the wanted set of `sources`.
    pub async fn resolve(&self, sources: &SourceList) -> Resolution {
        self.reporter.section("Resolving Dependencies");
        if !sources.ignored.is_empty() {
            let names: Vec<&str> = sources.ignored.iter().map(ModId::as_str).collect();
            self.reporter
                .info(&format!("Ignoring: {}", names.join(", ")));
        }

        let mut resolution = Resolution::default();
        let mut processed: HashSet<ModId> = sources.ignored.iter().cloned().collect();
        let mut queued: HashSet<ModId> = HashSet::new();
        let mut frontier: VecDeque<ModId> = VecDeque::new();

        for wanted in &sources.wanted {
            if processed.contains(&wanted.id) {
                tracing::debug!("Wanted mod {} is ignored", wanted.id);
                continue;
            }
            if queued.insert(wanted.id.clone()) {
                frontier.push_back(wanted.id.clone());
            }
        }

        while !frontier.is_empty() {
            let take = self.concurrency.min(frontier.len());
            let batch: Vec<ModId> = frontier
                .drain(..take)
                .filter(|id| !processed.contains(id))
                .collect();

            let outcomes: Vec<FetchOutcome> = stream::iter(batch.iter())
                .map(|id| {
                    self.reporter.checking(id);
                    self.source.fetch(id)
                })
                .buffered(self.concurrency)
                .collect()
                .await;

            for (id, outcome) in batch.into_iter().zip(outcomes) {
                let mut meta = match outcome {
                    FetchOutcome::Fetched(meta) => meta,
                    FetchOutcome::Unreachable { reason, .. } => {
                        self.reporter.warning(&format!(
                            "Could not fetch info for mod {id}: {reason}"
                        ));
                        resolution.unreachable.push(id.clone());
                        self.fallback(&id)
                    }
                };
                meta.id = id.clone();
                if let Some(tag) = sources.tag(&id) {
                    meta.name = tag.to_string();
                }

                processed.insert(id.clone());
                for dep in &meta.dependencies {
                    if processed.contains(&dep.id) {
                        continue;
                    }
                    if queued.insert(dep.id.clone()) {
                        self.reporter.dependency_found(&id, dep);
                        frontier.push_back(dep.id.clone());
                    }
                }

                resolution.resolved.insert(id, meta);
            }
        }

        tracing::debug!(
            "Resolved {} mods ({} unreachable)",
            resolution.resolved.len(),
            resolution.unreachable.len()
        );
        resolution
    }

    fn fallback(&self, id: &ModId) -> ModMetadata {
        let mut meta = ModMetadata::placeholder(id);
        if let Some(entry) = self.locked.and_then(|lock| lock.get(id)) {
            tracing::debug!("{id} unreachable, using locked name and dependencies");
            meta.name.clone_from(&entry.name);
            meta.dependencies.clone_from(&entry.dependencies);
        }
        meta
    }
}
