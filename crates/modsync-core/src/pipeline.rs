//! End-to-end sync: parse, resolve, plan, download, mirror, patch.

use crate::config::SyncConfig;
use crate::downloader::BulkDownloader;
use crate::error::SyncError;
use crate::launch;
use crate::metadata::MetadataSource;
use crate::mirror::{self, MirrorSync, SyncReport};
use crate::planner::{self, DownloadPlan, Freshness};
use crate::reporter::Reporter;
use crate::resolver::{Resolution, Resolver};
use crate::sources::SourceList;
use modsync_schema::{LockStore, ModId};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

/// Knobs for a single [`Pipeline::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Stop after planning.
    pub dry_run: bool,
    /// Do not invoke the downloader; use whatever is already cached.
    pub skip_download: bool,
}

/// Everything a run decided and did.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub resolution: Resolution,
    pub plan: DownloadPlan,
    /// `None` on a dry run.
    pub report: Option<SyncReport>,
    /// Whether the launch config existed and was patched.
    pub launch_patched: bool,
}

/// Drives one sync with injected collaborators.
pub struct Pipeline<'a> {
    config: &'a SyncConfig,
    metadata: &'a dyn MetadataSource,
    downloader: &'a dyn BulkDownloader,
    reporter: &'a dyn Reporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a SyncConfig,
        metadata: &'a dyn MetadataSource,
        downloader: &'a dyn BulkDownloader,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            metadata,
            downloader,
            reporter,
        }
    }

    /// Parse the source list and resolve its dependency closure.
    ///
    /// An empty wanted set resolves to nothing without any fetches. Mods in
    /// `previous` whose pages are unreachable keep their locked dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the source list exists but cannot be read.
    pub async fn resolve(&self, previous: &LockStore) -> Result<Resolution, SyncError> {
        let sources = SourceList::load(&self.config.sources_path())?;
        if sources.is_empty() {
            self.reporter
                .info("No external mods defined, running workspace maintenance");
            return Ok(Resolution::default());
        }

        Ok(Resolver::new(self.metadata, self.reporter)
            .with_concurrency(self.config.fetch_concurrency)
            .with_locked(previous)
            .resolve(&sources)
            .await)
    }

    /// Run the whole sync.
    ///
    /// # Errors
    ///
    /// Fatal conditions only: unreadable inputs, a failed downloader, an
    /// undiscoverable cache root, or mirror/lock I/O failures.
    pub async fn run(&self, options: SyncOptions) -> Result<SyncOutcome, SyncError> {
        let start = Instant::now();

        let previous = LockStore::load(&self.config.lock_path())?;
        let resolution = self.resolve(&previous).await?;
        let plan = planner::plan(&resolution.resolved, &previous, &self.config.project_root);
        self.report_plan(&resolution, &plan);

        let mut outcome = SyncOutcome {
            resolution,
            plan,
            ..SyncOutcome::default()
        };

        if options.dry_run {
            self.reporter.summary(
                outcome.plan.downloads.len(),
                "to download",
                start.elapsed().as_secs_f64(),
            );
            return Ok(outcome);
        }

        if options.skip_download {
            if !outcome.plan.downloads.is_empty() {
                self.reporter.info(&format!(
                    "Skipping download of {} mods",
                    outcome.plan.downloads.len()
                ));
            }
        } else if !outcome.plan.downloads.is_empty() {
            if let Err(e) = self
                .downloader
                .download(&outcome.plan.downloads, self.reporter)
            {
                self.reporter.error(&format!(
                    "Download of {} mods failed, mirror left untouched",
                    outcome.plan.downloads.len()
                ));
                return Err(e);
            }
        }

        // A maintenance run only removes files and never reads the cache.
        let cache_root = if outcome.resolution.resolved.is_empty() {
            PathBuf::new()
        } else {
            mirror::discover_cache_root(self.config)?
        };

        self.reporter.section("Syncing Mirror");
        let report = MirrorSync::new(self.config, &cache_root, self.reporter).synchronize(
            &outcome.resolution,
            &outcome.plan,
            &previous,
        )?;

        let ids: BTreeSet<ModId> = outcome.resolution.resolved.keys().cloned().collect();
        let launch_path = self.config.launch_path();
        outcome.launch_patched = launch::sync_launch_config(&launch_path, &ids)?;
        if outcome.launch_patched {
            self.reporter.info(&format!(
                "Synced {} workshop ids into {}",
                ids.len(),
                self.config.launch_file.display()
            ));
        }

        self.reporter
            .summary(report.lock.len(), "synced", start.elapsed().as_secs_f64());
        outcome.report = Some(report);
        Ok(outcome)
    }

    fn report_plan(&self, resolution: &Resolution, plan: &DownloadPlan) {
        for id in plan.with_decision(Freshness::Retroactive) {
            self.reporter
                .info(&format!("Retroactively locking {id} (files already present)"));
        }
        if plan.downloads.is_empty() {
            if !resolution.resolved.is_empty() {
                self.reporter.success("All mods are up to date");
            }
            return;
        }

        self.reporter.section("Planned Downloads");
        for id in &plan.downloads {
            let name = resolution
                .resolved
                .get(id)
                .map_or(id.as_str(), |m| m.name.as_str());
            let reason = plan.decision(id).map_or("", Freshness::label);
            self.reporter.info(&format!("{name} ({id}): {reason}"));
        }
    }
}
