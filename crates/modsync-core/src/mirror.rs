//! Mirror synchronization.
//!
//! Copies package files out of the workshop cache into the local mirror,
//! removes files that belong to mods which are no longer wanted and writes
//! the new lock record. None of this is transactional; the planner re-derives
//! truth from disk on the next run.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::planner::DownloadPlan;
use crate::reporter::Reporter;
use crate::resolver::{Resolution, ResolvedSet};
use modsync_schema::{LockEntry, LockStore, ModId};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Locate the workshop content directory.
///
/// The first existing candidate wins. When none exist and the scratch
/// shortcut is enabled, an empty directory under the system temp dir is
/// created and used instead.
///
/// # Errors
///
/// Returns [`SyncError::CacheRootNotFound`] when no candidate exists and the
/// scratch shortcut is off.
pub fn discover_cache_root(config: &SyncConfig) -> Result<PathBuf, SyncError> {
    let candidates = config.cache_root_candidates();
    if let Some(found) = candidates.iter().find(|p| p.is_dir()) {
        tracing::debug!("Using workshop cache {}", found.display());
        return Ok(found.clone());
    }

    if config.scratch_cache {
        let scratch = std::env::temp_dir()
            .join("modsync-workshop-scratch")
            .join(&config.app_id);
        fs::create_dir_all(&scratch)
            .map_err(|e| SyncError::io("create scratch cache", &scratch, e))?;
        tracing::warn!("No workshop cache found, using scratch {}", scratch.display());
        return Ok(scratch);
    }

    let searched = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(SyncError::CacheRootNotFound { searched })
}

/// What a synchronization did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// The lock record that was written.
    pub lock: LockStore,
    /// Mods whose files were copied from the cache.
    pub synced: Vec<ModId>,
    /// Mods kept from the previous lock without copying.
    pub retained: Vec<ModId>,
    /// Mods skipped because they were missing from the cache. A skipped mod
    /// that was locked before keeps its previous entry.
    pub skipped: Vec<ModId>,
    /// Mirror files deleted, relative to the project root.
    pub removed: Vec<String>,
}

/// Reconciles the mirror with a resolved set.
pub struct MirrorSync<'a> {
    config: &'a SyncConfig,
    cache_root: &'a Path,
    reporter: &'a dyn Reporter,
}

impl<'a> MirrorSync<'a> {
    pub fn new(config: &'a SyncConfig, cache_root: &'a Path, reporter: &'a dyn Reporter) -> Self {
        Self {
            config,
            cache_root,
            reporter,
        }
    }

    /// Copy, clean up and rewrite the lock record.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror or keys directory cannot be prepared,
    /// a file cannot be copied or removed, or the lock record cannot be saved.
    pub fn synchronize(
        &self,
        resolution: &Resolution,
        plan: &DownloadPlan,
        previous: &LockStore,
    ) -> Result<SyncReport, SyncError> {
        let resolved = &resolution.resolved;
        let mirror = self.config.mirror_path();
        fs::create_dir_all(&mirror).map_err(|e| SyncError::io("create mirror", &mirror, e))?;

        self.purge_keys()?;

        let mut report = SyncReport::default();

        for (id, meta) in resolved {
            let cache_dir = self.cache_root.join(id.as_str());
            if !cache_dir.is_dir() {
                if let Some(entry) = plan.carried.get(id) {
                    tracing::debug!("{id} not in workshop cache, keeping mirrored files");
                    report.lock.mods.insert(id.clone(), entry.clone());
                    report.retained.push(id.clone());
                } else {
                    self.reporter.warning(&format!(
                        "Mod {} ({id}) not found in workshop cache.",
                        meta.name
                    ));
                    // Keep the old entry so its mirrored files stay tracked
                    // and the next run plans the download again.
                    if let Some(entry) = previous.get(id) {
                        report.lock.mods.insert(id.clone(), entry.clone());
                    }
                    report.skipped.push(id.clone());
                }
                continue;
            }

            self.reporter.syncing(id, &meta.name);
            let mut entry = LockEntry::from_metadata(meta);
            if let Some(carried) = plan.carried.get(id) {
                entry.updated.clone_from(&carried.updated);
                if resolution.unreachable.contains(id) {
                    entry.name.clone_from(&carried.name);
                    entry.dependencies.clone_from(&carried.dependencies);
                }
            }
            entry.files = self.copy_packages(&cache_dir, &mirror)?;
            if entry.files.is_empty() {
                self.reporter.warning(&format!(
                    "Mod {} ({id}) contains no .{} files.",
                    meta.name, self.config.package_extension
                ));
            }

            report.lock.mods.insert(id.clone(), entry);
            report.synced.push(id.clone());
        }

        report.removed = self.cleanup(resolved, previous, &report)?;

        let lock_path = self.config.lock_path();
        report.lock.save(&lock_path)?;
        tracing::debug!("Wrote {} lock entries to {}", report.lock.len(), lock_path.display());

        Ok(report)
    }

    /// Delete and recreate the signing key directory so no external keys
    /// survive into the mirror.
    fn purge_keys(&self) -> Result<(), SyncError> {
        let keys = self.config.keys_path();
        if keys.exists() {
            self.reporter.section(&format!(
                "Purging {} to remove external keys",
                self.config.keys_dir.display()
            ));
            fs::remove_dir_all(&keys).map_err(|e| SyncError::io("purge keys", &keys, e))?;
        }
        fs::create_dir_all(&keys).map_err(|e| SyncError::io("create keys", &keys, e))
    }

    /// Copy every package file under `cache_dir` into `mirror`, returning the
    /// recorded (project-relative) paths.
    fn copy_packages(&self, cache_dir: &Path, mirror: &Path) -> Result<Vec<String>, SyncError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(cache_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.is_package(e.path()));

        for source in walker {
            let file_name = source.file_name();
            let dest = mirror.join(file_name);

            fs::copy(source.path(), &dest).map_err(|e| SyncError::io("copy", &dest, e))?;
            touch(&dest).map_err(|e| SyncError::io("set mtime on", &dest, e))?;

            let rel = mirror_relative(&self.config.mirror_dir, &file_name.to_string_lossy());
            files.push(rel);
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    fn is_package(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.config.package_extension.as_str()))
    }

    /// Remove files recorded previously that nothing in the new lock claims:
    /// every file of a dropped mod, and files a re-synced mod no longer ships.
    fn cleanup(
        &self,
        resolved: &ResolvedSet,
        previous: &LockStore,
        report: &SyncReport,
    ) -> Result<Vec<String>, SyncError> {
        let claimed: HashSet<&str> = report
            .lock
            .mods
            .values()
            .flat_map(|e| e.files.iter().map(String::as_str))
            .collect();
        let resynced: HashSet<&ModId> = report.synced.iter().collect();

        let mut removed = Vec::new();
        for (old_id, old_entry) in &previous.mods {
            let dropped = !resolved.contains_key(old_id);
            if !dropped && !resynced.contains(old_id) {
                continue;
            }
            if dropped {
                self.reporter
                    .section(&format!("Cleaning up Mod ID: {old_id} ({})", old_entry.name));
            }

            for rel in &old_entry.files {
                if claimed.contains(rel.as_str()) {
                    continue;
                }
                let path = self.config.project_root.join(rel);
                if path.exists() {
                    self.reporter.removing(rel);
                    fs::remove_file(&path).map_err(|e| SyncError::io("remove", &path, e))?;
                    removed.push(rel.clone());
                }
            }
        }

        Ok(removed)
    }
}

/// Normalize a copied file's modification time to now.
fn touch(path: &Path) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

fn mirror_relative(mirror_dir: &Path, file_name: &str) -> String {
    let dir = mirror_dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file_name.to_string()
    } else {
        format!("{dir}/{file_name}")
    }
}
