//! Map mirrored packages back to the workshop item that ships them.

use crate::error::SyncError;
use modsync_schema::ModId;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Which workshop item each mirrored package came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identification {
    /// Package file names per owning mod.
    pub matches: BTreeMap<ModId, Vec<String>>,
    /// Package file names no cached item ships.
    pub unidentified: Vec<String>,
}

impl Identification {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.unidentified.is_empty()
    }
}

/// Identify every package in `mirror` against the cache at `cache_root`.
///
/// When several cached items ship a file of the same name, the lowest id
/// wins. A missing mirror directory yields an empty result.
///
/// # Errors
///
/// Returns an error if `cache_root` or `mirror` exist but cannot be listed.
pub fn identify(cache_root: &Path, mirror: &Path, extension: &str) -> Result<Identification, SyncError> {
    let owners = index_cache(cache_root, extension)?;
    let mut result = Identification::default();

    if !mirror.is_dir() {
        return Ok(result);
    }

    let mut names: Vec<String> = fs::read_dir(mirror)
        .map_err(|e| SyncError::io("list", mirror, e))?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| has_extension(name, extension))
        .collect();
    names.sort();

    for name in names {
        match owners.get(&name) {
            Some(owner) => result.matches.entry(owner.clone()).or_default().push(name),
            None => result.unidentified.push(name),
        }
    }

    Ok(result)
}

/// File name -> first (lowest) mod id whose cache subtree contains it.
fn index_cache(cache_root: &Path, extension: &str) -> Result<HashMap<String, ModId>, SyncError> {
    let mut items: Vec<(ModId, std::path::PathBuf)> = fs::read_dir(cache_root)
        .map_err(|e| SyncError::io("list", cache_root, e))?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|e| {
            let id = ModId::parse(&e.file_name().to_string_lossy()).ok()?;
            Some((id, e.path()))
        })
        .collect();
    items.sort();

    let mut owners = HashMap::new();
    for (id, dir) in items {
        for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if has_extension(&name, extension) {
                owners.entry(name).or_insert_with(|| id.clone());
            }
        }
    }

    tracing::debug!("Indexed {} cached packages", owners.len());
    Ok(owners)
}

fn has_extension(name: &str, extension: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
