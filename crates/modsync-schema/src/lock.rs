//! The on-disk lock record (`mods.lock`).
//!
//! The lock record is a JSON snapshot of what is currently mirrored locally:
//!
//! ```json
//! {
//!   "mods": {
//!     "12345678": {
//!       "files": ["addons/core.pbo"],
//!       "name": "Core",
//!       "dependencies": [{ "id": "99999999", "name": "Lib" }],
//!       "updated": "5 Jan @ 3:12pm"
//!     }
//!   }
//! }
//! ```

use crate::types::{Dependency, ModId, ModMetadata, UNKNOWN_UPDATE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors raised while reading or writing the lock record.
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// The lock file exists but could not be read or written.
    #[error("Lock record I/O failed on '{}'", path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The lock file is not valid JSON for the lock schema.
    #[error("Lock record '{}' is malformed", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

fn unknown_update() -> String {
    UNKNOWN_UPDATE.to_string()
}

/// Persisted state for one mirrored mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Mirror files owned by this mod, relative to the project root.
    #[serde(default)]
    pub files: Vec<String>,
    /// Display name at the time of the last sync.
    pub name: String,
    /// Dependencies declared at the time of the last sync.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Freshness token at the time of the last sync.
    ///
    /// Records written before freshness tracking lack this field and read
    /// back as [`UNKNOWN_UPDATE`].
    #[serde(default = "unknown_update")]
    pub updated: String,
}

impl LockEntry {
    /// Build an entry from resolved metadata with no files recorded yet.
    pub fn from_metadata(meta: &ModMetadata) -> Self {
        Self {
            files: Vec::new(),
            name: meta.name.clone(),
            dependencies: meta.dependencies.clone(),
            updated: meta.updated.clone(),
        }
    }

    /// True when at least one file is recorded and every recorded file is
    /// present under `root`.
    pub fn files_exist(&self, root: &Path) -> bool {
        !self.files.is_empty() && self.files.iter().all(|f| root.join(f).is_file())
    }

    /// Whether this entry carries a known freshness token.
    pub fn has_known_update(&self) -> bool {
        self.updated != UNKNOWN_UPDATE
    }
}

/// The full lock record, keyed by mod id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStore {
    /// Mirrored mods.
    #[serde(default)]
    pub mods: BTreeMap<ModId, LockEntry>,
}

impl LockStore {
    /// Load the lock record from `path`.
    ///
    /// A missing file yields an empty store so the first sync is handled the
    /// same way as later ones. A JSON object without a `mods` key is also
    /// treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Io`] if the file exists but cannot be read and
    /// [`LockError::Parse`] if its contents do not match the lock schema.
    pub fn load(path: &Path) -> Result<Self, LockError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| LockError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Persist the lock record to `path`.
    ///
    /// The record is written to a sibling temp file and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Io`] if the temp file cannot be written or the
    /// rename fails.
    pub fn save(&self, path: &Path) -> Result<(), LockError> {
        let io_err = |source: std::io::Error| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut content = serde_json::to_string_pretty(self).map_err(|source| LockError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        content.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let temp_path = path.with_extension("lock.tmp");
        std::fs::write(&temp_path, content).map_err(io_err)?;
        std::fs::rename(&temp_path, path).map_err(io_err)?;

        Ok(())
    }

    /// Look up the entry for `id`.
    pub fn get(&self, id: &ModId) -> Option<&LockEntry> {
        self.mods.get(id)
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Number of locked mods.
    pub fn len(&self) -> usize {
        self.mods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(s: &str) -> ModId {
        ModId::parse(s).unwrap()
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LockStore::load(&dir.path().join("mods.lock")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_without_mods_key_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mods.lock");
        std::fs::write(&path, r#"{"version": 1}"#).unwrap();
        assert!(LockStore::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_entry_without_updated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mods.lock");
        std::fs::write(
            &path,
            r#"{"mods": {"55555555": {"files": ["addons/old.pbo"], "name": "Old", "dependencies": []}}}"#,
        )
        .unwrap();

        let store = LockStore::load(&path).unwrap();
        let entry = store.get(&id("55555555")).unwrap();
        assert_eq!(entry.updated, UNKNOWN_UPDATE);
        assert!(!entry.has_known_update());
        assert_eq!(entry.files, vec!["addons/old.pbo"]);
    }

    #[test]
    fn test_malformed_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mods.lock");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            LockStore::load(&path),
            Err(LockError::Parse { .. })
        ));
    }

    #[test]
    fn test_save_writes_wire_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mods.lock");

        let mut store = LockStore::default();
        store.mods.insert(
            id("12345678"),
            LockEntry {
                files: vec!["addons/core.pbo".into()],
                name: "Core".into(),
                dependencies: vec![Dependency {
                    id: id("99999999"),
                    name: "Lib".into(),
                }],
                updated: "1700000000".into(),
            },
        );
        store.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &raw["mods"]["12345678"];
        assert_eq!(entry["files"][0], "addons/core.pbo");
        assert_eq!(entry["dependencies"][0]["id"], "99999999");
        assert_eq!(entry["updated"], "1700000000");
        assert!(!dir.path().join("mods.lock.tmp").exists());
        assert_eq!(LockStore::load(&path).unwrap(), store);
    }

    #[test]
    fn test_files_exist() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("addons")).unwrap();
        std::fs::write(dir.path().join("addons/a.pbo"), b"x").unwrap();

        let mut entry = LockEntry {
            files: vec![],
            name: "A".into(),
            dependencies: vec![],
            updated: "1".into(),
        };
        assert!(!entry.files_exist(dir.path()));

        entry.files = vec!["addons/a.pbo".into()];
        assert!(entry.files_exist(dir.path()));

        entry.files.push("addons/b.pbo".into());
        assert!(!entry.files_exist(dir.path()));
    }
}
