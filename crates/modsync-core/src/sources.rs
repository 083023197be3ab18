//! Source list parsing (`mod_sources.txt`).
//!
//! One directive per line:
//!
//! ```text
//! # comment
//! 12345678 # Core            <- wanted mod with display tag "Core"
//! https://steamcommunity.com/sharedfiles/filedetails/?id=87654321
//! @ignore 99999999           <- inline ignore, may list several ids
//! ignore=77777777
//! [ignore]                   <- everything below is collected as ignores
//! 11111111
//! ```
//!
//! The `[ignore]` / `[ignored]` marker ends normal parsing for the rest of
//! the file: ids listed below it are never wanted, only ignored.

use crate::error::SyncError;
use modsync_schema::{ModId, ModRef};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::LazyLock;

static MOD_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:id=)?(\d{8,})").expect("valid regex"));

static ANY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{8,}").expect("valid regex"));

/// Wanted mods and ignored ids parsed from a source list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    /// Wanted mods, unique by id, in first-seen order.
    pub wanted: Vec<ModRef>,
    /// Ids excluded from resolution.
    pub ignored: BTreeSet<ModId>,
}

impl SourceList {
    /// Read and parse the source list at `path`. A missing file is empty.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            tracing::debug!("No source list at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::io("read source list", path, e))?;
        Ok(Self::parse(&content))
    }

    /// Parse source list text.
    pub fn parse(content: &str) -> Self {
        let mut list = Self::default();
        let mut positions: HashMap<ModId, usize> = HashMap::new();
        let mut in_ignore_block = false;

        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if in_ignore_block {
                list.ignore_all(line);
                continue;
            }

            let lower = line.to_lowercase();
            if lower.contains("[ignore]") || lower.contains("[ignored]") {
                in_ignore_block = true;
                continue;
            }

            if lower.contains("ignore=") || lower.contains("@ignore") {
                list.ignore_all(line);
                continue;
            }

            let Some(caps) = MOD_REF.captures(line) else {
                tracing::trace!("Skipping unrecognised source line: {line}");
                continue;
            };
            let Ok(id) = ModId::parse(&caps[1]) else {
                continue;
            };
            let tag = line.split_once('#').map(|(_, tag)| tag);
            let entry = ModRef::new(id.clone(), tag);

            // Last tag wins, first position is kept.
            match positions.get(&id) {
                Some(&idx) => list.wanted[idx] = entry,
                None => {
                    positions.insert(id, list.wanted.len());
                    list.wanted.push(entry);
                }
            }
        }

        list
    }

    fn ignore_all(&mut self, line: &str) {
        for m in ANY_ID.find_iter(line) {
            if let Ok(id) = ModId::parse(m.as_str()) {
                self.ignored.insert(id);
            }
        }
    }

    /// Whether no mods are wanted.
    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }

    /// Display tag for a wanted id, if one was given.
    pub fn tag(&self, id: &ModId) -> Option<&str> {
        self.wanted
            .iter()
            .find(|r| &r.id == id)
            .and_then(|r| r.tag.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &SourceList) -> Vec<&str> {
        list.wanted.iter().map(|r| r.id.as_str()).collect()
    }

    fn ignored(list: &SourceList) -> Vec<&str> {
        list.ignored.iter().map(ModId::as_str).collect()
    }

    #[test]
    fn test_tags_and_plain_ids() {
        let list = SourceList::parse("12345678 # Core\n87654321\n");
        assert_eq!(ids(&list), vec!["12345678", "87654321"]);
        assert_eq!(list.wanted[0].tag.as_deref(), Some("Core"));
        assert_eq!(list.wanted[1].tag, None);
        assert!(list.ignored.is_empty());
    }

    #[test]
    fn test_urls_comments_and_inline_ignores() {
        let content = "
            https://steamcommunity.com/sharedfiles/filedetails/?id=12345678
            87654321
            # Some comment 55555555
            id=11223344
            @ignore 99999999 88888888
            ignore=77777777
        ";
        let list = SourceList::parse(content);
        assert_eq!(ids(&list), vec!["12345678", "87654321", "11223344"]);
        assert_eq!(ignored(&list), vec!["77777777", "88888888", "99999999"]);
    }

    #[test]
    fn test_short_ids_are_not_mods() {
        let list = SourceList::parse("1234567\nversion 2\n");
        assert!(list.is_empty());
    }

    #[test]
    fn test_duplicate_id_last_tag_wins() {
        let list = SourceList::parse("12345678 # First\n87654321\n12345678 # Second\n");
        assert_eq!(ids(&list), vec!["12345678", "87654321"]);
        assert_eq!(list.tag(&ModId::parse("12345678").unwrap()), Some("Second"));
    }

    #[test]
    fn test_ignore_block_ends_normal_parsing() {
        let content = "12345678\n[Ignore]\n# still a comment 44444444\n22222222 33333333\n87654321 # would have been wanted\n";
        let list = SourceList::parse(content);
        assert_eq!(ids(&list), vec!["12345678"]);
        assert_eq!(ignored(&list), vec!["22222222", "33333333", "87654321"]);
    }

    #[test]
    fn test_ignored_marker_variant() {
        let list = SourceList::parse("[ignored]\n12345678\n");
        assert!(list.is_empty());
        assert_eq!(ignored(&list), vec!["12345678"]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let list = SourceList::load(&dir.path().join("mod_sources.txt")).unwrap();
        assert_eq!(list, SourceList::default());
    }
}
