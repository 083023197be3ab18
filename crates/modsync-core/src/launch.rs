//! Build config patching.
//!
//! Only the `workshop = [ ... ]` block of the launch config is machine-owned.
//! Everything else in the file is passed through byte-for-byte.

use crate::error::SyncError;
use modsync_schema::ModId;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const WORKSHOP_KEY: &str = "workshop =";

/// Replace the elements of the `workshop` array in `text` with `ids`.
///
/// The introducing line is kept as is and one `"<id>",` line is emitted per
/// id, in sorted order. Lines up to (not including) the first line containing
/// `]` are dropped. An inline array on the introducing line is expanded into
/// block form.
pub fn patch_workshop_ids(text: &str, ids: &BTreeSet<ModId>) -> String {
    let mut out = String::with_capacity(text.len() + ids.len() * 16);
    let mut in_block = false;

    for line in text.split_inclusive('\n') {
        if in_block {
            if line.contains(']') {
                in_block = false;
                out.push_str(line);
            }
            continue;
        }

        let Some(key_at) = line.find(WORKSHOP_KEY) else {
            out.push_str(line);
            continue;
        };

        let eol = line_ending(line);
        let value = &line[key_at + WORKSHOP_KEY.len()..];

        if value.contains(']') {
            let indent = &line[..key_at];
            out.push_str(indent);
            out.push_str(WORKSHOP_KEY);
            out.push_str(" [");
            out.push_str(eol.unwrap_or("\n"));
            push_ids(&mut out, ids, eol.unwrap_or("\n"));
            out.push_str(indent);
            out.push(']');
            out.push_str(eol.unwrap_or_default());
        } else {
            out.push_str(line);
            if eol.is_none() {
                out.push('\n');
            }
            push_ids(&mut out, ids, eol.unwrap_or("\n"));
            in_block = true;
        }
    }

    out
}

fn push_ids(out: &mut String, ids: &BTreeSet<ModId>, eol: &str) {
    for id in ids {
        out.push_str("    \"");
        out.push_str(id.as_str());
        out.push_str("\",");
        out.push_str(eol);
    }
}

fn line_ending(line: &str) -> Option<&'static str> {
    if line.ends_with("\r\n") {
        Some("\r\n")
    } else if line.ends_with('\n') {
        Some("\n")
    } else {
        None
    }
}

/// Patch the launch config at `path` in place.
///
/// Returns `false` without touching anything when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or written.
pub fn sync_launch_config(path: &Path, ids: &BTreeSet<ModId>) -> Result<bool, SyncError> {
    if !path.is_file() {
        tracing::debug!("No launch config at {}, skipping", path.display());
        return Ok(false);
    }

    let text = fs::read_to_string(path).map_err(|e| SyncError::io("read", path, e))?;
    let patched = patch_workshop_ids(&text, ids);
    if patched != text {
        fs::write(path, patched).map_err(|e| SyncError::io("write", path, e))?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::id;
    use tempfile::TempDir;

    fn ids(list: &[&str]) -> BTreeSet<ModId> {
        list.iter().map(|s| id(s)).collect()
    }

    const LAUNCH: &str = r#"[default]
workshop = [
    "11111111",
    "22222222",
]
parameters = ["-world=empty"]
"#;

    #[test]
    fn test_replaces_block_sorted() {
        let patched = patch_workshop_ids(LAUNCH, &ids(&["87654321", "12345678"]));
        assert_eq!(
            patched,
            r#"[default]
workshop = [
    "12345678",
    "87654321",
]
parameters = ["-world=empty"]
"#
        );
    }

    #[test]
    fn test_empty_set_empties_block() {
        let patched = patch_workshop_ids(LAUNCH, &BTreeSet::new());
        assert_eq!(patched, "[default]\nworkshop = [\n]\nparameters = [\"-world=empty\"]\n");
    }

    #[test]
    fn test_inline_array_is_expanded() {
        let text = "[default]\n  workshop = []\ndlc = [\"contact\"]\n";
        let patched = patch_workshop_ids(text, &ids(&["12345678"]));
        assert_eq!(
            patched,
            "[default]\n  workshop = [\n    \"12345678\",\n  ]\ndlc = [\"contact\"]\n"
        );
    }

    #[test]
    fn test_crlf_is_preserved() {
        let text = "[default]\r\nworkshop = [\r\n    \"1\",\r\n]\r\nmission = \"x\"\r\n";
        let patched = patch_workshop_ids(text, &ids(&["12345678"]));
        assert_eq!(
            patched,
            "[default]\r\nworkshop = [\r\n    \"12345678\",\r\n]\r\nmission = \"x\"\r\n"
        );
    }

    #[test]
    fn test_file_without_block_is_unchanged() {
        let text = "[default]\nmission = \"x\"";
        assert_eq!(patch_workshop_ids(text, &ids(&["12345678"])), text);
    }

    #[test]
    fn test_patch_is_idempotent() {
        let set = ids(&["12345678", "99999999"]);
        let once = patch_workshop_ids(LAUNCH, &set);
        assert_eq!(patch_workshop_ids(&once, &set), once);
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".hemtt/launch.toml");
        assert!(!sync_launch_config(&path, &ids(&["12345678"])).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_sync_launch_config_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("launch.toml");
        fs::write(&path, LAUNCH).unwrap();

        assert!(sync_launch_config(&path, &ids(&["12345678"])).unwrap());
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("    \"12345678\",\n"));
        assert!(!written.contains("11111111"));
        assert!(written.ends_with("parameters = [\"-world=empty\"]\n"));
    }
}
