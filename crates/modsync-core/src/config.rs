//! Run configuration.
//!
//! A [`SyncConfig`] is built once at process start (defaults, then the
//! optional `modsync.toml` at the project root, then command-line overrides)
//! and passed by reference to every component. Relative paths are resolved
//! against [`SyncConfig::project_root`].

use crate::error::SyncError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = "modsync.toml";

/// Remote application the mirrored mods belong to (Arma 3).
pub const DEFAULT_APP_ID: &str = "107410";

/// Item page endpoint; the mod id is appended as the `id` query parameter.
pub const DEFAULT_ITEM_URL: &str = "https://steamcommunity.com/sharedfiles/filedetails/";

/// Configuration for a single sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory every relative path below is resolved against.
    pub project_root: PathBuf,
    /// Human-edited list of wanted mods.
    pub sources_file: PathBuf,
    /// Persisted lock record.
    pub lock_file: PathBuf,
    /// Local mirror that receives package files.
    pub mirror_dir: PathBuf,
    /// Signing key directory purged before every sync.
    pub keys_dir: PathBuf,
    /// Build-tool launch configuration patched with the resolved ids.
    pub launch_file: PathBuf,
    /// Remote application identifier.
    pub app_id: String,
    /// Explicit cache root candidates. When `None`, the well-known Steam
    /// library locations are searched.
    pub cache_roots: Option<Vec<PathBuf>>,
    /// Item page base URL.
    pub item_url: String,
    /// Per-request timeout for metadata fetches.
    pub request_timeout: Duration,
    /// Upper bound on concurrent metadata fetches.
    pub fetch_concurrency: usize,
    /// Extension (without the dot) of files copied into the mirror.
    pub package_extension: String,
    /// External bulk downloader executable.
    pub downloader: String,
    /// Optional `+force_install_dir` target for the downloader.
    pub install_dir: Option<PathBuf>,
    /// Fabricate a scratch cache root when none of the candidates exist.
    pub scratch_cache: bool,
}

/// Overrides read from `modsync.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    sources_file: Option<PathBuf>,
    lock_file: Option<PathBuf>,
    mirror_dir: Option<PathBuf>,
    keys_dir: Option<PathBuf>,
    launch_file: Option<PathBuf>,
    app_id: Option<String>,
    cache_roots: Option<Vec<PathBuf>>,
    item_url: Option<String>,
    request_timeout_secs: Option<u64>,
    fetch_concurrency: Option<usize>,
    package_extension: Option<String>,
    downloader: Option<String>,
    install_dir: Option<PathBuf>,
}

impl SyncConfig {
    /// Defaults for a project rooted at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            sources_file: PathBuf::from("mod_sources.txt"),
            lock_file: PathBuf::from("mods.lock"),
            mirror_dir: PathBuf::from("addons"),
            keys_dir: PathBuf::from("keys"),
            launch_file: PathBuf::from(".hemtt/launch.toml"),
            app_id: DEFAULT_APP_ID.to_string(),
            cache_roots: None,
            item_url: DEFAULT_ITEM_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            fetch_concurrency: 10,
            package_extension: "pbo".to_string(),
            downloader: "steamcmd".to_string(),
            install_dir: None,
            scratch_cache: false,
        }
    }

    /// Defaults for `project_root`, overlaid with `modsync.toml` if present.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] if the config file exists but cannot be read
    /// and [`SyncError::Config`] if it is not valid.
    pub fn load(project_root: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let mut config = Self::new(project_root);
        let path = config.project_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| SyncError::io("read config", &path, e))?;
        let file: ConfigFile =
            toml::from_str(&content).map_err(|source| SyncError::Config { path, source })?;
        config.apply(file);

        tracing::debug!("Loaded {CONFIG_FILE} overrides");
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.sources_file {
            self.sources_file = v;
        }
        if let Some(v) = file.lock_file {
            self.lock_file = v;
        }
        if let Some(v) = file.mirror_dir {
            self.mirror_dir = v;
        }
        if let Some(v) = file.keys_dir {
            self.keys_dir = v;
        }
        if let Some(v) = file.launch_file {
            self.launch_file = v;
        }
        if let Some(v) = file.app_id {
            self.app_id = v;
        }
        if let Some(v) = file.cache_roots {
            self.cache_roots = Some(v);
        }
        if let Some(v) = file.item_url {
            self.item_url = v;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = file.fetch_concurrency {
            self.fetch_concurrency = v.max(1);
        }
        if let Some(v) = file.package_extension {
            self.package_extension = v.trim_start_matches('.').to_string();
        }
        if let Some(v) = file.downloader {
            self.downloader = v;
        }
        if let Some(v) = file.install_dir {
            self.install_dir = Some(v);
        }
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.project_root.join(path)
    }

    /// Source list path.
    pub fn sources_path(&self) -> PathBuf {
        self.resolve(&self.sources_file)
    }

    /// Lock record path.
    pub fn lock_path(&self) -> PathBuf {
        self.resolve(&self.lock_file)
    }

    /// Mirror directory path.
    pub fn mirror_path(&self) -> PathBuf {
        self.resolve(&self.mirror_dir)
    }

    /// Signing key directory path.
    pub fn keys_path(&self) -> PathBuf {
        self.resolve(&self.keys_dir)
    }

    /// Launch configuration path.
    pub fn launch_path(&self) -> PathBuf {
        self.resolve(&self.launch_file)
    }

    /// Item page URL for a mod.
    pub fn item_url_for(&self, id: &str) -> String {
        format!("{}?id={id}", self.item_url)
    }

    /// Ordered cache root candidates, first existing one wins.
    ///
    /// Without explicit roots, the downloader's install directory (when set)
    /// is searched before the well-known Steam libraries.
    pub fn cache_root_candidates(&self) -> Vec<PathBuf> {
        if let Some(roots) = &self.cache_roots {
            return roots.iter().map(|p| self.resolve(p)).collect();
        }

        let mut roots = Vec::new();
        if let Some(install_dir) = &self.install_dir {
            roots.push(workshop_content(&self.resolve(install_dir), &self.app_id));
        }
        roots.extend(default_cache_roots(
            dirs::home_dir().as_deref(),
            &self.project_root,
            &self.app_id,
        ));
        roots
    }
}

/// Workshop content directory for `app_id` inside a Steam library.
pub fn workshop_content(library: &Path, app_id: &str) -> PathBuf {
    library.join("steamapps/workshop/content").join(app_id)
}

/// Well-known Steam workshop content directories for `app_id`.
pub fn default_cache_roots(home: Option<&Path>, project_root: &Path, app_id: &str) -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(home) = home {
        roots.push(workshop_content(&home.join(".steam/steam"), app_id));
        roots.push(workshop_content(&home.join("Steam"), app_id));
        roots.push(workshop_content(&home.join(".local/share/Steam"), app_id));
    }
    roots.push(workshop_content(Path::new("/ext/SteamLibrary"), app_id));
    roots.push(workshop_content(project_root, app_id));

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_resolve_against_root() {
        let config = SyncConfig::new("/work/proj");
        assert_eq!(config.lock_path(), PathBuf::from("/work/proj/mods.lock"));
        assert_eq!(config.mirror_path(), PathBuf::from("/work/proj/addons"));
        assert_eq!(
            config.launch_path(),
            PathBuf::from("/work/proj/.hemtt/launch.toml")
        );
        assert_eq!(
            config.item_url_for("12345678"),
            "https://steamcommunity.com/sharedfiles/filedetails/?id=12345678"
        );
    }

    #[test]
    fn test_default_cache_roots_order() {
        let roots = default_cache_roots(Some(Path::new("/home/u")), Path::new("/p"), "107410");
        assert_eq!(
            roots.first().unwrap(),
            &PathBuf::from("/home/u/.steam/steam/steamapps/workshop/content/107410")
        );
        assert_eq!(
            roots.last().unwrap(),
            &PathBuf::from("/p/steamapps/workshop/content/107410")
        );
        assert_eq!(roots.len(), 5);
    }

    #[test]
    fn test_load_applies_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
app_id = "221100"
mirror_dir = "mirror"
cache_roots = ["cache"]
fetch_concurrency = 0
package_extension = ".PBO"
"#,
        )
        .unwrap();

        let config = SyncConfig::load(dir.path()).unwrap();
        assert_eq!(config.app_id, "221100");
        assert_eq!(config.mirror_path(), dir.path().join("mirror"));
        assert_eq!(config.cache_root_candidates(), vec![dir.path().join("cache")]);
        assert_eq!(config.fetch_concurrency, 1);
        assert_eq!(config.package_extension, "PBO");
        assert_eq!(config.lock_file, PathBuf::from("mods.lock"));
    }

    #[test]
    fn test_install_dir_is_searched_first() {
        let mut config = SyncConfig::new("/work/proj");
        config.install_dir = Some(PathBuf::from("steam"));
        let candidates = config.cache_root_candidates();
        assert_eq!(
            candidates.first().unwrap(),
            &PathBuf::from("/work/proj/steam/steamapps/workshop/content/107410")
        );
        assert_eq!(
            candidates.last().unwrap(),
            &PathBuf::from("/work/proj/steamapps/workshop/content/107410")
        );

        config.cache_roots = Some(vec![PathBuf::from("cache")]);
        assert_eq!(
            config.cache_root_candidates(),
            vec![PathBuf::from("/work/proj/cache")]
        );
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "bogus = 1\n").unwrap();
        assert!(matches!(
            SyncConfig::load(dir.path()),
            Err(SyncError::Config { .. })
        ));
    }
}
