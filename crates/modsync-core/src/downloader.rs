//! Bulk downloader invocation (SteamCMD).
//!
//! Content transfer is delegated to an external program. This module only
//! builds its command line, runs it to completion and turns a non-zero exit
//! into a fatal error.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::reporter::Reporter;
use modsync_schema::ModId;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;

/// Environment variable holding the downloader account name.
pub const USERNAME_ENV: &str = "STEAM_USERNAME";
/// Environment variable holding the downloader account password.
pub const PASSWORD_ENV: &str = "STEAM_PASSWORD";

/// Fetches content for a set of mods into the workshop cache.
pub trait BulkDownloader {
    /// Download every id in `ids`. An empty set must be a no-op.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the run.
    fn download(&self, ids: &BTreeSet<ModId>, reporter: &dyn Reporter) -> Result<(), SyncError>;
}

/// How the downloader logs in.
#[derive(Clone, PartialEq, Eq)]
pub enum Login {
    Authenticated {
        username: String,
        password: Option<String>,
    },
    Anonymous,
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated { username, .. } => f
                .debug_struct("Authenticated")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl Login {
    /// Read credentials from the environment.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        )
    }

    /// Authenticated when a non-empty username is given, anonymous otherwise.
    pub fn from_values(username: Option<String>, password: Option<String>) -> Self {
        match username.filter(|u| !u.trim().is_empty()) {
            Some(username) if username != "anonymous" => Self::Authenticated {
                username,
                password: password.filter(|p| !p.is_empty()),
            },
            _ => Self::Anonymous,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::Authenticated { username, .. } => username,
            Self::Anonymous => "anonymous",
        }
    }
}

/// Runs `steamcmd` with one `+workshop_download_item` per mod.
#[derive(Debug, Clone)]
pub struct SteamCmd {
    program: String,
    app_id: String,
    install_dir: Option<PathBuf>,
    login: Login,
}

impl SteamCmd {
    pub fn new(config: &SyncConfig, login: Login) -> Self {
        Self {
            program: config.downloader.clone(),
            app_id: config.app_id.clone(),
            install_dir: config.install_dir.as_ref().map(|d| config.resolve(d)),
            login,
        }
    }

    /// Command-line arguments for downloading `ids`.
    pub fn args(&self, ids: &BTreeSet<ModId>) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + ids.len() * 3);

        // Must precede +login to take effect.
        if let Some(dir) = &self.install_dir {
            args.push("+force_install_dir".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }

        args.push("+login".to_string());
        args.push(self.login.username().to_string());
        if let Login::Authenticated {
            password: Some(password),
            ..
        } = &self.login
        {
            args.push(password.clone());
        }

        for id in ids {
            args.push("+workshop_download_item".to_string());
            args.push(self.app_id.clone());
            args.push(id.to_string());
        }
        args.push("+quit".to_string());
        args
    }

    /// Arguments safe to log.
    fn redacted_args(&self, ids: &BTreeSet<ModId>) -> Vec<String> {
        let mut args = self.args(ids);
        if let Login::Authenticated {
            password: Some(password),
            ..
        } = &self.login
        {
            for arg in &mut args {
                if arg == password {
                    *arg = "********".to_string();
                }
            }
        }
        args
    }
}

impl BulkDownloader for SteamCmd {
    fn download(&self, ids: &BTreeSet<ModId>, reporter: &dyn Reporter) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }

        let program = which::which(&self.program).map_err(|source| SyncError::DownloaderNotFound {
            program: self.program.clone(),
            source,
        })?;

        if self.login == Login::Anonymous {
            reporter.warning(&format!(
                "{USERNAME_ENV} is not set; logging in anonymously. Anonymous workshop downloads are heavily throttled."
            ));
        }
        reporter.section(&format!(
            "Updating {} mods via SteamCMD (as {})",
            ids.len(),
            self.login.username()
        ));
        tracing::debug!("{} {}", program.display(), self.redacted_args(ids).join(" "));

        let status = Command::new(&program)
            .args(self.args(ids))
            .status()
            .map_err(|source| SyncError::DownloaderSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SyncError::DownloaderFailed { status });
        }
        Ok(())
    }
}
