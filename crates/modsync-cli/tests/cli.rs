//! Integration tests for the modsync CLI binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway project directory with an isolated HOME
struct TestContext {
    temp_dir: TempDir,
    project: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let project = temp_dir.path().join("project");
        std::fs::create_dir_all(&project).expect("failed to create project");
        Self { temp_dir, project }
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.project.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.project.join(rel)
    }

    fn modsync_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_modsync");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("STEAM_USERNAME");
        cmd.env_remove("STEAM_PASSWORD");
        cmd.env_remove("MODSYNC_APP_ID");
        cmd.env_remove("MODSYNC_SCRATCH_CACHE");
        cmd.env_remove("RUST_LOG");
        cmd.env("MODSYNC_PROJECT", &self.project);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.modsync_cmd()
            .args(args)
            .output()
            .expect("failed to run modsync")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("sync"));
    assert!(stdout.contains("identify"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_resolve_without_source_list() {
    let ctx = TestContext::new();
    let output = ctx.run(&["resolve"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No external mods defined"));
}

#[test]
fn test_sync_dry_run_writes_nothing() {
    let ctx = TestContext::new();
    let output = ctx.run(&["sync", "--dry-run"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!ctx.path("mods.lock").exists());
    assert!(!ctx.path("addons").exists());
}

#[test]
fn test_sync_maintenance_removes_dropped_mods() {
    let ctx = TestContext::new();
    ctx.write("mod_sources.txt", "# all mods removed\n");
    ctx.write("addons/old.pbo", "old");
    ctx.write("keys/external.bikey", "key");
    ctx.write(
        "mods.lock",
        r#"{"mods": {"55555555": {"files": ["addons/old.pbo"], "name": "Old", "dependencies": [], "updated": "1"}}}"#,
    );
    ctx.write(".hemtt/launch.toml", "[default]\nworkshop = [\n    \"55555555\",\n]\n");

    let output = ctx.run(&["sync"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert!(!ctx.path("addons/old.pbo").exists());
    assert!(!ctx.path("keys/external.bikey").exists());
    assert!(ctx.path("keys").is_dir());

    let lock = std::fs::read_to_string(ctx.path("mods.lock")).unwrap();
    assert!(!lock.contains("55555555"));
    let launch = std::fs::read_to_string(ctx.path(".hemtt/launch.toml")).unwrap();
    assert_eq!(launch, "[default]\nworkshop = [\n]\n");
}

#[test]
fn test_check_with_empty_lock() {
    let ctx = TestContext::new();
    let output = ctx.run(&["check"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No mods locked"));
}

#[test]
fn test_identify_uses_project_cache() {
    let ctx = TestContext::new();
    let cache = Path::new("steamapps/workshop/content/107410");
    ctx.write(
        &cache.join("12345678/addons/core.pbo").to_string_lossy(),
        "pbo",
    );
    ctx.write("addons/core.pbo", "pbo");
    ctx.write("addons/mystery.pbo", "pbo");

    let output = ctx.run(&["identify"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = stdout(&output);
    assert!(stdout.contains("12345678"));
    assert!(stdout.contains("mystery.pbo"));
}

#[test]
fn test_invalid_config_file_fails() {
    let ctx = TestContext::new();
    ctx.write("modsync.toml", "no_such_setting = true\n");

    let output = ctx.run(&["resolve"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("modsync.toml"));
}
