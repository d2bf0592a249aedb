//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with an isolated home and data directory
//! - Command builder helpers for common patterns
//! - Registry and lock fixtures

use assert_cmd::Command;
use dotcor::config::ConfigStore;
use dotcor::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with an isolated home and data directory.
///
/// Every command runs with `HOME` pointing at a fresh directory, so path
/// notation (`~/...`) and symlinks stay inside the sandbox.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Fake home directory (canonical)
    pub home: PathBuf,
    /// Path to the dotcor data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// The home directory exists; the data directory does not (init creates
    /// it).
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir");
        let home = root.join("home");
        fs::create_dir_all(&home).expect("Failed to create home");
        let data_dir = root.join("dotcor-data");

        Self {
            temp_dir,
            home,
            data_dir,
        }
    }

    /// Create an environment and run `init --no-git` in it.
    pub fn initialized() -> Self {
        let env = Self::new();
        env.command()
            .args(["init", "--no-git"])
            .assert()
            .success();
        env
    }

    /// Get a command builder without `--data-dir`.
    ///
    /// The environment is scrubbed of variables that would leak the real
    /// user's setup into the test.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("dotcor").expect("Failed to find dotcor binary");
        cmd.env("HOME", &self.home)
            .env_remove("DOTCOR_DATA_DIR")
            .env_remove("DOTCOR_LOG_MODE")
            .env_remove("DOTCOR_OUTPUT_FORMAT")
            .env("GIT_AUTHOR_NAME", "dotcor test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "dotcor test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .current_dir(&self.home);
        cmd
    }

    /// Get a command builder with the data directory pre-configured.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Write `contents` to `rel` under home, creating parents.
    pub fn write_home_file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.home.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Default content store directory.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    /// Backup root directory.
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// The registry as currently persisted.
    pub fn config(&self) -> Config {
        ConfigStore::load(self.data_dir.join("config.yaml"))
            .expect("Failed to load config")
            .config()
            .clone()
    }

    /// Apply `edit` to the persisted registry.
    pub fn edit_config(&self, edit: impl FnOnce(&mut Config)) {
        let mut store =
            ConfigStore::load(self.data_dir.join("config.yaml")).expect("Failed to load config");
        edit(store.config_mut());
        store.save().expect("Failed to save config");
    }

    /// Write a raw lock record.
    pub fn write_lock(&self, contents: &str) {
        fs::write(self.data_dir.join(".lock"), contents).unwrap();
    }

    /// Whether a lock record exists.
    pub fn lock_exists(&self) -> bool {
        self.data_dir.join(".lock").exists()
    }

    /// Add files through the CLI, asserting success.
    pub fn add(&self, files: &[&Path]) {
        self.command().arg("add").args(files).assert().success();
    }
}

/// Whether `path` is a symlink resolving to `expected`.
#[allow(dead_code)]
pub fn links_to(path: &Path, expected: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
        && path
            .canonicalize()
            .is_ok_and(|resolved| expected.canonicalize().is_ok_and(|e| e == resolved))
}
