//! Registry schema.
//!
//! `config.yaml` holds both the user's settings and the list of managed
//! files. Unknown keys are rejected so typos surface at load time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current on-disk schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Default content store location, in portable notation.
pub const DEFAULT_REPO_PATH: &str = "~/.dotcor/files";

/// Complete registry and settings.
///
/// # Examples
///
/// ```
/// use dotcor::config::Config;
///
/// let config = Config::default();
/// assert!(config.git_enabled);
/// assert!(config.managed_files.is_empty());
/// assert_eq!(config.backup_retention.keep_last, 5);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Content store directory (portable notation).
    #[serde(default = "default_repo_path")]
    pub repo_path: String,

    /// Whether changes are committed to git.
    #[serde(default = "default_true")]
    pub git_enabled: bool,

    /// Remote pushed to by `sync`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_remote: Option<String>,

    /// Age in seconds after which a lock is treated as abandoned.
    #[serde(default = "default_lock_stale_after")]
    pub lock_stale_after_secs: u64,

    /// Retention policy for `cleanup-backups`.
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Set when a git commit failed after a successful change.
    #[serde(default)]
    pub pending_commit: bool,

    /// Files under management.
    #[serde(default)]
    pub managed_files: Vec<ManagedFile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            repo_path: DEFAULT_REPO_PATH.to_string(),
            git_enabled: true,
            git_remote: None,
            lock_stale_after_secs: default_lock_stale_after(),
            backup_retention: BackupRetention::default(),
            pending_commit: false,
            managed_files: Vec::new(),
        }
    }
}

impl Config {
    /// The entry whose source path is `source` (portable notation).
    #[must_use]
    pub fn find(&self, source: &str) -> Option<&ManagedFile> {
        self.managed_files.iter().find(|f| f.source_path == source)
    }

    /// Whether `source` is already managed.
    #[must_use]
    pub fn is_managed(&self, source: &str) -> bool {
        self.find(source).is_some()
    }

    /// The entry stored at `repo_path` inside the content store.
    #[must_use]
    pub fn find_by_repo_path(&self, repo_path: &str) -> Option<&ManagedFile> {
        self.managed_files.iter().find(|f| f.repo_path == repo_path)
    }

    /// Entries that apply to the running platform.
    pub fn files_for_current_platform(&self) -> impl Iterator<Item = &ManagedFile> {
        self.managed_files.iter().filter(|f| f.applies_here())
    }
}

/// Retention policy for backups.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BackupRetention {
    /// Buckets older than this many days are eligible for deletion.
    pub older_than_days: u32,
    /// This many newest buckets are always kept.
    pub keep_last: usize,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            older_than_days: 30,
            keep_last: 5,
        }
    }
}

/// One file under management.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManagedFile {
    /// Original location in portable notation, e.g. `~/.zshrc`.
    pub source_path: String,
    /// Location inside the content store, e.g. `shell/zshrc`.
    pub repo_path: String,
    /// When the file was added.
    pub added_at: DateTime<Utc>,
    /// Platforms the file is linked on; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
}

impl ManagedFile {
    /// A new entry stamped now, applying to all platforms.
    #[must_use]
    pub fn new(source_path: impl Into<String>, repo_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            repo_path: repo_path.into(),
            added_at: Utc::now(),
            platforms: Vec::new(),
        }
    }

    /// Whether the entry should be linked on the running platform.
    #[must_use]
    pub fn applies_here(&self) -> bool {
        super::repo_path::applies_to_platform(&self.platforms)
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_repo_path() -> String {
    DEFAULT_REPO_PATH.to_string()
}

fn default_true() -> bool {
    true
}

fn default_lock_stale_after() -> u64 {
    crate::lock::DEFAULT_STALE_AFTER.as_secs()
}
