//! Utility functions for CLI operations.
//!
//! This module provides the pieces most commands share: opening the data
//! directory and registry, taking the lock, committing to git after a
//! change, judging link health, and formatting values for display.

use crate::error::CliError;
use chrono::{DateTime, Local, Utc};
use dotcor::config::ConfigStore;
use dotcor::{
    git, BackupStore, Config, DataDir, LinkState, Lock, LockGuard, ManagedFile, PathResolver,
    StoreContext, SymlinkManager,
};
use std::cell::{Ref, RefCell};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Resolve the data directory (flag, then environment, then default).
    pub fn resolve_data_dir(&self) -> Result<DataDir, CliError> {
        DataDir::resolve(self.data_dir.as_deref()).map_err(CliError::from)
    }

    /// Print a progress line unless `--quiet` is set.
    pub fn say(&self, message: impl Display) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

/// An opened data directory: its layout plus everything transactions need.
pub struct Session {
    /// Data directory layout.
    pub data: DataDir,
    /// Store context shared with the transaction builders.
    pub ctx: StoreContext,
}

impl Session {
    /// Open an initialized data directory and load its registry.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the directory has no registry, or the
    /// library error if the registry cannot be loaded.
    pub fn open(global: &GlobalOptions) -> Result<Self, CliError> {
        let data = global.resolve_data_dir()?;
        if !data.is_initialized() {
            return Err(CliError::NotInitialized(data.root().to_path_buf()));
        }
        let store = ConfigStore::load(data.config_path())?;
        let resolver = PathResolver::new();
        let store_root = resolver.expand(&store.config().repo_path)?;
        log::debug!(
            "opened {} (store at {})",
            data.root().display(),
            store_root.display()
        );

        let ctx = StoreContext {
            links: SymlinkManager::new(resolver),
            backups: BackupStore::new(data.backups_dir()),
            registry: Rc::new(RefCell::new(store)),
            store_root,
        };
        Ok(Self { data, ctx })
    }

    /// The loaded configuration.
    pub fn config(&self) -> Ref<'_, Config> {
        Ref::map(self.ctx.registry.borrow(), ConfigStore::config)
    }

    /// Path resolver for user-supplied paths.
    pub fn resolver(&self) -> &PathResolver {
        self.ctx.resolver()
    }

    /// Absolute content store directory.
    pub fn store_root(&self) -> &Path {
        &self.ctx.store_root
    }

    /// The data directory lock, with the configured staleness threshold.
    pub fn lock(&self) -> Lock {
        Lock::new(self.data.root()).with_stale_after(Duration::from_secs(
            self.config().lock_stale_after_secs,
        ))
    }

    /// Take the lock and re-read the registry under it.
    ///
    /// Every change to the store or registry goes through this, so entries
    /// saved by another process after [`Session::open`] are kept.
    pub fn acquire(&self) -> Result<LockGuard, CliError> {
        let guard = self.lock().acquire()?;
        if let Err(e) = self.ctx.registry.borrow_mut().reload() {
            if let Err(release_err) = guard.release() {
                log::warn!("failed to release lock after error: {release_err}");
            }
            return Err(e.into());
        }
        Ok(guard)
    }

    /// Run `f` while holding the lock, with a freshly loaded registry.
    pub fn with_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, CliError>,
    ) -> Result<T, CliError> {
        let guard = self.acquire()?;
        let outcome = f();
        match (outcome, guard.release()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), released) => {
                if let Err(release_err) = released {
                    log::warn!("failed to release lock after error: {release_err}");
                }
                Err(e)
            }
        }
    }

    /// Update and persist the `pending_commit` flag if it changed.
    pub fn set_pending_commit(&self, pending: bool) -> Result<(), CliError> {
        let mut store = self.ctx.registry.borrow_mut();
        if store.config().pending_commit != pending {
            store.config_mut().pending_commit = pending;
            store.save()?;
        }
        Ok(())
    }

    /// Whether git commits are enabled and possible for the store.
    pub fn git_ready(&self) -> bool {
        self.config().git_enabled && git::is_installed() && git::is_repo(self.store_root())
    }

    /// Commit the store after a successful change.
    ///
    /// A failed commit never undoes the change: it is reported and recorded
    /// in `pending_commit` so `sync` or `doctor --fix` can retry it.
    pub fn commit_changes(&self, global: &GlobalOptions, message: &str) -> Result<(), CliError> {
        if !self.git_ready() {
            log::debug!("git not available for the store; skipping commit");
            return Ok(());
        }
        match git::auto_commit(self.store_root(), message) {
            Ok(committed) => {
                if committed {
                    global.say("Committed to git");
                }
                self.set_pending_commit(false)
            }
            Err(e) => {
                log::warn!("git commit failed: {e:#}");
                eprintln!("Warning: git commit failed; run `dotcor sync` to retry");
                self.set_pending_commit(true)
            }
        }
    }
}

/// Commit message for a batch of entries: `<verb> <name>` or
/// `<verb> N dotfiles`.
pub fn commit_message(verb: &str, entries: &[ManagedFile]) -> String {
    match entries {
        [single] => {
            let name = single
                .repo_path
                .rsplit('/')
                .next()
                .unwrap_or(&single.repo_path);
            format!("{verb} {name}")
        }
        _ => format!("{verb} {} dotfiles", entries.len()),
    }
}

/// Health of one managed file's link, as shown by `list --status` and
/// `doctor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    /// Symlink pointing at the store copy.
    Ok,
    /// Nothing at the original location.
    Missing,
    /// A regular file or directory occupies the original location.
    NotSymlink,
    /// A symlink whose target does not exist.
    Broken,
    /// A symlink pointing somewhere other than the store copy.
    WrongTarget,
    /// The location could not be inspected.
    Error,
}

impl LinkHealth {
    /// Inspect the link for `entry`.
    pub fn check(ctx: &StoreContext, entry: &ManagedFile) -> Self {
        let Ok(link) = ctx.resolver().expand(&entry.source_path) else {
            return Self::Error;
        };
        let store_path = ctx.store_path(&entry.repo_path);
        match ctx.links.status(&link).map(|status| status.state()) {
            Ok(LinkState::Absent) => Self::Missing,
            Ok(LinkState::NotSymlink) => Self::NotSymlink,
            Ok(LinkState::BrokenSymlink) => Self::Broken,
            Ok(LinkState::ValidSymlink) => match ctx.links.points_to(&link, &store_path) {
                Ok(true) => Self::Ok,
                Ok(false) => Self::WrongTarget,
                Err(_) => Self::Error,
            },
            Err(e) => {
                log::debug!("cannot inspect {}: {e}", link.display());
                Self::Error
            }
        }
    }

    /// Label used in output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Missing => "missing",
            Self::NotSymlink => "not-symlink",
            Self::Broken => "broken",
            Self::WrongTarget => "wrong-target",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LinkHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an age such as `30d`, `2w`, `1m` (30 days) or `12h`.
pub fn parse_age(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let unit = s
        .chars()
        .last()
        .ok_or_else(|| "age must not be empty".to_string())?;
    let count: u64 = s[..s.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| format!("invalid age '{s}' (expected e.g. 30d, 2w, 1m, 12h)"))?;
    let hours = match unit {
        'h' => 1,
        'd' => 24,
        'w' => 24 * 7,
        'm' => 24 * 30,
        _ => return Err(format!("unknown age unit '{unit}' (use h, d, w or m)")),
    };
    count
        .checked_mul(hours * 3600)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("age '{s}' is too large"))
}

/// Format a timestamp for display in local time.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Format a byte count with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
