//! Cross-process mutual exclusion for the data directory.
//!
//! A lock is a single record file (normally `<data_dir>/.lock`) created with
//! create-exclusive semantics. The record names the owning process and host
//! so a second invocation can tell a busy lock from one left behind by a
//! crash.
//!
//! # Examples
//!
//! ```no_run
//! use dotcor::lock::Lock;
//!
//! let lock = Lock::new("/home/alice/.dotcor");
//! lock.with_lock(|| {
//!     // mutate the content store here
//!     Ok(())
//! })
//! .unwrap();
//! ```

pub mod process;
pub mod record;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use crate::data_dir::LOCK_FILE_NAME;
use crate::error::{Error, Result};
use crate::fs_ops::ensure_parent;

pub use record::LockRecord;

/// Age after which a lock is considered abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// How often acquisition is retried when the record disappears mid-read.
const MAX_ACQUIRE_ATTEMPTS: usize = 5;

/// What [`Lock::probe`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// No record exists.
    Free,
    /// A live process holds the lock.
    Held(LockRecord),
    /// The owner is gone or the record is too old.
    Stale(LockRecord),
    /// The record exists but cannot be parsed; treated as stale.
    Malformed(String),
}

impl LockState {
    /// Whether `doctor --fix` may clear this lock.
    #[must_use]
    pub fn is_clearable(&self) -> bool {
        matches!(self, Self::Stale(_) | Self::Malformed(_))
    }
}

/// Handle to one lock file.
#[derive(Debug, Clone)]
pub struct Lock {
    path: PathBuf,
    stale_after: Duration,
}

impl Lock {
    /// Lock guarding the data directory `dir`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(LOCK_FILE_NAME))
    }

    /// Lock stored at exactly `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    /// Override the staleness threshold.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Location of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Age after which this lock counts as abandoned.
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Take the lock.
    ///
    /// The record is fully written to a temporary file and then moved into
    /// place without replacing an existing one, so readers never observe a
    /// partial record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockHeld`] if a live process owns the lock,
    /// [`Error::StaleLockDetected`] if the owner is gone, the record is
    /// older than the threshold or the record cannot be parsed (then without
    /// an owner pid), or an I/O error.
    pub fn acquire(&self) -> Result<LockGuard> {
        ensure_parent(&self.path).map_err(|e| Error::from_io(&self.path, e))?;

        for attempt in 0..MAX_ACQUIRE_ATTEMPTS {
            match self.try_create() {
                Ok(()) => {
                    log::debug!("acquired lock {}", self.path.display());
                    return Ok(LockGuard {
                        lock: self.clone(),
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(Error::from_io(&self.path, e)),
            }

            let record = match self.read_record() {
                Ok(record) => record,
                Err(Error::MalformedLockRecord { reason, .. }) => {
                    log::warn!("lock {} is malformed: {reason}", self.path.display());
                    return Err(Error::StaleLockDetected { owner_pid: None });
                }
                Err(e) => return Err(e),
            };
            match record {
                Some(record) if self.is_stale(&record) => {
                    return Err(Error::StaleLockDetected {
                        owner_pid: Some(record.pid),
                    })
                }
                Some(record) => {
                    return Err(Error::LockHeld {
                        owner_pid: record.pid,
                        owner_host: record.hostname,
                    })
                }
                None => log::debug!("lock record vanished, retrying (attempt {})", attempt + 1),
            }
        }

        Err(Error::Io(io::Error::other(format!(
            "lock {} kept changing while acquiring",
            self.path.display()
        ))))
    }

    fn try_create(&self) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".lock-")
            .tempfile_in(dir)?;
        temp.write_all(LockRecord::current().to_string().as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist_noclobber(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read and parse the current record. `None` if there is none.
    fn read_record(&self) -> Result<Option<LockRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::from_io(&self.path, e)),
        };
        LockRecord::parse(&text)
            .map(Some)
            .map_err(|reason| Error::MalformedLockRecord {
                path: self.path.clone(),
                reason,
            })
    }

    /// Remove the record if it belongs to this process.
    ///
    /// A missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOwner`] if another process owns the record,
    /// [`Error::MalformedLockRecord`] if it cannot be parsed, or an I/O error.
    pub fn release(&self) -> Result<()> {
        let Some(record) = self.read_record()? else {
            return Ok(());
        };
        let current_pid = std::process::id();
        if record.pid != current_pid {
            return Err(Error::NotOwner {
                owner_pid: record.pid,
                current_pid,
            });
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("released lock {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from_io(&self.path, e)),
        }
    }

    /// Whether `record` describes an abandoned lock.
    ///
    /// A record is stale when it is older than the threshold, or when it was
    /// written on this host by a process that no longer exists. Records from
    /// other hosts are judged by age alone.
    #[must_use]
    pub fn is_stale(&self, record: &LockRecord) -> bool {
        let age = Utc::now().signed_duration_since(record.created_at);
        let too_old = age
            .to_std()
            .is_ok_and(|age| age > self.stale_after);
        if too_old {
            return true;
        }
        if record.hostname.is_empty() || record.hostname == record::hostname() {
            return !process::is_alive(record.pid);
        }
        false
    }

    /// Inspect the lock without taking it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the record cannot be read.
    pub fn probe(&self) -> Result<LockState> {
        match self.read_record() {
            Ok(None) => Ok(LockState::Free),
            Ok(Some(record)) if self.is_stale(&record) => Ok(LockState::Stale(record)),
            Ok(Some(record)) => Ok(LockState::Held(record)),
            Err(Error::MalformedLockRecord { reason, .. }) => Ok(LockState::Malformed(reason)),
            Err(e) => Err(e),
        }
    }

    /// Run `f` while holding the lock.
    ///
    /// The lock is released whether or not `f` succeeds. A release failure
    /// is reported only when `f` itself succeeded.
    ///
    /// # Errors
    ///
    /// Returns the acquisition error, the error from `f`, or the release
    /// error, in that order of precedence.
    pub fn with_lock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let guard = self.acquire()?;
        let outcome = f();
        let released = guard.release();
        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(release_err)) => {
                log::warn!("failed to release lock after error: {release_err}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
        }
    }

    /// Delete the record regardless of owner.
    ///
    /// Meant for operator repair of stale or malformed locks. Returns whether
    /// a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the record exists but cannot be removed.
    pub fn force_clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::warn!("force-cleared lock {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::from_io(&self.path, e)),
        }
    }
}

/// Proof that the lock is held. Releasing happens on [`LockGuard::release`]
/// or on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    lock: Lock,
    released: bool,
}

impl LockGuard {
    /// The lock this guard holds.
    pub fn lock(&self) -> &Lock {
        &self.lock
    }

    /// Release the lock now, reporting failures.
    ///
    /// # Errors
    ///
    /// See [`Lock::release`].
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.lock.release() {
                log::warn!("failed to release lock {}: {e}", self.lock.path.display());
            }
        }
    }
}
