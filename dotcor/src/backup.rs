//! Timestamped backup snapshots.
//!
//! Backups live in `<data_dir>/backups/<YYYY-MM-DD_HH-MM-SS>/<file name>`.
//! Every snapshot is written with create-new semantics; when a bucket already
//! holds a file of the same name the copy is stored as `name_1.ext`,
//! `name_2.ext` and so on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::error::{Error, Result};
use crate::fs_ops::{copy_new_with_permissions, copy_with_permissions, dir_size};

/// `strftime` format of bucket directory names.
pub const BUCKET_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Upper bound on collision suffixes tried within one bucket.
const MAX_COLLISIONS: u32 = 10_000;

/// One snapshot file in the backup store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    /// Local time parsed from the bucket name.
    pub timestamp: NaiveDateTime,
    /// Name of the snapshot file, including any collision suffix.
    pub file_name: String,
    /// Full path of the snapshot file.
    pub path: PathBuf,
    /// Size of the snapshot in bytes.
    pub size: u64,
}

/// One timestamped bucket directory, the unit of retention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupBucket {
    /// Local time parsed from the bucket name.
    pub timestamp: NaiveDateTime,
    /// Bucket directory name.
    pub name: String,
    /// Bucket directory path.
    pub path: PathBuf,
    /// Number of snapshot files in the bucket.
    pub files: usize,
    /// Total size of the bucket.
    pub size: u64,
}

/// Outcome of [`BackupStore::cleanup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Number of buckets removed.
    pub deleted: usize,
    /// Number of snapshot files removed with them.
    pub deleted_files: usize,
    /// Bytes reclaimed.
    pub freed_bytes: u64,
}

/// Store of timestamped file snapshots.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Open the store rooted at `root`. The directory is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding the buckets.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot `source` into the bucket for the current second.
    ///
    /// Returns the path of the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] if `source` is missing,
    /// [`Error::Validation`] if it is not a regular file, or
    /// [`Error::CopyFailed`] if the copy fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dotcor::BackupStore;
    /// use std::path::Path;
    ///
    /// let store = BackupStore::new("/home/alice/.dotcor/backups");
    /// let snapshot = store.create(Path::new("/home/alice/.zshrc")).unwrap();
    /// println!("saved {}", snapshot.display());
    /// ```
    pub fn create(&self, source: &Path) -> Result<PathBuf> {
        let metadata = match fs::metadata(source) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound {
                    path: source.to_path_buf(),
                })
            }
            Err(e) => return Err(Error::from_io(source, e)),
        };
        if !metadata.is_file() {
            return Err(Error::Validation {
                field: "source".into(),
                message: format!("{} is not a regular file", source.display()),
            });
        }

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidPath {
                path: source.to_path_buf(),
                reason: "path has no file name".into(),
            })?;

        let bucket = self
            .root
            .join(Local::now().format(BUCKET_FORMAT).to_string());

        for n in 0..MAX_COLLISIONS {
            let candidate = bucket.join(collision_name(&file_name, n));
            match copy_new_with_permissions(source, &candidate) {
                Ok(_) => {
                    log::debug!(
                        "backed up {} to {}",
                        source.display(),
                        candidate.display()
                    );
                    return Ok(candidate);
                }
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }

        Err(Error::CopyFailed {
            from: source.to_path_buf(),
            to: bucket.join(&file_name),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no free backup name in bucket",
            ),
        })
    }

    /// Copy a snapshot back to `target`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupNotFound`] if `backup` does not exist, or
    /// [`Error::CopyFailed`] if the copy fails.
    pub fn restore(&self, backup: &Path, target: &Path) -> Result<()> {
        if !backup.is_file() {
            return Err(Error::BackupNotFound {
                path: backup.to_path_buf(),
            });
        }
        copy_with_permissions(backup, target)?;
        log::debug!("restored {} from {}", target.display(), backup.display());
        Ok(())
    }

    /// Bucket directories, newest first. Directories with unparseable names
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root exists but cannot be read.
    pub fn buckets(&self) -> Result<Vec<BackupBucket>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::from_io(&self.root, e)),
        };

        let mut buckets: Vec<BackupBucket> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let timestamp = NaiveDateTime::parse_from_str(&name, BUCKET_FORMAT).ok()?;
                let path = entry.path();
                let files = fs::read_dir(&path).map_or(0, |e| e.count());
                Some(BackupBucket {
                    timestamp,
                    size: dir_size(&path),
                    files,
                    name,
                    path,
                })
            })
            .collect();

        buckets.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.name.cmp(&a.name)));
        Ok(buckets)
    }

    /// Every snapshot, newest bucket first and in name order within a
    /// bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root exists but cannot be read.
    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        let mut snapshots = Vec::new();
        for bucket in self.buckets()? {
            let Ok(entries) = fs::read_dir(&bucket.path) else {
                log::debug!("skipping unreadable backup bucket {}", bucket.name);
                continue;
            };
            let mut files: Vec<BackupEntry> = entries
                .filter_map(std::result::Result::ok)
                .filter_map(|entry| {
                    let metadata = entry.metadata().ok()?;
                    metadata.is_file().then(|| BackupEntry {
                        timestamp: bucket.timestamp,
                        file_name: entry.file_name().to_string_lossy().into_owned(),
                        path: entry.path(),
                        size: metadata.len(),
                    })
                })
                .collect();
            files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
            snapshots.extend(files);
        }
        Ok(snapshots)
    }

    /// Snapshots of a file called `file_name`, newest first.
    ///
    /// Collision-suffixed copies (`name_1.ext`) are included; within a bucket
    /// they are returned in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root cannot be read.
    pub fn backups_of(&self, file_name: &str) -> Result<Vec<PathBuf>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|entry| is_backup_of(&entry.file_name, file_name))
            .map(|entry| entry.path)
            .collect())
    }

    /// Buckets that [`BackupStore::cleanup`] would delete.
    ///
    /// The newest `keep_last` buckets are always kept; of the rest, those
    /// older than `older_than` are selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root cannot be read.
    pub fn plan_cleanup(&self, older_than: Duration, keep_last: usize) -> Result<Vec<BackupBucket>> {
        let cutoff = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Local::now().naive_local().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return Ok(Vec::new());
        };

        Ok(self
            .buckets()?
            .into_iter()
            .skip(keep_last)
            .filter(|bucket| bucket.timestamp < cutoff)
            .collect())
    }

    /// Delete old buckets according to the retention policy.
    ///
    /// A bucket that cannot be removed is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root cannot be read.
    pub fn cleanup(&self, older_than: Duration, keep_last: usize) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        for bucket in self.plan_cleanup(older_than, keep_last)? {
            match fs::remove_dir_all(&bucket.path) {
                Ok(()) => {
                    report.deleted += 1;
                    report.deleted_files += bucket.files;
                    report.freed_bytes += bucket.size;
                    log::debug!("deleted backup bucket {}", bucket.name);
                }
                Err(e) => log::warn!("could not delete backup bucket {}: {e}", bucket.name),
            }
        }
        Ok(report)
    }

    /// Number of snapshot files.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root cannot be read.
    pub fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    /// Combined size of all snapshots in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup root cannot be read.
    pub fn total_size(&self) -> Result<u64> {
        Ok(self.list()?.iter().map(|entry| entry.size).sum())
    }
}

/// Split a file name into stem and extension, keeping dotfiles whole.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

fn collision_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    let (stem, ext) = split_name(name);
    format!("{stem}_{n}{ext}")
}

fn is_backup_of(candidate: &str, original: &str) -> bool {
    if candidate == original {
        return true;
    }
    let (stem, ext) = split_name(original);
    candidate
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(ext))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
