//! File primitives shared by the backup store and transaction operations.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Create the parent directory of `path` if it has one.
pub(crate) fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn copy_failed(from: &Path, to: &Path, source: io::Error) -> Error {
    Error::CopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}

/// Copy `from` to `to`, keeping permissions and modification time.
///
/// Parent directories of `to` are created. An existing file at `to` is
/// overwritten. Returns the number of bytes copied.
///
/// # Errors
///
/// Returns [`Error::SourceNotFound`] if `from` is missing, or
/// [`Error::CopyFailed`] for any other failure.
pub fn copy_with_permissions(from: &Path, to: &Path) -> Result<u64> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    copy_into(from, to, &options)
}

/// Like [`copy_with_permissions`] but refuses to replace an existing file.
///
/// The destination is opened with create-new semantics, so two writers can
/// never end up sharing a destination. An `AlreadyExists` failure is returned
/// as a plain [`Error::Io`] so callers can pick another name.
///
/// # Errors
///
/// Returns [`Error::SourceNotFound`] if `from` is missing, [`Error::Io`]
/// with kind `AlreadyExists` if `to` exists, or [`Error::CopyFailed`].
pub fn copy_new_with_permissions(from: &Path, to: &Path) -> Result<u64> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    copy_into(from, to, &options)
}

fn copy_into(from: &Path, to: &Path, options: &OpenOptions) -> Result<u64> {
    let metadata = match fs::metadata(from) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::SourceNotFound {
                path: from.to_path_buf(),
            })
        }
        Err(e) => return Err(Error::from_io(from, e)),
    };
    ensure_parent(to).map_err(|e| copy_failed(from, to, e))?;

    let mut dest = match options.open(to) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(Error::Io(e)),
        Err(e) => return Err(copy_failed(from, to, e)),
    };

    // Timestamp goes on through the open handle, before the permission bits
    // can make the file read-only.
    let copied = File::open(from)
        .and_then(|mut src| io::copy(&mut src, &mut dest))
        .and_then(|bytes| {
            dest.set_modified(metadata.modified()?)?;
            Ok(bytes)
        });
    drop(dest);

    match copied {
        Ok(bytes) => {
            fs::set_permissions(to, metadata.permissions())
                .map_err(|e| copy_failed(from, to, e))?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(to);
            Err(copy_failed(from, to, e))
        }
    }
}

/// Move a file, falling back to copy-and-delete across filesystems.
///
/// Parent directories of `to` are created.
///
/// # Errors
///
/// Returns [`Error::SourceNotFound`] if `from` is missing, or an error from
/// the rename or fallback copy.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::symlink_metadata(from).is_err() {
        return Err(Error::SourceNotFound {
            path: from.to_path_buf(),
        });
    }
    ensure_parent(to).map_err(|e| Error::from_io(to, e))?;

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            log::debug!(
                "rename {} -> {} failed ({rename_err}); copying instead",
                from.display(),
                to.display()
            );
            copy_with_permissions(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(Error::from_io(from, e));
            }
            Ok(())
        }
    }
}

/// Total size in bytes of a file or directory tree. Symlinks are not followed.
#[must_use]
pub fn dir_size(path: &Path) -> u64 {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return 0;
    };
    if !metadata.is_dir() {
        return metadata.len();
    }
    fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .map(|entry| dir_size(&entry.path()))
                .sum()
        })
        .unwrap_or(0)
}

/// Whether `dir` exists and has no entries.
///
/// # Errors
///
/// Returns the I/O error from reading the directory.
pub fn is_dir_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Remove `dir` and its ancestors while they are empty, stopping at `stop_at`.
///
/// `stop_at` itself is never removed.
pub fn remove_empty_parents(dir: &Path, stop_at: &Path) {
    let mut current = dir.to_path_buf();
    while current.starts_with(stop_at) && current != stop_at {
        if !matches!(is_dir_empty(&current), Ok(true)) || fs::remove_dir(&current).is_err() {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
}
