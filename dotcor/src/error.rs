//! Error types for the dotcor library.
//!
//! Every fallible operation in the library returns [`Error`]. Variants are
//! grouped into four broad categories (see [`ErrorCategory`]) that drive how
//! callers react: validation and environment failures are reported as-is,
//! conflicts carry enough detail to decide whether to wait or repair, and
//! integrity failures mean something could not be put back the way it was.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a dotcor error.
///
/// # Examples
///
/// ```
/// use dotcor::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A precondition was not met (bad path, not a symlink, missing source).
    Validation,
    /// Another actor holds the resource, or the object is in the wrong state.
    Conflict,
    /// The platform or filesystem refused the request.
    Environment,
    /// State could not be restored or persisted state is corrupt.
    Integrity,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Environment => write!(f, "environment"),
            Self::Integrity => write!(f, "integrity"),
        }
    }
}

/// One inverse action that failed while a transaction was rolling back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackFailure {
    /// Description of the operation whose undo failed.
    pub description: String,
    /// Rendered error from the failed undo.
    pub message: String,
}

impl fmt::Display for RollbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undo {}: {}", self.description, self.message)
    }
}

fn join_failures(failures: &[RollbackFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn rollback_suffix(failures: &[RollbackFailure]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" (rollback incomplete: {})", join_failures(failures))
    }
}

fn describe_owner(pid: Option<u32>) -> String {
    pid.map_or_else(|| "unknown owner".to_string(), |pid| format!("pid {pid}"))
}

/// The main error type for the dotcor library.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid filesystem path was provided.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// No relative path exists between two locations.
    #[error("cannot compute path from {} to {}: {reason}", from.display(), to.display())]
    PathComputation {
        /// The starting location.
        from: PathBuf,
        /// The destination.
        to: PathBuf,
        /// Why no relative path exists.
        reason: String,
    },

    /// The path was expected to be a symlink but is not.
    #[error("not a symlink: {}", path.display())]
    NotASymlink {
        /// The offending path.
        path: PathBuf,
    },

    /// The source of a copy or backup does not exist.
    #[error("source not found: {}", path.display())]
    SourceNotFound {
        /// The missing source.
        path: PathBuf,
    },

    /// A backup snapshot does not exist.
    #[error("backup not found: {}", path.display())]
    BackupNotFound {
        /// The missing snapshot.
        path: PathBuf,
    },

    /// The file is already tracked in the registry.
    #[error("already managed: {path}")]
    AlreadyManaged {
        /// Portable form of the source path.
        path: String,
    },

    /// The file is not tracked in the registry.
    #[error("not managed: {path}")]
    NotManaged {
        /// Portable form of the source path.
        path: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A configuration file could not be parsed or written.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// The registry file does not exist.
    #[error("configuration error: {} not found; run `dotcor init` first", path.display())]
    ConfigNotFound {
        /// Expected location of `config.yaml`.
        path: PathBuf,
    },

    /// The lock is held by a live process.
    #[error("lock held by pid {owner_pid} on {owner_host}")]
    LockHeld {
        /// Process id recorded in the lock.
        owner_pid: u32,
        /// Host name recorded in the lock.
        owner_host: String,
    },

    /// The lock record belongs to a dead process, is too old or cannot be
    /// parsed.
    #[error("stale lock detected ({}); run `dotcor doctor --fix` to clear it", describe_owner(*.owner_pid))]
    StaleLockDetected {
        /// Process id recorded in the stale lock, if readable.
        owner_pid: Option<u32>,
    },

    /// Release was attempted by a process that does not own the lock.
    #[error("lock is owned by pid {owner_pid}, not by pid {current_pid}")]
    NotOwner {
        /// Process id recorded in the lock.
        owner_pid: u32,
        /// Process id of the caller.
        current_pid: u32,
    },

    /// The transaction no longer accepts work.
    #[error("transaction is {state}")]
    TransactionClosed {
        /// The terminal state the transaction is in.
        state: String,
    },

    /// Rollback was requested after commit.
    #[error("cannot roll back a committed transaction")]
    CannotRollbackCommitted,

    /// Symbolic links cannot be created on this system.
    #[error("symlinks are not supported here: {reason}")]
    SymlinkUnsupported {
        /// Why the capability probe failed.
        reason: String,
    },

    /// Creating a symbolic link failed.
    #[error("failed to create symlink {}: {source}", link.display())]
    SymlinkCreation {
        /// The link that could not be created.
        link: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Copying a file failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        /// Copy source.
        from: PathBuf,
        /// Copy destination.
        to: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Permission denied accessing a path.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        /// The path that could not be accessed.
        path: PathBuf,
    },

    /// The lock record could not be parsed.
    #[error("malformed lock record {}: {reason}", path.display())]
    MalformedLockRecord {
        /// Location of the record.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// A transaction step failed; earlier steps were rolled back.
    #[error("{description}: {source}{}", rollback_suffix(rollback_failures))]
    OperationFailed {
        /// Description of the failing step.
        description: String,
        /// The error raised by the step.
        #[source]
        source: Box<Error>,
        /// Undo actions that failed during the automatic rollback.
        rollback_failures: Vec<RollbackFailure>,
    },

    /// One or more inverse actions failed during rollback.
    #[error("rollback incomplete: {}", join_failures(failures))]
    RollbackIncomplete {
        /// Every undo that failed, most recent operation first.
        failures: Vec<RollbackFailure>,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotcor::{Error, ErrorCategory};
    ///
    /// let err = Error::LockHeld { owner_pid: 42, owner_host: "box".into() };
    /// assert_eq!(err.category(), ErrorCategory::Conflict);
    /// ```
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPath { .. }
            | Self::PathComputation { .. }
            | Self::NotASymlink { .. }
            | Self::SourceNotFound { .. }
            | Self::BackupNotFound { .. }
            | Self::AlreadyManaged { .. }
            | Self::NotManaged { .. }
            | Self::Validation { .. }
            | Self::Configuration(_)
            | Self::ConfigNotFound { .. } => ErrorCategory::Validation,
            Self::LockHeld { .. }
            | Self::StaleLockDetected { .. }
            | Self::NotOwner { .. }
            | Self::TransactionClosed { .. }
            | Self::CannotRollbackCommitted => ErrorCategory::Conflict,
            Self::SymlinkUnsupported { .. }
            | Self::SymlinkCreation { .. }
            | Self::CopyFailed { .. }
            | Self::PermissionDenied { .. }
            | Self::Io(_) => ErrorCategory::Environment,
            Self::MalformedLockRecord { .. } | Self::RollbackIncomplete { .. } => {
                ErrorCategory::Integrity
            }
            Self::OperationFailed {
                source,
                rollback_failures,
                ..
            } => {
                if rollback_failures.is_empty() {
                    source.category()
                } else {
                    ErrorCategory::Integrity
                }
            }
        }
    }

    /// Check if error indicates a path does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotcor::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::SourceNotFound { path: PathBuf::from("/nonexistent") };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::SourceNotFound { .. }
            | Self::BackupNotFound { .. }
            | Self::ConfigNotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::OperationFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if error is permission-related.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotcor::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::PermissionDenied { path: PathBuf::from("/restricted") };
    /// assert!(err.is_permission_denied());
    /// ```
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::PermissionDenied { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Map an I/O error on `path`, turning permission failures into
    /// [`Error::PermissionDenied`].
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_error() {
        let err = Error::InvalidPath {
            path: PathBuf::from("/invalid/path"),
            reason: "escapes root".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("invalid path"));
        let normalized = display.replace(std::path::MAIN_SEPARATOR, "/");
        assert!(normalized.contains("/invalid/path"));
        assert!(display.contains("escapes root"));
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_lock_held_error() {
        let err = Error::LockHeld {
            owner_pid: 4242,
            owner_host: "workstation".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("4242"));
        assert!(display.contains("workstation"));
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_stale_lock_error_without_pid() {
        let err = Error::StaleLockDetected { owner_pid: None };
        assert!(format!("{err}").contains("unknown owner"));

        let err = Error::StaleLockDetected {
            owner_pid: Some(17),
        };
        assert!(format!("{err}").contains("pid 17"));
    }

    #[test]
    fn test_not_owner_error() {
        let err = Error::NotOwner {
            owner_pid: 1,
            current_pid: 2,
        };
        let display = format!("{err}");
        assert!(display.contains("pid 1"));
        assert!(display.contains("pid 2"));
    }

    #[test]
    fn test_operation_failed_names_step() {
        let err = Error::OperationFailed {
            description: "add ~/.zshrc to registry".to_string(),
            source: Box::new(Error::Validation {
                field: "registry".to_string(),
                message: "boom".to_string(),
            }),
            rollback_failures: Vec::new(),
        };
        let display = format!("{err}");
        assert!(display.starts_with("add ~/.zshrc to registry"));
        assert!(!display.contains("rollback incomplete"));
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_operation_failed_with_rollback_failures_is_integrity() {
        let err = Error::OperationFailed {
            description: "create symlink".to_string(),
            source: Box::new(Error::Io(std::io::Error::other("disk full"))),
            rollback_failures: vec![RollbackFailure {
                description: "move a to b".to_string(),
                message: "gone".to_string(),
            }],
        };
        let display = format!("{err}");
        assert!(display.contains("rollback incomplete"));
        assert!(display.contains("undo move a to b: gone"));
        assert_eq!(err.category(), ErrorCategory::Integrity);
    }

    #[test]
    fn test_rollback_incomplete_lists_every_failure() {
        let err = Error::RollbackIncomplete {
            failures: vec![
                RollbackFailure {
                    description: "first".to_string(),
                    message: "a".to_string(),
                },
                RollbackFailure {
                    description: "second".to_string(),
                    message: "b".to_string(),
                },
            ],
        };
        let display = format!("{err}");
        assert!(display.contains("undo first: a"));
        assert!(display.contains("undo second: b"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(format!("{err}").contains("I/O error"));
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::Environment);
    }

    #[test]
    fn test_from_io_maps_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = Error::from_io(std::path::Path::new("/root/secret"), io_err);
        assert!(matches!(err, Error::PermissionDenied { .. }));
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Integrity.to_string(), "integrity");
    }
}
