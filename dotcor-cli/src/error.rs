//! CLI-specific error types with exit codes.
//!
//! This module defines error types specific to the CLI layer,
//! wrapping library errors and providing appropriate exit codes.

use dotcor::{Error as LibError, ErrorCategory};
use std::fmt;
use std::path::PathBuf;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// The data directory has no registry yet.
    NotInitialized(PathBuf),

    /// Configuration error.
    Config(String),

    /// A git command failed.
    Git(String),

    /// `doctor` found problems it did not fix.
    Unhealthy(usize),

    /// Some items of a multi-file command failed.
    Batch {
        /// Number of items that failed.
        failed: usize,
        /// Number of items attempted.
        total: usize,
        /// The first failure, which decides the exit code.
        first: LibError,
    },
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: Validation failure (bad input, unmanaged file, ...)
    /// - 2: Conflict (lock held, stale lock, closed transaction)
    /// - 3: Environment (no data directory, symlinks unsupported, ...)
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Integrity (rollback incomplete, malformed lock record)
    /// - 7: Configuration error
    /// - 8: Git failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Library(lib_err) | CliError::Batch { first: lib_err, .. } => {
                library_exit_code(lib_err)
            }
            CliError::Unhealthy(_) => 1,
            CliError::NotInitialized(_) => 3,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Config(_) => 7,
            CliError::Git(_) => 8,
        }
    }
}

fn library_exit_code(err: &LibError) -> i32 {
    match err {
        LibError::Configuration(_) | LibError::ConfigNotFound { .. } => 7,
        LibError::Io(_) => 5,
        _ => match err.category() {
            ErrorCategory::Validation => 1,
            ErrorCategory::Conflict => 2,
            ErrorCategory::Environment => 3,
            ErrorCategory::Integrity => 6,
        },
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::NotInitialized(path) => write!(
                f,
                "{} is not initialized (run `dotcor init` first)",
                path.display()
            ),
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::Git(msg) => write!(f, "Git error: {msg}"),
            CliError::Unhealthy(count) => write!(f, "{count} problem(s) remaining"),
            CliError::Batch {
                failed,
                total,
                first,
            } => write!(f, "{failed} of {total} file(s) failed; first error: {first}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) | CliError::Batch { first: e, .. } => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        CliError::Library(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        CliError::Git(format!("{e:#}"))
    }
}

/// Turn per-item failures into the command's result.
pub fn batch_result(mut failures: Vec<LibError>, total: usize) -> Result<(), CliError> {
    match failures.len() {
        0 => Ok(()),
        1 if total == 1 => Err(CliError::Library(failures.remove(0))),
        failed => Err(CliError::Batch {
            failed,
            total,
            first: failures.remove(0),
        }),
    }
}
