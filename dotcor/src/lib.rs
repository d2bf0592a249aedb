#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # dotcor
//!
//! A library for managing dotfiles through a symlinked content store.
//!
//! Managed files are moved into a content store (normally
//! `~/.dotcor/files`, a git repository) and replaced by relative symlinks.
//! Every multi-step change runs inside a [`Transaction`] that undoes
//! completed steps when a later one fails, and every mutation of the store
//! happens under a cross-process [`Lock`].
//!
//! ## Core Types
//!
//! - [`PathResolver`]: portable (`~/...`) and absolute path conversion
//! - [`SymlinkManager`]: relative symlink creation and inspection
//! - [`BackupStore`]: timestamped snapshots taken before destructive steps
//! - [`Lock`] and [`LockGuard`]: mutual exclusion for the data directory
//! - [`Transaction`] and [`Operation`]: reversible multi-step changes
//! - [`Config`] and [`ConfigStore`]: the registry of managed files
//! - [`Error`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use dotcor::PathResolver;
//! use std::path::PathBuf;
//!
//! let resolver = PathResolver::new().with_home("/home/alice");
//! assert_eq!(
//!     resolver.expand("~/.zshrc").unwrap(),
//!     PathBuf::from("/home/alice/.zshrc")
//! );
//! assert_eq!(
//!     resolver.relative_target("~/.zshrc", "~/.dotcor/files/shell/zshrc").unwrap(),
//!     PathBuf::from(".dotcor/files/shell/zshrc")
//! );
//! ```

pub mod backup;
pub mod config;
pub mod data_dir;
pub mod error;
pub mod fs_ops;
pub mod git;
pub mod lock;
pub mod logging;
pub mod path;
pub mod symlink;
pub mod transaction;

// Re-export key types at crate root for convenience
pub use backup::{BackupBucket, BackupEntry, BackupStore, CleanupReport};
pub use config::{Config, ConfigStore, ManagedFile};
pub use data_dir::DataDir;
pub use error::{Error, ErrorCategory, Result, RollbackFailure};
pub use lock::{Lock, LockGuard, LockState, DEFAULT_STALE_AFTER};
pub use logging::{init_logger, LogLevel, Logger};
pub use path::PathResolver;
pub use symlink::{LinkState, SymlinkManager, SymlinkStatus};
pub use transaction::builders::{
    add_file_transaction, link_file_transaction, remove_file_transaction, StoreContext,
};
pub use transaction::operations::SharedRegistry;
pub use transaction::{Operation, Transaction, TransactionState};
