//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `init`: Initialize the data directory, store and registry
//! - `add`: Take files under management
//! - `remove`: Release files from management
//! - `list`: List managed files in various formats
//! - `sync`: Commit and push the content store
//! - `cleanup_backups`: Apply the backup retention policy
//! - `restore`: Restore a file from a backup
//! - `doctor`: Diagnose and repair lock, link and git problems
//! - `completions`: Generate shell completion scripts

pub mod add;
pub mod cleanup_backups;
pub mod completions;
pub mod doctor;
pub mod init;
pub mod list;
pub mod remove;
pub mod restore;
pub mod sync;

pub use add::AddCommand;
pub use cleanup_backups::CleanupBackupsCommand;
pub use completions::CompletionsCommand;
pub use doctor::DoctorCommand;
pub use init::InitCommand;
pub use list::ListCommand;
pub use remove::RemoveCommand;
pub use restore::RestoreCommand;
pub use sync::SyncCommand;
