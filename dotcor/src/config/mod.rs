//! Registry of managed files and user settings.
//!
//! The registry lives in `<data_dir>/config.yaml`:
//!
//! ```yaml
//! version: 1
//! repo_path: ~/.dotcor/files
//! git_enabled: true
//! lock_stale_after_secs: 3600
//! backup_retention:
//!   older_than_days: 30
//!   keep_last: 5
//! pending_commit: false
//! managed_files:
//!   - source_path: ~/.zshrc
//!     repo_path: shell/zshrc
//!     added_at: 2024-01-15T10:30:45Z
//! ```
//!
//! Paths are stored in portable notation so the same file works on every
//! machine the store is cloned to.

pub mod repo_path;
pub mod schema;
pub mod store;

pub use repo_path::{
    applies_to_platform, current_platform, generate_repo_path, validate_repo_path,
};
pub use schema::{BackupRetention, Config, ManagedFile, CONFIG_VERSION, DEFAULT_REPO_PATH};
pub use store::{validate, ConfigStore};
