//! Data directory layout.
//!
//! Everything dotcor persists lives under one root (by default `~/.dotcor`):
//!
//! ```text
//! ~/.dotcor/
//! ├── .lock                         lock record (pid, timestamp, host)
//! ├── config.yaml                   registry and settings
//! ├── backups/2024-01-15_10-30-45/  one bucket per second
//! └── files/                        default content store
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the data directory location.
pub const DATA_DIR_ENV: &str = "DOTCOR_DATA_DIR";

/// Name of the lock record file.
pub const LOCK_FILE_NAME: &str = ".lock";

/// Name of the registry file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the backup root directory.
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Name of the default content store directory.
pub const FILES_DIR_NAME: &str = "files";

/// Paths inside a dotcor data directory.
///
/// # Examples
///
/// ```
/// use dotcor::DataDir;
///
/// let data = DataDir::new("/tmp/dotcor-data");
/// assert!(data.lock_path().ends_with(".lock"));
/// assert!(data.config_path().ends_with("config.yaml"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Wraps an explicit root directory.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolves the data directory.
    ///
    /// The resolution order is:
    /// 1. `explicit`, when given (the CLI's `--data-dir`)
    /// 2. `$DOTCOR_DATA_DIR`
    /// 3. `~/.dotcor`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined and no
    /// override is present.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(path)));
        }
        default_data_dir().map(Self::new)
    }

    /// Root of the data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the lock record.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// Location of the registry file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Root of the backup buckets.
    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR_NAME)
    }

    /// Default content store location.
    #[must_use]
    pub fn default_store_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR_NAME)
    }

    /// Whether the directory has been initialized with a registry.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.config_path().is_file()
    }

    /// Creates the root and backup directories if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(self.backups_dir()).map_err(|e| Error::from_io(&self.root, e))
    }
}

/// Returns the default data directory, `~/.dotcor`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_data_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|home| home.join(".dotcor"))
        .ok_or_else(|| Error::Validation {
            field: "home_directory".into(),
            message: "Cannot determine home directory".into(),
        })
}
