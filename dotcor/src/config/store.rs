//! Loading, validating and saving `config.yaml`.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::repo_path::validate_repo_path;
use crate::config::schema::{Config, ManagedFile, CONFIG_VERSION};
use crate::error::{Error, Result};
use crate::fs_ops::ensure_parent;

/// A registry bound to the file it was loaded from.
///
/// # Examples
///
/// ```no_run
/// use dotcor::config::{ConfigStore, ManagedFile};
///
/// let mut store = ConfigStore::load("/home/alice/.dotcor/config.yaml").unwrap();
/// store.add(ManagedFile::new("~/.zshrc", "shell/zshrc")).unwrap();
/// store.save().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Wrap an in-memory config that will be saved to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Load and validate the registry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file does not exist (the
    /// data directory has not been initialized), [`Error::Configuration`] if
    /// it is not valid YAML for the schema, [`Error::Validation`] if it
    /// fails validation, or an I/O error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path })
            }
            Err(e) => return Err(Error::from_io(&path, e)),
        };

        let config: Config = if text.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&text)?
        };
        validate(&config)?;
        log::debug!(
            "loaded {} managed files from {}",
            config.managed_files.len(),
            path.display()
        );
        Ok(Self { path, config })
    }

    /// Re-read the registry from disk, replacing the in-memory copy.
    ///
    /// Callers reload right after taking the lock so that changes saved by
    /// another process since [`ConfigStore::load`] are not overwritten.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigStore::load`]. On error the in-memory copy is kept.
    pub fn reload(&mut self) -> Result<()> {
        let fresh = Self::load(self.path.clone())?;
        self.config = fresh.config;
        Ok(())
    }

    /// Location of the registry file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the configuration. Call [`ConfigStore::save`] to
    /// persist changes.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Write the registry atomically.
    ///
    /// The YAML is written to a temporary file in the same directory and
    /// renamed over the registry, so readers see either the old or the new
    /// file.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the in-memory config is invalid, or an
    /// I/O error if writing fails.
    pub fn save(&self) -> Result<()> {
        validate(&self.config)?;
        let yaml = serde_yaml::to_string(&self.config)?;

        ensure_parent(&self.path).map_err(|e| Error::from_io(&self.path, e))?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::Builder::new()
            .prefix(".config-")
            .suffix(".yaml")
            .tempfile_in(dir)
            .map_err(|e| Error::from_io(dir, e))?;
        temp.write_all(yaml.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Error::from_io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| Error::from_io(&self.path, e.error))?;
        Ok(())
    }

    /// Add an entry in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyManaged`] if the source is registered, or a
    /// validation error for a bad or duplicate repo path.
    pub fn add(&mut self, entry: ManagedFile) -> Result<()> {
        if self.config.is_managed(&entry.source_path) {
            return Err(Error::AlreadyManaged {
                path: entry.source_path,
            });
        }
        validate_repo_path(&entry.repo_path)?;
        if let Some(other) = self.config.find_by_repo_path(&entry.repo_path) {
            return Err(Error::Validation {
                field: "repo_path".into(),
                message: format!(
                    "'{}' is already used by {}",
                    entry.repo_path, other.source_path
                ),
            });
        }
        self.config.managed_files.push(entry);
        Ok(())
    }

    /// Remove an entry in memory, returning its former index and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotManaged`] if the source is not registered.
    pub fn remove(&mut self, source: &str) -> Result<(usize, ManagedFile)> {
        let index = self
            .config
            .managed_files
            .iter()
            .position(|f| f.source_path == source)
            .ok_or_else(|| Error::NotManaged {
                path: source.to_string(),
            })?;
        Ok((index, self.config.managed_files.remove(index)))
    }

    /// Put an entry back at `index` (clamped to the list length).
    pub fn insert(&mut self, index: usize, entry: ManagedFile) {
        let index = index.min(self.config.managed_files.len());
        self.config.managed_files.insert(index, entry);
    }
}

/// Check a configuration for internal consistency.
///
/// # Errors
///
/// Returns [`Error::Validation`] for an unsupported version, an empty store
/// path, duplicate sources, or a repo path that leaves the store.
pub fn validate(config: &Config) -> Result<()> {
    if config.version == 0 || config.version > CONFIG_VERSION {
        return Err(Error::Validation {
            field: "version".into(),
            message: format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                config.version
            ),
        });
    }
    if config.repo_path.trim().is_empty() {
        return Err(Error::Validation {
            field: "repo_path".into(),
            message: "must not be empty".into(),
        });
    }

    let mut seen = HashSet::new();
    for file in &config.managed_files {
        if !seen.insert(file.source_path.as_str()) {
            return Err(Error::Validation {
                field: "managed_files".into(),
                message: format!("{} is listed more than once", file.source_path),
            });
        }
        validate_repo_path(&file.repo_path)?;
    }
    Ok(())
}
