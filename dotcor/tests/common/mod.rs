//! Common test utilities for integration tests.
//!
//! This module provides a throwaway home directory with a data directory,
//! content store and registry wired together the way the CLI does it.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dotcor::{
    BackupStore, Config, ConfigStore, DataDir, PathResolver, StoreContext, SymlinkManager,
};
use tempfile::TempDir;

/// An isolated home directory with an initialized dotcor data directory.
#[allow(dead_code)]
pub struct Fixture {
    _temp: TempDir,
    /// Canonical home directory.
    pub home: PathBuf,
    /// Data directory (`<home>/.dotcor`).
    pub data: DataDir,
    /// Context handed to the transaction builders.
    pub ctx: StoreContext,
}

impl Fixture {
    /// Build a fresh fixture with an empty registry saved to disk.
    #[allow(dead_code)]
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().canonicalize().unwrap();
        let data = DataDir::new(home.join(".dotcor"));
        data.ensure().unwrap();
        fs::create_dir_all(data.default_store_dir()).unwrap();

        let registry = ConfigStore::new(data.config_path(), Config::default());
        registry.save().unwrap();

        let ctx = StoreContext {
            links: SymlinkManager::new(PathResolver::new().with_home(&home)),
            backups: BackupStore::new(data.backups_dir()),
            registry: Rc::new(RefCell::new(registry)),
            store_root: data.default_store_dir(),
        };

        Self {
            _temp: temp,
            home,
            data,
            ctx,
        }
    }

    /// Write `contents` to `rel` under home, creating parents.
    #[allow(dead_code)]
    pub fn write_home_file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.home.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// The registry as currently persisted on disk.
    #[allow(dead_code)]
    pub fn saved_config(&self) -> Config {
        ConfigStore::load(self.data.config_path())
            .unwrap()
            .config()
            .clone()
    }

    /// Sorted list of every path under `dir`, relative to it.
    #[allow(dead_code)]
    pub fn snapshot(dir: &Path) -> Vec<String> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
            let Ok(entries) = fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                out.push(path.strip_prefix(root).unwrap().display().to_string());
                if entry.file_type().unwrap().is_dir() {
                    walk(root, &path, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(dir, dir, &mut out);
        out.sort();
        out
    }
}
