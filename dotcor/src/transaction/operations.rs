//! Concrete reversible operations.
//!
//! Every operation captures what it needs to undo itself while executing:
//! the raw target of a removed link, the backup of a deleted or overwritten
//! file, the registry entry it removed. Operations that destroy data take a
//! backup first and refuse to proceed when the backup fails.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backup::BackupStore;
use crate::config::{ConfigStore, ManagedFile};
use crate::error::{Error, Result};
use crate::fs_ops::{copy_with_permissions, ensure_parent, is_dir_empty, move_file};
use crate::symlink::SymlinkManager;
use crate::transaction::Operation;

/// Registry shared between the operations of one transaction.
pub type SharedRegistry = Rc<RefCell<ConfigStore>>;

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn destination_taken(path: &Path) -> Error {
    Error::Validation {
        field: "destination".into(),
        message: format!("{} already exists", path.display()),
    }
}

/// Move a file; undo moves it back.
///
/// An existing destination is an error unless overwriting was enabled with
/// [`MoveFile::overwriting`], in which case the displaced file is backed up
/// and restored on undo.
#[derive(Debug)]
pub struct MoveFile {
    from: PathBuf,
    to: PathBuf,
    backups: Option<BackupStore>,
    displaced: Option<PathBuf>,
}

impl MoveFile {
    /// Move `from` to `to`.
    #[must_use]
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            backups: None,
            displaced: None,
        }
    }

    /// Allow replacing an existing destination after backing it up.
    #[must_use]
    pub fn overwriting(mut self, backups: BackupStore) -> Self {
        self.backups = Some(backups);
        self
    }
}

impl Operation for MoveFile {
    fn execute(&mut self) -> Result<()> {
        if exists(&self.to) {
            let Some(backups) = &self.backups else {
                return Err(destination_taken(&self.to));
            };
            let backup = backups.create(&self.to)?;
            fs::remove_file(&self.to).map_err(|e| Error::from_io(&self.to, e))?;
            self.displaced = Some(backup);
        }
        if let Err(e) = move_file(&self.from, &self.to) {
            if let (Some(backup), Some(backups)) = (self.displaced.take(), &self.backups) {
                backups.restore(&backup, &self.to)?;
            }
            return Err(e);
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        move_file(&self.to, &self.from)?;
        if let (Some(backup), Some(backups)) = (self.displaced.take(), &self.backups) {
            backups.restore(&backup, &self.to)?;
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("move {} to {}", self.from.display(), self.to.display())
    }
}

/// Copy a file to a new location; undo deletes the copy.
#[derive(Debug)]
pub struct CopyFile {
    from: PathBuf,
    to: PathBuf,
}

impl CopyFile {
    /// Copy `from` to `to`. The destination must not exist.
    #[must_use]
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Operation for CopyFile {
    fn execute(&mut self) -> Result<()> {
        if exists(&self.to) {
            return Err(destination_taken(&self.to));
        }
        copy_with_permissions(&self.from, &self.to).map(|_| ())
    }

    fn undo(&mut self) -> Result<()> {
        fs::remove_file(&self.to).map_err(|e| Error::from_io(&self.to, e))
    }

    fn description(&self) -> String {
        format!("copy {} to {}", self.from.display(), self.to.display())
    }
}

/// Create a relative symlink; undo removes it and puts back any link it
/// replaced.
#[derive(Debug)]
pub struct CreateSymlink {
    target: PathBuf,
    link: PathBuf,
    links: SymlinkManager,
    replaced: Option<PathBuf>,
}

impl CreateSymlink {
    /// Link `link` to `target`.
    #[must_use]
    pub fn new(links: SymlinkManager, target: impl Into<PathBuf>, link: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            link: link.into(),
            links,
            replaced: None,
        }
    }
}

impl Operation for CreateSymlink {
    fn execute(&mut self) -> Result<()> {
        let status = self.links.status(&self.link)?;
        if status.exists && !status.is_symlink {
            return Err(destination_taken(&self.link));
        }
        self.replaced = status.target;
        self.links.create(&self.target, &self.link)
    }

    fn undo(&mut self) -> Result<()> {
        match self.replaced.take() {
            Some(raw) => self.links.create_raw(&raw, &self.link),
            None => self.links.remove(&self.link),
        }
    }

    fn description(&self) -> String {
        format!(
            "link {} to {}",
            self.link.display(),
            self.target.display()
        )
    }
}

/// Remove a symlink; undo re-creates it with the same raw target.
#[derive(Debug)]
pub struct RemoveSymlink {
    link: PathBuf,
    links: SymlinkManager,
    saved_target: Option<PathBuf>,
}

impl RemoveSymlink {
    /// Remove the symlink at `link`.
    #[must_use]
    pub fn new(links: SymlinkManager, link: impl Into<PathBuf>) -> Self {
        Self {
            link: link.into(),
            links,
            saved_target: None,
        }
    }
}

impl Operation for RemoveSymlink {
    fn execute(&mut self) -> Result<()> {
        let raw = self.links.read_target(&self.link)?;
        self.links.remove(&self.link)?;
        self.saved_target = Some(raw);
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let raw = self.saved_target.take().ok_or_else(|| Error::Validation {
            field: "link".into(),
            message: "no saved target to restore".into(),
        })?;
        self.links.create_raw(&raw, &self.link)
    }

    fn description(&self) -> String {
        format!("remove link {}", self.link.display())
    }
}

/// Delete a regular file after backing it up; undo restores the backup.
#[derive(Debug)]
pub struct RemoveFile {
    path: PathBuf,
    backups: BackupStore,
    backup: Option<PathBuf>,
}

impl RemoveFile {
    /// Delete `path`, keeping a snapshot in `backups`.
    #[must_use]
    pub fn new(backups: BackupStore, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backups,
            backup: None,
        }
    }
}

impl Operation for RemoveFile {
    fn execute(&mut self) -> Result<()> {
        let backup = self.backups.create(&self.path)?;
        fs::remove_file(&self.path).map_err(|e| Error::from_io(&self.path, e))?;
        self.backup = Some(backup);
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let backup = self.backup.as_deref().ok_or_else(|| Error::BackupNotFound {
            path: self.path.clone(),
        })?;
        self.backups.restore(backup, &self.path)
    }

    fn description(&self) -> String {
        format!("remove {}", self.path.display())
    }
}

/// Create a directory and any missing parents.
///
/// Undo removes only what this operation created, and only while it is
/// still empty. A directory that existed beforehand is never touched.
#[derive(Debug)]
pub struct CreateDir {
    path: PathBuf,
    created_root: Option<PathBuf>,
}

impl CreateDir {
    /// Create `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            created_root: None,
        }
    }
}

impl Operation for CreateDir {
    fn execute(&mut self) -> Result<()> {
        if self.path.is_dir() {
            return Ok(());
        }
        let first_missing = self
            .path
            .ancestors()
            .take_while(|p| !p.as_os_str().is_empty() && !exists(p))
            .last()
            .map(Path::to_path_buf);
        fs::create_dir_all(&self.path).map_err(|e| Error::from_io(&self.path, e))?;
        self.created_root = first_missing;
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let Some(root) = self.created_root.take() else {
            return Ok(());
        };
        let mut current = self.path.clone();
        loop {
            match is_dir_empty(&current) {
                Ok(true) => fs::remove_dir(&current).map_err(|e| Error::from_io(&current, e))?,
                Ok(false) => {
                    log::debug!("leaving non-empty {}", current.display());
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::from_io(&current, e)),
            }
            if current == root {
                return Ok(());
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(()),
            }
        }
    }

    fn description(&self) -> String {
        format!("create directory {}", self.path.display())
    }
}

/// Write bytes to a file; undo restores the previous content or deletes
/// the new file.
#[derive(Debug)]
pub struct WriteFile {
    path: PathBuf,
    contents: Vec<u8>,
    backups: BackupStore,
    backup: Option<PathBuf>,
    written: bool,
}

impl WriteFile {
    /// Replace the contents of `path`, backing up any existing file first.
    #[must_use]
    pub fn new(backups: BackupStore, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            backups,
            backup: None,
            written: false,
        }
    }
}

impl Operation for WriteFile {
    fn execute(&mut self) -> Result<()> {
        if self.path.is_file() {
            self.backup = Some(self.backups.create(&self.path)?);
        }
        ensure_parent(&self.path).map_err(|e| Error::from_io(&self.path, e))?;
        if let Err(e) = fs::write(&self.path, &self.contents) {
            if let Some(backup) = self.backup.take() {
                self.backups.restore(&backup, &self.path)?;
            }
            return Err(Error::from_io(&self.path, e));
        }
        self.written = true;
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        if !self.written {
            return Ok(());
        }
        match self.backup.take() {
            Some(backup) => self.backups.restore(&backup, &self.path),
            None => fs::remove_file(&self.path).map_err(|e| Error::from_io(&self.path, e)),
        }
    }

    fn description(&self) -> String {
        format!("write {}", self.path.display())
    }
}

/// Register a managed file and persist the registry.
#[derive(Debug)]
pub struct AddToRegistry {
    registry: SharedRegistry,
    entry: ManagedFile,
}

impl AddToRegistry {
    /// Add `entry` to `registry`.
    #[must_use]
    pub fn new(registry: SharedRegistry, entry: ManagedFile) -> Self {
        Self { registry, entry }
    }
}

impl Operation for AddToRegistry {
    fn execute(&mut self) -> Result<()> {
        let mut store = self.registry.borrow_mut();
        store.add(self.entry.clone())?;
        if let Err(e) = store.save() {
            let _ = store.remove(&self.entry.source_path);
            return Err(e);
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let mut store = self.registry.borrow_mut();
        let (index, entry) = store.remove(&self.entry.source_path)?;
        if let Err(e) = store.save() {
            store.insert(index, entry);
            return Err(e);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("add {} to registry", self.entry.source_path)
    }
}

/// Unregister a managed file and persist the registry.
#[derive(Debug)]
pub struct RemoveFromRegistry {
    registry: SharedRegistry,
    source_path: String,
    removed: Option<(usize, ManagedFile)>,
}

impl RemoveFromRegistry {
    /// Remove the entry for `source_path` (portable notation).
    #[must_use]
    pub fn new(registry: SharedRegistry, source_path: impl Into<String>) -> Self {
        Self {
            registry,
            source_path: source_path.into(),
            removed: None,
        }
    }
}

impl Operation for RemoveFromRegistry {
    fn execute(&mut self) -> Result<()> {
        let mut store = self.registry.borrow_mut();
        let (index, entry) = store.remove(&self.source_path)?;
        if let Err(e) = store.save() {
            store.insert(index, entry);
            return Err(e);
        }
        self.removed = Some((index, entry));
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        let Some((index, entry)) = self.removed.take() else {
            return Ok(());
        };
        let mut store = self.registry.borrow_mut();
        store.insert(index, entry);
        store.save()
    }

    fn description(&self) -> String {
        format!("remove {} from registry", self.source_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::path::PathResolver;
    use tempfile::TempDir;

    fn backups(temp: &TempDir) -> BackupStore {
        BackupStore::new(temp.path().join("backups"))
    }

    fn registry(temp: &TempDir) -> SharedRegistry {
        let store = ConfigStore::new(temp.path().join("config.yaml"), Config::default());
        store.save().unwrap();
        Rc::new(RefCell::new(store))
    }

    #[test]
    fn test_move_file_and_undo() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("store/a");
        fs::write(&from, "x").unwrap();

        let mut op = MoveFile::new(&from, &to);
        op.execute().unwrap();
        assert!(!from.exists());
        op.undo().unwrap();
        assert_eq!(fs::read_to_string(&from).unwrap(), "x");
        assert!(!to.exists());
    }

    #[test]
    fn test_move_file_refuses_existing_destination() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "old").unwrap();

        let mut op = MoveFile::new(&from, &to);
        assert!(op.execute().is_err());
        assert_eq!(fs::read_to_string(&to).unwrap(), "old");
        assert!(from.exists());
    }

    #[test]
    fn test_move_file_overwrite_restores_displaced_on_undo() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "old").unwrap();

        let mut op = MoveFile::new(&from, &to).overwriting(backups(&temp));
        op.execute().unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");

        op.undo().unwrap();
        assert_eq!(fs::read_to_string(&from).unwrap(), "new");
        assert_eq!(fs::read_to_string(&to).unwrap(), "old");
    }

    #[test]
    fn test_copy_file_and_undo() {
        let temp = tempfile::tempdir().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        fs::write(&from, "x").unwrap();

        let mut op = CopyFile::new(&from, &to);
        op.execute().unwrap();
        assert!(from.exists() && to.exists());
        op.undo().unwrap();
        assert!(!to.exists());
    }

    #[test]
    fn test_remove_file_backs_up_and_restores() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".bashrc");
        fs::write(&path, "alias ll='ls -l'").unwrap();

        let mut op = RemoveFile::new(backups(&temp), &path);
        op.execute().unwrap();
        assert!(!path.exists());
        assert_eq!(backups(&temp).count().unwrap(), 1);

        op.undo().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "alias ll='ls -l'");
    }

    #[test]
    fn test_remove_file_fails_closed_without_backup() {
        let temp = tempfile::tempdir().unwrap();
        // A directory cannot be backed up, so nothing is deleted.
        let dir = temp.path().join("dir");
        fs::create_dir(&dir).unwrap();

        let mut op = RemoveFile::new(backups(&temp), &dir);
        assert!(op.execute().is_err());
        assert!(dir.exists());
    }

    #[test]
    fn test_create_dir_undo_removes_only_new_empty_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let deep = temp.path().join("a/b/c");

        let mut op = CreateDir::new(&deep);
        op.execute().unwrap();
        assert!(deep.is_dir());
        op.undo().unwrap();
        assert!(!temp.path().join("a").exists());
        assert!(temp.path().exists());

        let mut op = CreateDir::new(&deep);
        op.execute().unwrap();
        fs::write(deep.join("keep"), "").unwrap();
        op.undo().unwrap();
        assert!(deep.join("keep").exists());
    }

    #[test]
    fn test_create_dir_leaves_existing() {
        let temp = tempfile::tempdir().unwrap();
        let mut op = CreateDir::new(temp.path());
        op.execute().unwrap();
        op.undo().unwrap();
        assert!(temp.path().is_dir());
    }

    #[test]
    fn test_write_file_undo_restores_previous_content() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("f");
        fs::write(&path, "before").unwrap();

        let mut op = WriteFile::new(backups(&temp), &path, "after");
        op.execute().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "after");
        op.undo().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "before");

        let fresh = temp.path().join("new");
        let mut op = WriteFile::new(backups(&temp), &fresh, "data");
        op.execute().unwrap();
        op.undo().unwrap();
        assert!(!fresh.exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_operations_undo() {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().canonicalize().unwrap();
        let links = SymlinkManager::new(PathResolver::new().with_home(&home));
        let target = home.join("store/zshrc");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "").unwrap();
        let link = home.join(".zshrc");

        let mut create = CreateSymlink::new(links.clone(), &target, &link);
        create.execute().unwrap();
        assert!(links.is_valid(&link));

        let mut remove = RemoveSymlink::new(links.clone(), &link);
        remove.execute().unwrap();
        assert!(!link.exists());
        remove.undo().unwrap();
        assert!(links.points_to(&link, &target).unwrap());

        create.undo().unwrap();
        assert!(fs::symlink_metadata(&link).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_create_symlink_undo_restores_replaced_link() {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().canonicalize().unwrap();
        let links = SymlinkManager::new(PathResolver::new().with_home(&home));
        fs::write(home.join("old"), "").unwrap();
        fs::write(home.join("new"), "").unwrap();
        std::os::unix::fs::symlink("old", home.join("link")).unwrap();

        let mut op = CreateSymlink::new(links.clone(), home.join("new"), home.join("link"));
        op.execute().unwrap();
        assert!(links.points_to(home.join("link"), home.join("new")).unwrap());
        op.undo().unwrap();
        assert_eq!(fs::read_link(home.join("link")).unwrap(), PathBuf::from("old"));
    }

    #[test]
    fn test_create_symlink_refuses_regular_file() {
        let temp = tempfile::tempdir().unwrap();
        let home = temp.path().canonicalize().unwrap();
        let links = SymlinkManager::new(PathResolver::new().with_home(&home));
        fs::write(home.join("occupied"), "mine").unwrap();
        fs::write(home.join("t"), "").unwrap();

        let mut op = CreateSymlink::new(links, home.join("t"), home.join("occupied"));
        assert!(op.execute().is_err());
        assert_eq!(fs::read_to_string(home.join("occupied")).unwrap(), "mine");
    }

    #[test]
    fn test_registry_operations_persist_and_undo() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry(&temp);
        let path = temp.path().join("config.yaml");

        let mut add = AddToRegistry::new(Rc::clone(&registry), ManagedFile::new("~/.zshrc", "shell/zshrc"));
        add.execute().unwrap();
        assert!(ConfigStore::load(&path).unwrap().config().is_managed("~/.zshrc"));

        let mut remove = RemoveFromRegistry::new(Rc::clone(&registry), "~/.zshrc");
        remove.execute().unwrap();
        assert!(!ConfigStore::load(&path).unwrap().config().is_managed("~/.zshrc"));

        remove.undo().unwrap();
        assert!(ConfigStore::load(&path).unwrap().config().is_managed("~/.zshrc"));

        add.undo().unwrap();
        assert!(!ConfigStore::load(&path).unwrap().config().is_managed("~/.zshrc"));
    }

    #[test]
    fn test_add_to_registry_rejects_duplicate() {
        let temp = tempfile::tempdir().unwrap();
        let registry = registry(&temp);
        let entry = ManagedFile::new("~/.zshrc", "shell/zshrc");
        registry.borrow_mut().add(entry.clone()).unwrap();

        let mut add = AddToRegistry::new(Rc::clone(&registry), entry);
        assert!(matches!(add.execute(), Err(Error::AlreadyManaged { .. })));
        assert_eq!(registry.borrow().config().managed_files.len(), 1);
    }
}
