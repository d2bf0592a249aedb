//! Ready-made transactions for the high-level dotfile workflows.
//!
//! Each builder inspects the current state and returns a [`Transaction`]
//! with its operations planned but not yet run. Callers hold the data
//! directory lock, call [`Transaction::execute_all`] and then
//! [`Transaction::commit`].

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backup::BackupStore;
use crate::config::ManagedFile;
use crate::error::{Error, Result};
use crate::path::PathResolver;
use crate::symlink::{LinkState, SymlinkManager};
use crate::transaction::operations::{
    AddToRegistry, CopyFile, CreateDir, CreateSymlink, MoveFile, RemoveFile, RemoveFromRegistry,
    RemoveSymlink, SharedRegistry,
};
use crate::transaction::Transaction;

/// Everything a dotfile transaction touches.
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Link manager (and through it the path resolver).
    pub links: SymlinkManager,
    /// Backup store for destructive steps.
    pub backups: BackupStore,
    /// The registry, shared by the registry operations.
    pub registry: SharedRegistry,
    /// Absolute content store directory.
    pub store_root: PathBuf,
}

impl StoreContext {
    /// Path resolver used for every path in the context.
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        self.links.resolver()
    }

    /// Absolute location of `repo_path` inside the store.
    #[must_use]
    pub fn store_path(&self, repo_path: &str) -> PathBuf {
        repo_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.store_root.clone(), |path, part| path.join(part))
    }

    /// Registry entry for a source path given in any notation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotManaged`] if the file is not registered.
    pub fn managed(&self, source: impl AsRef<Path>) -> Result<ManagedFile> {
        let portable = self.resolver().normalize(source)?;
        self.registry
            .borrow()
            .config()
            .find(&portable)
            .cloned()
            .ok_or(Error::NotManaged { path: portable })
    }
}

/// Take a file under management: move it into the store, link it back and
/// register it.
///
/// With `overwrite` an existing store file at the entry's repo path is
/// replaced (after a backup).
///
/// # Errors
///
/// Returns an error if the entry's source path cannot be expanded.
pub fn add_file_transaction(
    ctx: &StoreContext,
    entry: ManagedFile,
    overwrite: bool,
) -> Result<Transaction> {
    let source = ctx.resolver().expand(&entry.source_path)?;
    let store_path = ctx.store_path(&entry.repo_path);

    let mut tx = Transaction::new();
    if let Some(parent) = store_path.parent() {
        tx.plan(Box::new(CreateDir::new(parent)))?;
    }
    let mut move_op = MoveFile::new(&source, &store_path);
    if overwrite {
        move_op = move_op.overwriting(ctx.backups.clone());
    }
    tx.plan(Box::new(move_op))?;
    tx.plan(Box::new(CreateSymlink::new(
        ctx.links.clone(),
        &store_path,
        &source,
    )))?;
    tx.plan(Box::new(AddToRegistry::new(Rc::clone(&ctx.registry), entry)))?;
    Ok(tx)
}

/// Stop managing a file: replace the link with a real copy and unregister
/// it.
///
/// The store copy is deleted (after a backup) unless `keep_repo` is set. If
/// something other than a symlink now sits at the original location it is
/// left alone and no copy is made.
///
/// # Errors
///
/// Returns [`Error::NotManaged`] if the file is not registered, or a
/// status error for the original location.
pub fn remove_file_transaction(
    ctx: &StoreContext,
    source: impl AsRef<Path>,
    keep_repo: bool,
) -> Result<Transaction> {
    let entry = ctx.managed(source)?;
    let link = ctx.resolver().expand(&entry.source_path)?;
    let store_path = ctx.store_path(&entry.repo_path);
    let status = ctx.links.status(&link)?;

    let mut tx = Transaction::new();
    if status.is_symlink {
        tx.plan(Box::new(RemoveSymlink::new(ctx.links.clone(), &link)))?;
    }

    if status.exists && !status.is_symlink {
        log::warn!(
            "{} is not a symlink; leaving it in place",
            entry.source_path
        );
    } else if store_path.is_file() {
        tx.plan(Box::new(CopyFile::new(&store_path, &link)))?;
    } else {
        log::warn!(
            "store file {} is missing; nothing to restore",
            store_path.display()
        );
    }

    if !keep_repo && store_path.is_file() {
        tx.plan(Box::new(RemoveFile::new(ctx.backups.clone(), &store_path)))?;
    }
    tx.plan(Box::new(RemoveFromRegistry::new(
        Rc::clone(&ctx.registry),
        entry.source_path,
    )))?;
    Ok(tx)
}

/// Point a managed file's original location at its store copy.
///
/// A correct link produces an empty transaction. A broken or misdirected
/// link is replaced; a regular file in the way is backed up and removed
/// first.
///
/// # Errors
///
/// Returns [`Error::SourceNotFound`] if the store copy is missing, or
/// [`Error::Validation`] if a directory occupies the original location.
pub fn link_file_transaction(ctx: &StoreContext, entry: &ManagedFile) -> Result<Transaction> {
    let link = ctx.resolver().expand(&entry.source_path)?;
    let store_path = ctx.store_path(&entry.repo_path);
    if !store_path.is_file() {
        return Err(Error::SourceNotFound { path: store_path });
    }

    let mut tx = Transaction::new();
    let status = ctx.links.status(&link)?;
    match status.state() {
        LinkState::ValidSymlink if ctx.links.points_to(&link, &store_path)? => return Ok(tx),
        LinkState::NotSymlink if link.is_dir() => {
            return Err(Error::Validation {
                field: "source_path".into(),
                message: format!("{} is a directory", link.display()),
            })
        }
        LinkState::NotSymlink => {
            tx.plan(Box::new(RemoveFile::new(ctx.backups.clone(), &link)))?;
        }
        LinkState::Absent => {
            if let Some(parent) = link.parent() {
                tx.plan(Box::new(CreateDir::new(parent)))?;
            }
        }
        LinkState::ValidSymlink | LinkState::BrokenSymlink => {}
    }
    tx.plan(Box::new(CreateSymlink::new(
        ctx.links.clone(),
        &store_path,
        &link,
    )))?;
    Ok(tx)
}
