//! Restore command implementation.
//!
//! This module implements the `restore` command, which writes a backup's
//! contents back to a file. A managed file is restored into its store copy
//! so the link stays in place.

use crate::error::CliError;
use crate::utils::{GlobalOptions, Session};
use clap::Args;
use dotcor::transaction::operations::WriteFile;
use dotcor::{Error as LibError, LinkState, Transaction};
use std::fs;
use std::path::{Path, PathBuf};

/// Restore a file from a backup.
#[derive(Args)]
pub struct RestoreCommand {
    /// File to restore
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// List the available backups of the file instead of restoring
    #[arg(long, conflicts_with = "backup")]
    pub list_backups: bool,

    /// Restore from this backup instead of the newest one
    #[arg(long, value_name = "PATH")]
    pub backup: Option<PathBuf>,
}

impl RestoreCommand {
    /// Execute the restore command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;
        let target = session.resolver().expand(&self.file)?;
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CliError::InvalidArguments(format!("{} has no file name", target.display()))
            })?;
        let available = session.ctx.backups.backups_of(&name)?;

        if self.list_backups {
            if available.is_empty() {
                global.say(format!("No backups of {name}"));
            }
            for path in &available {
                println!("{}", path.display());
            }
            return Ok(());
        }

        let backup = match self.backup {
            Some(path) => session.resolver().expand(path)?,
            None => available
                .first()
                .cloned()
                .ok_or_else(|| LibError::BackupNotFound {
                    path: target.clone(),
                })?,
        };
        if !backup.is_file() {
            return Err(LibError::BackupNotFound { path: backup }.into());
        }

        let contents = fs::read(&backup)?;

        let destination = session.with_lock(|| {
            let destination = restore_destination(&session, &target)?;
            let mut tx = Transaction::new();
            tx.execute(Box::new(WriteFile::new(
                session.ctx.backups.clone(),
                &destination,
                contents,
            )))?;
            tx.commit()?;
            Ok(destination)
        })?;

        global.say(format!(
            "Restored {} from {}",
            destination.display(),
            backup.display()
        ));
        Ok(())
    }
}

/// Where restored bytes go: the store copy for a correctly linked managed
/// file, otherwise the path itself.
fn restore_destination(session: &Session, target: &Path) -> Result<PathBuf, CliError> {
    let Ok(entry) = session.ctx.managed(target) else {
        return Ok(target.to_path_buf());
    };
    let status = session.ctx.links.status(target)?;
    if status.state() == LinkState::ValidSymlink {
        return Ok(session.ctx.store_path(&entry.repo_path));
    }
    if status.is_symlink {
        return Err(CliError::Library(LibError::Validation {
            field: "file".into(),
            message: format!(
                "{} is a broken managed link; run `dotcor doctor --fix` first",
                entry.source_path
            ),
        }));
    }
    Ok(target.to_path_buf())
}
