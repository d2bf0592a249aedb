//! Remove command implementation.
//!
//! This module implements the `remove` command, which replaces managed
//! symlinks with real copies of their store files and unregisters them.

use crate::error::{batch_result, CliError};
use crate::utils::{commit_message, GlobalOptions, Session};
use clap::Args;
use dotcor::fs_ops::remove_empty_parents;
use dotcor::{remove_file_transaction, Error as LibError, ManagedFile};

/// Stop managing dotfiles.
#[derive(Args)]
pub struct RemoveCommand {
    /// Files to remove from management
    #[arg(value_name = "FILE", required_unless_present = "all")]
    pub files: Vec<String>,

    /// Remove every managed file
    #[arg(long, conflicts_with = "files")]
    pub all: bool,

    /// Keep the store copy after restoring the file
    #[arg(long)]
    pub keep_repo: bool,

    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

impl RemoveCommand {
    /// Execute the remove command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;

        if self.dry_run {
            let targets = self.targets(&session);
            if targets.is_empty() {
                global.say("No managed files");
                return Ok(());
            }
            println!("Dry-run mode: no changes will be made");
            for target in &targets {
                match remove_file_transaction(&session.ctx, target, self.keep_repo) {
                    Ok(tx) => {
                        println!("  - {target}");
                        for step in tx.planned_descriptions() {
                            println!("      {step}");
                        }
                    }
                    Err(e) => println!("  ✗ {target}: {e}"),
                }
            }
            return Ok(());
        }

        let guard = session.acquire()?;
        let targets = self.targets(&session);
        if targets.is_empty() {
            guard.release()?;
            global.say("No managed files");
            return Ok(());
        }
        let mut removed = Vec::new();
        let mut failures = Vec::new();
        for target in &targets {
            match self.remove_one(&session, target) {
                Ok(entry) => {
                    global.say(format!("  ✓ {}", entry.source_path));
                    removed.push(entry);
                }
                Err(e) => {
                    eprintln!("  ✗ {target}: {e}");
                    failures.push(e);
                }
            }
        }

        if !removed.is_empty() {
            session.commit_changes(global, &commit_message("Remove", &removed))?;
        }
        guard.release()?;

        global.say(format!("Removed {} file(s)", removed.len()));
        batch_result(failures, targets.len())
    }

    /// The explicit targets, or every registered source with `--all`.
    fn targets(&self, session: &Session) -> Vec<String> {
        if self.all {
            session
                .config()
                .managed_files
                .iter()
                .map(|f| f.source_path.clone())
                .collect()
        } else {
            self.files.clone()
        }
    }

    fn remove_one(&self, session: &Session, target: &str) -> Result<ManagedFile, LibError> {
        let entry = session.ctx.managed(target)?;
        let mut tx = remove_file_transaction(&session.ctx, target, self.keep_repo)?;
        tx.execute_all()?;
        tx.commit()?;

        if !self.keep_repo {
            if let Some(parent) = session.ctx.store_path(&entry.repo_path).parent() {
                remove_empty_parents(parent, session.store_root());
            }
        }
        Ok(entry)
    }
}
