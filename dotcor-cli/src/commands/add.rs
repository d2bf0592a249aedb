//! Add command implementation.
//!
//! This module implements the `add` command, which moves files into the
//! content store, links them back to their original location and registers
//! them. Each file is its own transaction; one git commit covers the batch.

use crate::error::{batch_result, CliError};
use crate::utils::{commit_message, GlobalOptions, Session};
use clap::Args;
use dotcor::config::generate_repo_path;
use dotcor::{add_file_transaction, Error as LibError, ManagedFile};
use std::fs;
use std::path::{Path, PathBuf};

/// Move dotfiles into the store and link them back.
#[derive(Args)]
pub struct AddCommand {
    /// Files to add
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Store files under this category instead of the detected one
    #[arg(long, short, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Replace an existing store file at the generated location
    #[arg(long, short)]
    pub force: bool,

    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

impl AddCommand {
    /// Execute the add command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;

        if self.dry_run {
            return self.preview(global, &session);
        }

        let guard = session.acquire()?;
        let mut added = Vec::new();
        let mut failures = Vec::new();
        for file in &self.files {
            match self.add_one(&session, file) {
                Ok(entry) => {
                    global.say(format!("  ✓ {} -> {}", entry.source_path, entry.repo_path));
                    added.push(entry);
                }
                Err(e) => {
                    eprintln!("  ✗ {}: {e}", file.display());
                    failures.push(e);
                }
            }
        }

        if !added.is_empty() {
            session.commit_changes(global, &commit_message("Add", &added))?;
        }
        guard.release()?;

        global.say(format!("Added {} file(s)", added.len()));
        batch_result(failures, self.files.len())
    }

    fn preview(&self, global: &GlobalOptions, session: &Session) -> Result<(), CliError> {
        println!("Dry-run mode: no changes will be made");
        let mut planned = 0;
        for file in &self.files {
            let result = self.validate(session, file).and_then(|entry| {
                let tx = add_file_transaction(&session.ctx, entry.clone(), self.force)?;
                Ok((entry, tx.planned_descriptions()))
            });
            match result {
                Ok((entry, steps)) => {
                    planned += 1;
                    println!("  + {} -> {}", entry.source_path, entry.repo_path);
                    if global.verbose {
                        for step in steps {
                            println!("      {step}");
                        }
                    }
                }
                Err(e) => println!("  ✗ {}: {e}", file.display()),
            }
        }
        println!("Would add {planned} file(s)");
        Ok(())
    }

    /// Check that `file` can be taken under management and build its entry.
    fn validate(&self, session: &Session, file: &Path) -> Result<ManagedFile, LibError> {
        let resolver = session.resolver();
        let source = resolver.expand(file)?;
        let portable = resolver.normalize(&source)?;
        if session.config().is_managed(&portable) {
            return Err(LibError::AlreadyManaged { path: portable });
        }

        let meta = fs::symlink_metadata(&source)
            .map_err(|_| LibError::SourceNotFound { path: source.clone() })?;
        if meta.file_type().is_symlink() {
            return Err(invalid(&source, "is a symlink"));
        }
        if !meta.is_file() {
            return Err(invalid(&source, "is not a regular file"));
        }
        if resolver.is_within(&source, session.store_root())?
            || resolver.is_within(&source, session.data.root())?
        {
            return Err(invalid(&source, "is inside the dotcor data directory"));
        }

        let repo_path = generate_repo_path(resolver, &source, self.category.as_deref())?;
        if let Some(other) = session.config().find_by_repo_path(&repo_path) {
            return Err(LibError::Validation {
                field: "repo_path".into(),
                message: format!("'{repo_path}' is already used by {}", other.source_path),
            });
        }
        if !self.force && session.ctx.store_path(&repo_path).exists() {
            return Err(LibError::Validation {
                field: "repo_path".into(),
                message: format!("'{repo_path}' already exists in the store (use --force)"),
            });
        }
        Ok(ManagedFile::new(portable, repo_path))
    }

    fn add_one(&self, session: &Session, file: &Path) -> Result<ManagedFile, LibError> {
        let entry = self.validate(session, file)?;
        let source = session.resolver().expand(&entry.source_path)?;

        let backup = session.ctx.backups.create(&source)?;
        log::info!("backed up {} to {}", entry.source_path, backup.display());

        let mut tx = add_file_transaction(&session.ctx, entry.clone(), self.force)?;
        tx.execute_all()?;
        tx.commit()?;
        Ok(entry)
    }
}

fn invalid(path: &Path, reason: &str) -> LibError {
    LibError::InvalidPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
