//! Sync command implementation.
//!
//! This module implements the `sync` command, which commits every change in
//! the content store and pushes to the configured remote.

use crate::error::CliError;
use crate::utils::{GlobalOptions, Session};
use chrono::Local;
use clap::Args;
use dotcor::git;

/// Commit store changes and push to the remote.
#[derive(Args)]
pub struct SyncCommand {
    /// Commit message (defaults to "Sync dotfiles - <date>")
    #[arg(long, short, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Commit without pushing
    #[arg(long)]
    pub no_push: bool,
}

impl SyncCommand {
    /// Execute the sync command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;
        let (git_enabled, remote) = {
            let config = session.config();
            (config.git_enabled, config.git_remote.clone())
        };
        if !git_enabled {
            return Err(CliError::Git("git is disabled in config.yaml".into()));
        }
        if !git::is_installed() {
            return Err(CliError::Git("git is not installed".into()));
        }
        let repo = session.store_root().to_path_buf();
        if !git::is_repo(&repo) {
            return Err(CliError::Git(format!(
                "{} is not a git repository",
                repo.display()
            )));
        }

        let message = self.message.unwrap_or_else(|| {
            format!(
                "Sync dotfiles - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            )
        });

        let guard = session.acquire()?;
        if git::auto_commit(&repo, &message)? {
            global.say(format!("Committed: {message}"));
        } else {
            global.say("Nothing to commit");
        }
        session.set_pending_commit(false)?;

        match remote {
            Some(url) if !self.no_push => {
                git::set_remote(&repo, &url)?;
                git::push(&repo)?;
                global.say(format!("Pushed to {url}"));
            }
            Some(_) => log::debug!("--no-push given; skipping push"),
            None => global.say("No git_remote configured; skipping push"),
        }
        guard.release()?;
        Ok(())
    }
}
