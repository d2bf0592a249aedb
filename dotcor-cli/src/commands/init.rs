//! Init command implementation.
//!
//! This module implements the `init` command, which creates the data
//! directory, the content store and the registry, and optionally links
//! every managed file on a freshly cloned machine.

use crate::error::CliError;
use crate::utils::{GlobalOptions, Session};
use clap::Args;
use dotcor::config::ConfigStore;
use dotcor::{git, link_file_transaction, Config, PathResolver, Transaction};
use std::fs;
use std::path::PathBuf;

/// Initialize the data directory and content store.
#[derive(Args)]
pub struct InitCommand {
    /// Content store directory (defaults to <DATA_DIR>/files)
    #[arg(long, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Do not create or commit to a git repository
    #[arg(long)]
    pub no_git: bool,

    /// Link every managed file for this platform
    #[arg(long)]
    pub apply: bool,
}

impl InitCommand {
    /// Execute the init command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        dotcor::symlink::ensure_symlink_support()?;

        let data = global.resolve_data_dir()?;
        if data.is_initialized() {
            global.say(format!("Already initialized: {}", data.root().display()));
            if self.repo.is_some() {
                eprintln!("Warning: --repo is ignored for an initialized data directory");
            }
        } else {
            let resolver = PathResolver::new();
            let existed = data.root().exists();
            data.ensure()?;

            let repo = match &self.repo {
                Some(path) => resolver.expand(path)?,
                None => data.default_store_dir(),
            };
            fs::create_dir_all(&repo)?;

            let config = Config {
                repo_path: resolver.normalize(&repo)?,
                git_enabled: !self.no_git,
                ..Config::default()
            };
            ConfigStore::new(data.config_path(), config).save()?;

            global.say(format!("Initialized dotcor in: {}", data.root().display()));
            if !existed {
                global.say("  - Created data directory");
            }
            global.say(format!("  - Content store: {}", repo.display()));
            global.say("  - Created config.yaml");

            if !self.no_git {
                if git::is_installed() {
                    match git::init_repo(&repo) {
                        Ok(()) => global.say("  - Initialized git repository"),
                        Err(e) => eprintln!("Warning: git init failed: {e:#}"),
                    }
                } else {
                    eprintln!("Warning: git not found; changes will not be committed");
                }
            }
        }

        if self.apply {
            apply_links(global)?;
        }
        Ok(())
    }
}

/// Link every managed file for this platform in a single transaction.
fn apply_links(global: &GlobalOptions) -> Result<(), CliError> {
    let session = Session::open(global)?;
    let guard = session.acquire()?;

    let entries: Vec<_> = session
        .config()
        .files_for_current_platform()
        .cloned()
        .collect();

    let mut tx = Transaction::new();
    let mut linked = 0;
    for entry in &entries {
        let part = link_file_transaction(&session.ctx, entry)?;
        if !part.planned_descriptions().is_empty() {
            linked += 1;
            global.say(format!("  + {}", entry.source_path));
        }
        tx.append(part)?;
    }
    tx.execute_all()?;
    tx.commit()?;
    guard.release()?;

    global.say(format!(
        "Linked {linked} of {} managed file(s)",
        entries.len()
    ));
    Ok(())
}
