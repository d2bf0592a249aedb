//! Cleanup-backups command implementation.
//!
//! This module implements the `cleanup-backups` command, which deletes old
//! backup buckets according to the retention policy.

use crate::error::CliError;
use crate::utils::{format_size, parse_age, GlobalOptions, Session};
use clap::Args;
use std::time::Duration;

/// Delete old backups.
#[derive(Args)]
pub struct CleanupBackupsCommand {
    /// Delete buckets older than this age (e.g. 30d, 2w, 1m, 12h)
    #[arg(long, value_name = "AGE", value_parser = parse_age)]
    pub older_than: Option<Duration>,

    /// Always keep this many of the newest buckets
    #[arg(long, value_name = "N")]
    pub keep: Option<usize>,

    /// Delete every backup regardless of age
    #[arg(long, conflicts_with_all = ["older_than", "keep"])]
    pub all: bool,

    /// Show what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanupBackupsCommand {
    /// Execute the cleanup-backups command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;
        let (older_than, keep) = self.policy(&session);
        let backups = &session.ctx.backups;

        if self.dry_run {
            let planned = backups.plan_cleanup(older_than, keep)?;
            println!("Dry-run mode: no changes will be made");
            for bucket in &planned {
                println!("  - {} ({})", bucket.name, format_size(bucket.size));
            }
            let files: usize = planned.iter().map(|b| b.files).sum();
            let bytes: u64 = planned.iter().map(|b| b.size).sum();
            println!(
                "Would delete {} backup(s) in {} bucket(s), freeing {}",
                files,
                planned.len(),
                format_size(bytes)
            );
            return Ok(());
        }

        let report = session.with_lock(|| Ok(backups.cleanup(older_than, keep)?))?;
        global.say(format!(
            "Deleted {} backup(s) in {} bucket(s), freed {}",
            report.deleted_files,
            report.deleted,
            format_size(report.freed_bytes)
        ));
        global.say(format!("{} backup(s) remaining", backups.count()?));
        Ok(())
    }

    fn policy(&self, session: &Session) -> (Duration, usize) {
        if self.all {
            return (Duration::ZERO, 0);
        }
        let retention = session.config().backup_retention;
        let older_than = self.older_than.unwrap_or_else(|| {
            Duration::from_secs(u64::from(retention.older_than_days) * 24 * 3600)
        });
        (older_than, self.keep.unwrap_or(retention.keep_last))
    }
}
