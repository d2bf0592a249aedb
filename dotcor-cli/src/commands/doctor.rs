//! Doctor command implementation.
//!
//! This module implements the `doctor` command, which checks the lock, every
//! managed link, the store files and git state, and with `--fix` repairs
//! what can be repaired safely.

use crate::error::CliError;
use crate::utils::{GlobalOptions, LinkHealth, Session};
use clap::Args;
use dotcor::{git, link_file_transaction, Lock, LockState, ManagedFile};

/// Check and repair the installation.
#[derive(Args)]
pub struct DoctorCommand {
    /// Repair problems that can be fixed automatically
    #[arg(long)]
    pub fix: bool,
}

/// Running tally of findings.
#[derive(Default)]
struct Findings {
    problems: usize,
    fixed: usize,
}

impl Findings {
    fn ok(&self, global: &GlobalOptions, message: impl std::fmt::Display) {
        global.say(format!("  ✓ {message}"));
    }

    fn problem(&mut self, message: impl std::fmt::Display) {
        self.problems += 1;
        println!("  ✗ {message}");
    }

    fn fixed(&mut self, message: impl std::fmt::Display) {
        self.fixed += 1;
        println!("    fixed: {message}");
    }
}

impl DoctorCommand {
    /// Execute the doctor command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;
        let mut findings = Findings::default();

        global.say("Checking environment...");
        match dotcor::symlink::ensure_symlink_support() {
            Ok(()) => findings.ok(global, "symlinks supported"),
            Err(e) => findings.problem(e),
        }
        if !session.store_root().is_dir() {
            findings.problem(format!(
                "content store {} is missing",
                session.store_root().display()
            ));
        }

        global.say("Checking lock...");
        self.check_lock(global, &session, &mut findings)?;

        let guard = if self.fix {
            Some(session.acquire()?)
        } else {
            None
        };

        global.say("Checking managed files...");
        let entries: Vec<ManagedFile> = session
            .config()
            .files_for_current_platform()
            .cloned()
            .collect();
        for entry in &entries {
            self.check_entry(global, &session, entry, &mut findings);
        }

        global.say("Checking git...");
        self.check_git(global, &session, &mut findings)?;

        if let Some(guard) = guard {
            guard.release()?;
        }

        let remaining = findings.problems - findings.fixed;
        if remaining == 0 {
            global.say(if findings.fixed == 0 {
                "No problems found".to_string()
            } else {
                format!("Fixed {} problem(s)", findings.fixed)
            });
            Ok(())
        } else {
            if !self.fix {
                println!("Run `dotcor doctor --fix` to repair what can be repaired");
            }
            Err(CliError::Unhealthy(remaining))
        }
    }

    fn check_lock(
        &self,
        global: &GlobalOptions,
        session: &Session,
        findings: &mut Findings,
    ) -> Result<(), CliError> {
        let lock = session.lock();
        match lock.probe()? {
            LockState::Free => findings.ok(global, "lock is free"),
            LockState::Held(record) => findings.ok(
                global,
                format!(
                    "lock held by live pid {} on {}",
                    record.pid, record.hostname
                ),
            ),
            LockState::Stale(record) => {
                findings.problem(format!(
                    "stale lock left by pid {} on {}",
                    record.pid, record.hostname
                ));
                self.clear_lock(&lock, findings)?;
            }
            LockState::Malformed(reason) => {
                findings.problem(format!(
                    "malformed lock record at {}: {reason}",
                    lock.path().display()
                ));
                self.clear_lock(&lock, findings)?;
            }
        }
        Ok(())
    }

    fn clear_lock(&self, lock: &Lock, findings: &mut Findings) -> Result<(), CliError> {
        if self.fix && lock.force_clear()? {
            findings.fixed("cleared the lock");
        }
        Ok(())
    }

    fn check_entry(
        &self,
        global: &GlobalOptions,
        session: &Session,
        entry: &ManagedFile,
        findings: &mut Findings,
    ) {
        let store_path = session.ctx.store_path(&entry.repo_path);
        if !store_path.is_file() {
            findings.problem(format!(
                "{}: store file {} is missing",
                entry.source_path,
                store_path.display()
            ));
            return;
        }

        let health = LinkHealth::check(&session.ctx, entry);
        match health {
            LinkHealth::Ok => {
                if global.verbose {
                    findings.ok(global, &entry.source_path);
                }
            }
            LinkHealth::Missing | LinkHealth::Broken | LinkHealth::WrongTarget => {
                findings.problem(format!("{}: link is {health}", entry.source_path));
                if self.fix {
                    match relink(session, entry) {
                        Ok(()) => findings.fixed(format!("relinked {}", entry.source_path)),
                        Err(e) => println!("    could not relink {}: {e}", entry.source_path),
                    }
                }
            }
            LinkHealth::NotSymlink => findings.problem(format!(
                "{}: a regular file replaced the link (restore with `dotcor remove` or move it aside)",
                entry.source_path
            )),
            LinkHealth::Error => {
                findings.problem(format!("{}: cannot inspect the link", entry.source_path));
            }
        }
    }

    fn check_git(
        &self,
        global: &GlobalOptions,
        session: &Session,
        findings: &mut Findings,
    ) -> Result<(), CliError> {
        let (enabled, pending) = {
            let config = session.config();
            (config.git_enabled, config.pending_commit)
        };
        if !enabled {
            findings.ok(global, "git disabled");
            return Ok(());
        }
        if !git::is_installed() {
            findings.problem("git is enabled but not installed");
            return Ok(());
        }
        if !git::is_repo(session.store_root()) {
            findings.problem(format!(
                "{} is not a git repository",
                session.store_root().display()
            ));
            return Ok(());
        }
        if !pending {
            findings.ok(global, "no pending commit");
            return Ok(());
        }

        findings.problem("a previous git commit failed; changes are uncommitted");
        if self.fix {
            session.commit_changes(global, "Commit pending dotfile changes")?;
            if !session.config().pending_commit {
                findings.fixed("committed pending changes");
            }
        }
        Ok(())
    }
}

fn relink(session: &Session, entry: &ManagedFile) -> Result<(), dotcor::Error> {
    let mut tx = link_file_transaction(&session.ctx, entry)?;
    tx.execute_all()?;
    tx.commit()
}
