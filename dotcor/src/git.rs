//! Thin wrapper over the `git` command line for the content store.
//!
//! Git is only ever invoked after a transaction has committed. A failure
//! here never undoes a filesystem change; callers record it in the
//! registry's `pending_commit` flag and retry later.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};

fn base_git_command() -> Command {
    let mut command = Command::new("git");
    command.arg("-c").arg("core.autocrlf=false");
    if cfg!(windows) {
        command.arg("-c").arg("core.longpaths=true");
    }
    command
}

fn run(repo: &Path, args: &[&str]) -> Result<Output> {
    let output = base_git_command()
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed launching git {}", args.join(" ")))?;
    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output)
}

/// Whether a `git` executable can be run.
#[must_use]
pub fn is_installed() -> bool {
    base_git_command()
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Whether `repo` is the root of a git work tree.
#[must_use]
pub fn is_repo(repo: &Path) -> bool {
    repo.join(".git").exists()
}

/// Run `git init` in `repo`, creating the directory if needed. An existing
/// repository is left as is.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or git fails.
pub fn init_repo(repo: &Path) -> Result<()> {
    if is_repo(repo) {
        return Ok(());
    }
    std::fs::create_dir_all(repo)
        .with_context(|| format!("failed to create {}", repo.display()))?;
    run(repo, &["init", "--quiet"])?;
    log::info!("initialized git repository in {}", repo.display());
    Ok(())
}

/// Whether the work tree has uncommitted changes, untracked files included.
///
/// # Errors
///
/// Returns an error if git fails.
pub fn has_changes(repo: &Path) -> Result<bool> {
    let output = run(repo, &["status", "--porcelain"])?;
    Ok(!output.stdout.iter().all(u8::is_ascii_whitespace))
}

/// Stage everything and commit with `message`.
///
/// Returns `false` without committing when there is nothing to commit.
///
/// # Errors
///
/// Returns an error if staging or committing fails.
pub fn auto_commit(repo: &Path, message: &str) -> Result<bool> {
    if !has_changes(repo)? {
        log::debug!("nothing to commit in {}", repo.display());
        return Ok(false);
    }
    run(repo, &["add", "-A"])?;
    run(repo, &["commit", "--quiet", "-m", message])
        .with_context(|| format!("failed to commit '{message}'"))?;
    log::info!("committed: {message}");
    Ok(true)
}

/// Point the `origin` remote at `url`, adding it if missing.
///
/// # Errors
///
/// Returns an error if git fails.
pub fn set_remote(repo: &Path, url: &str) -> Result<()> {
    if run(repo, &["remote", "get-url", "origin"]).is_ok() {
        run(repo, &["remote", "set-url", "origin", url])?;
    } else {
        run(repo, &["remote", "add", "origin", url])?;
    }
    Ok(())
}

/// Push the current branch to `origin`, setting upstream on first push.
///
/// # Errors
///
/// Returns an error if git fails.
pub fn push(repo: &Path) -> Result<()> {
    run(repo, &["push", "--quiet", "-u", "origin", "HEAD"]).context("push to origin failed")?;
    log::info!("pushed to origin");
    Ok(())
}
