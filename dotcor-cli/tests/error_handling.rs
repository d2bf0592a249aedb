//! Integration tests for error reporting and exit codes.
//!
//! Exit codes follow the error category: 1 validation, 2 conflict,
//! 3 environment, 4 invalid arguments, 5 I/O, 6 integrity, 7 configuration,
//! 8 git.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

/// Test commands against an uninitialized data directory.
///
/// **Invariant verified:**
/// - Every command that needs a registry exits 3 and suggests `init`
#[test]
fn test_not_initialized() {
    let env = TestEnv::new();

    for args in [
        &["list"][..],
        &["add", "~/.zshrc"],
        &["remove", "--all"],
        &["doctor"],
        &["cleanup-backups"],
    ] {
        env.command()
            .args(args)
            .assert()
            .code(3)
            .stderr(predicate::str::contains("dotcor init"));
    }
}

/// Test that a malformed lock record is reported as a stale lock.
///
/// **What this tests:**
/// Garbage in the lock file.
///
/// **Invariant verified:**
/// - `add` exits 2 (conflict), points at `doctor --fix` and leaves the
///   record alone
#[test]
#[cfg(unix)]
fn test_malformed_lock_is_stale() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    env.write_lock("not a lock record");

    env.command()
        .arg("add")
        .arg(&zshrc)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stale lock detected (unknown owner)"))
        .stderr(predicate::str::contains("doctor --fix"));

    assert_eq!(
        fs::read_to_string(env.data_dir.join(".lock")).unwrap(),
        "not a lock record"
    );
    assert!(env.config().managed_files.is_empty());
}

/// Test that a broken registry is reported as a configuration error.
#[test]
fn test_invalid_config_yaml() {
    let env = TestEnv::initialized();
    fs::write(env.data_dir.join("config.yaml"), "managed_files: [[[").unwrap();

    env.command()
        .arg("list")
        .assert()
        .code(7)
        .stderr(predicate::str::starts_with("Error:"));
}

/// Test clap usage errors.
#[test]
fn test_unknown_subcommand() {
    let env = TestEnv::new();

    env.command().arg("frobnicate").assert().code(2);
}

/// Test `--quiet` suppresses informational output.
#[test]
fn test_quiet_init() {
    let env = TestEnv::new();

    env.command()
        .args(["--quiet", "init", "--no-git"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

/// Test completion script generation.
#[test]
fn test_completions_bash() {
    let env = TestEnv::new();

    env.command_bare()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dotcor"))
        .stdout(predicate::str::contains("cleanup-backups"));
}
