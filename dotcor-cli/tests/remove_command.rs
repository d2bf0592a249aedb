//! Integration tests for the `remove` command.
//!
//! These tests verify:
//! - The link is replaced by a real copy and the entry unregistered
//! - The store copy is deleted unless `--keep-repo` is given
//! - Empty store directories are cleaned up
//! - `--all`, `--dry-run` and unmanaged files

#![cfg(unix)]

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

fn is_regular_file(path: &std::path::Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_file())
}

/// Test removing a managed file.
///
/// **What this tests:**
/// Add `~/.zshrc`, then remove it.
///
/// **Invariant verified:**
/// - `~/.zshrc` is a regular file with the original content again
/// - The store copy and its now-empty category directory are gone
/// - The registry is empty
#[test]
fn test_remove_restores_regular_file() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "export A=1");
    env.add(&[&zshrc]);

    env.command()
        .args(["remove", "~/.zshrc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 file(s)"));

    assert!(is_regular_file(&zshrc));
    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "export A=1");
    assert!(!env.store_dir().join("shell/zshrc").exists());
    assert!(!env.store_dir().join("shell").exists());
    assert!(env.store_dir().is_dir());
    assert!(env.config().managed_files.is_empty());
}

/// Test `--keep-repo`.
///
/// **Invariant verified:**
/// - The original location gets a real copy
/// - The store copy stays in place
#[test]
fn test_remove_keep_repo() {
    let env = TestEnv::initialized();
    let vimrc = env.write_home_file(".vimrc", "set nu");
    env.add(&[&vimrc]);

    env.command()
        .arg("remove")
        .arg(&vimrc)
        .arg("--keep-repo")
        .assert()
        .success();

    assert!(is_regular_file(&vimrc));
    assert_eq!(
        fs::read_to_string(env.store_dir().join("vim/vimrc")).unwrap(),
        "set nu"
    );
    assert!(env.config().managed_files.is_empty());
}

/// Test removing a file that is not managed.
#[test]
fn test_remove_unmanaged_file() {
    let env = TestEnv::initialized();
    env.write_home_file(".bashrc", "x");

    env.command()
        .args(["remove", "~/.bashrc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not managed"));
}

/// Test `--all`.
#[test]
fn test_remove_all() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    let vimrc = env.write_home_file(".vimrc", "v");
    env.add(&[&zshrc, &vimrc]);

    env.command()
        .args(["remove", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 file(s)"));

    assert!(is_regular_file(&zshrc));
    assert!(is_regular_file(&vimrc));
    assert!(env.config().managed_files.is_empty());
}

/// Test that `remove` needs files or `--all`.
#[test]
fn test_remove_requires_target() {
    let env = TestEnv::initialized();

    env.command().arg("remove").assert().code(2);
}

/// Test dry-run mode.
///
/// **Invariant verified:**
/// - The planned steps are listed
/// - The link and registry entry remain
#[test]
fn test_remove_dry_run() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    env.add(&[&zshrc]);

    env.command()
        .args(["remove", "~/.zshrc", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("remove ~/.zshrc from registry"));

    assert!(fs::symlink_metadata(&zshrc)
        .unwrap()
        .file_type()
        .is_symlink());
    assert_eq!(env.config().managed_files.len(), 1);
}

/// Test removal when the link was already replaced by a real file.
///
/// **Invariant verified:**
/// - The user's file is left alone and the entry is still unregistered
#[test]
fn test_remove_leaves_replaced_file_alone() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "managed");
    env.add(&[&zshrc]);
    fs::remove_file(&zshrc).unwrap();
    fs::write(&zshrc, "hand edited").unwrap();

    env.command()
        .args(["remove", "~/.zshrc", "--keep-repo"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&zshrc).unwrap(), "hand edited");
    assert!(env.config().managed_files.is_empty());
}
