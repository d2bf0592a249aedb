//! Integration tests for the `list` command.
//!
//! These tests verify output formats (table, JSON, CSV, TSV), the
//! `--paths-only` and `--all-platforms` switches, and link health labels.

#![cfg(unix)]

mod common;

use common::TestEnv;
use dotcor::ManagedFile;
use predicates::prelude::*;
use std::fs;

/// Test the empty table.
#[test]
fn test_list_empty() {
    let env = TestEnv::initialized();

    env.command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No managed files"));
}

/// Test the default table with one file.
#[test]
fn test_list_table() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    env.add(&[&zshrc]);

    env.command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "SOURCE_PATH\tREPO_PATH\tADDED_AT\tPLATFORMS\n",
        ))
        .stdout(predicate::str::contains("~/.zshrc\tshell/zshrc\t"))
        .stdout(predicate::str::contains("\tall\n"));
}

/// Test JSON output with link health.
///
/// **What this tests:**
/// Two managed files; one link is deleted behind dotcor's back.
///
/// **Invariant verified:**
/// - JSON parses as an array of objects
/// - The intact link reports `ok`, the deleted one `missing`
#[test]
fn test_list_json_with_status() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    let vimrc = env.write_home_file(".vimrc", "v");
    env.add(&[&zshrc, &vimrc]);
    fs::remove_file(&vimrc).unwrap();

    let output = env
        .command()
        .args(["list", "--format", "json", "--status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["source_path"], "~/.zshrc");
    assert_eq!(rows[0]["status"], "ok");
    assert_eq!(rows[1]["source_path"], "~/.vimrc");
    assert_eq!(rows[1]["status"], "missing");
}

/// Test the remaining health labels.
///
/// **Invariant verified:**
/// - A regular file at the link location reports `not-symlink`
/// - A dangling link reports `broken`
/// - A link to another file reports `wrong-target`
#[test]
fn test_list_status_labels() {
    let env = TestEnv::initialized();
    let a = env.write_home_file(".aliases", "a");
    let b = env.write_home_file(".bashrc", "b");
    let c = env.write_home_file(".profile", "c");
    env.add(&[&a, &b, &c]);

    fs::remove_file(&a).unwrap();
    fs::write(&a, "replaced").unwrap();

    fs::remove_file(&b).unwrap();
    std::os::unix::fs::symlink(env.home.join("nowhere"), &b).unwrap();

    let other = env.write_home_file("other", "o");
    fs::remove_file(&c).unwrap();
    std::os::unix::fs::symlink(&other, &c).unwrap();

    let output = env
        .command()
        .args(["list", "--format", "csv", "--status"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines[0], "source_path,repo_path,added_at,platforms,status");
    assert!(lines[1].starts_with("~/.aliases,") && lines[1].ends_with(",not-symlink"));
    assert!(lines[2].starts_with("~/.bashrc,") && lines[2].ends_with(",broken"));
    assert!(lines[3].starts_with("~/.profile,") && lines[3].ends_with(",wrong-target"));
}

/// Test TSV output without status.
#[test]
fn test_list_tsv() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    env.add(&[&zshrc]);

    env.command()
        .args(["list", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "source_path\trepo_path\tadded_at\tplatforms\n~/.zshrc\tshell/zshrc\t",
        ));
}

/// Test `--paths-only`.
#[test]
fn test_list_paths_only() {
    let env = TestEnv::initialized();
    let zshrc = env.write_home_file(".zshrc", "z");
    let vimrc = env.write_home_file(".vimrc", "v");
    env.add(&[&zshrc, &vimrc]);

    env.command()
        .args(["list", "--paths-only"])
        .assert()
        .success()
        .stdout("~/.zshrc\n~/.vimrc\n");
}

/// Test platform filtering.
///
/// **Invariant verified:**
/// - Entries for another platform are hidden by default
/// - `--all-platforms` shows them
#[test]
fn test_list_platform_filter() {
    let env = TestEnv::initialized();
    env.edit_config(|c| {
        let mut foreign = ManagedFile::new("~/.foreign", "misc/foreign");
        foreign.platforms = vec!["plan9".to_string()];
        c.managed_files.push(foreign);
        c.managed_files
            .push(ManagedFile::new("~/.everywhere", "misc/everywhere"));
    });

    env.command()
        .args(["list", "--paths-only"])
        .assert()
        .success()
        .stdout("~/.everywhere\n");

    env.command()
        .args(["list", "--paths-only", "--all-platforms"])
        .assert()
        .success()
        .stdout("~/.foreign\n~/.everywhere\n");
}

/// Test an unknown format value.
#[test]
fn test_list_invalid_format() {
    let env = TestEnv::initialized();

    env.command()
        .args(["list", "--format", "xml"])
        .assert()
        .failure();
}
