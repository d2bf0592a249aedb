//! Build script for dotcor-cli.
//!
//! This script generates a man page at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Build scripts cannot depend on the crate being built, so the command
//! structure is declared here a second time.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// Keep this structure synchronized with src/cli.rs.
fn build_cli() -> Command {
    Command::new("dotcor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage dotfiles with symlinks and git")
        .long_about(
            "Moves dotfiles into a git-backed content store and links them back, \
             with every change applied as an all-or-nothing transaction",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location")
                .value_name("PATH")
                .global(true)
                .env("DOTCOR_DATA_DIR"),
        )
        .subcommands(vec![
            Command::new("init")
                .about("Initialize the data directory and content store")
                .long_about("Create the data directory, content store and registry; --apply links every managed file"),
            Command::new("add")
                .about("Move dotfiles into the store and link them back")
                .long_about("Back up, move, link and register each file in its own transaction"),
            Command::new("remove")
                .about("Stop managing dotfiles and restore real copies")
                .long_about("Replace each link with a copy of its store file and unregister it"),
            Command::new("list")
                .about("List managed dotfiles")
                .long_about("Display managed files as a table, JSON, CSV or TSV, optionally with link health"),
            Command::new("sync")
                .about("Commit store changes and push to the remote")
                .long_about("Commit every change in the content store and push to the configured remote"),
            Command::new("cleanup-backups")
                .about("Delete old backups")
                .long_about("Delete backup buckets older than a given age while keeping the newest ones"),
            Command::new("restore")
                .about("Restore a file from a backup")
                .long_about("Write the newest (or a chosen) backup of a file back into place"),
            Command::new("doctor")
                .about("Check and repair the installation")
                .long_about("Check the lock, managed links, store files and git state; --fix repairs them"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").ok_or_else(|| {
        std::io::Error::other("OUT_DIR is not set")
    })?);
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let mut buffer = Vec::new();
    Man::new(build_cli()).render(&mut buffer)?;
    fs::write(man_dir.join("dotcor.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
