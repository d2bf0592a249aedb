//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    AddCommand, CleanupBackupsCommand, CompletionsCommand, DoctorCommand, InitCommand,
    ListCommand, RemoveCommand, RestoreCommand, SyncCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage dotfiles through a transactional symlink farm.
#[derive(Parser)]
#[command(name = "dotcor")]
#[command(version, about = "Manage dotfiles with symlinks and git", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "DOTCOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize the data directory and content store
    Init(InitCommand),

    /// Move dotfiles into the store and link them back
    Add(AddCommand),

    /// Stop managing dotfiles and restore real copies
    Remove(RemoveCommand),

    /// List managed dotfiles
    List(ListCommand),

    /// Commit store changes and push to the remote
    Sync(SyncCommand),

    /// Delete old backups
    CleanupBackups(CleanupBackupsCommand),

    /// Restore a file from a backup
    Restore(RestoreCommand),

    /// Check and repair the installation
    Doctor(DoctorCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
