//! Main entry point for the dotcor CLI.
//!
//! This is the command-line interface for the dotcor dotfile manager.
//! It provides commands for managing dotfiles:
//! - `init`: Set up the data directory and content store
//! - `add`: Move files into the store and link them back
//! - `remove`: Stop managing files
//! - `list`: Show managed files and their link health
//! - `sync`: Commit and push the store
//! - `doctor`: Diagnose and repair problems

use clap::Parser;
use dotcor_cli::cli::{Cli, Command};
use dotcor_cli::utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _level = dotcor::init_logger(cli.verbose, cli.quiet);

    // Convert CLI args to GlobalOptions
    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
    };

    // Execute the command
    let result = match cli.command {
        Command::Init(cmd) => cmd.execute(&global),
        Command::Add(cmd) => cmd.execute(&global),
        Command::Remove(cmd) => cmd.execute(&global),
        Command::List(cmd) => cmd.execute(&global),
        Command::Sync(cmd) => cmd.execute(&global),
        Command::CleanupBackups(cmd) => cmd.execute(&global),
        Command::Restore(cmd) => cmd.execute(&global),
        Command::Doctor(cmd) => cmd.execute(&global),
        Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
