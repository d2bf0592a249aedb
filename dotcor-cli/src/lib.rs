//! Library exports for dotcor-cli.
//!
//! This module exports the CLI structure and command implementations so the
//! binary, the benches and the tests share one definition.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
