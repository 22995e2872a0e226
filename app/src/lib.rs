//! # Fragedit App
//!
//! Command line front end for the Fragedit shader editor.
//!
//! - [`args`]: clap command line
//! - [`settings`]: `fragedit.toml` loading and CLI overrides
//! - [`fs_watcher`]: notify-based change detection for `run --watch`
//! - [`runner`]: the `run`, `inspect`, `set` and `clear` commands

pub mod args;
pub mod fs_watcher;
pub mod runner;
pub mod settings;

pub use args::Cli;
pub use runner::{execute, CommandError};
