//! quarry - command-line front end
//!
//! Builds the command line from the settings registry and the `cli` and
//! `cli.cmd` plugins, then dispatches to the selected subcommand.
pub mod args;
pub mod cli;
pub mod commands;
pub mod display;

// Re-export commonly used items
pub use cli::{App, Cli, CliCmd, RunContext, cli_plugins, cmd_plugins, exit_codes};
