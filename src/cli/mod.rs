//! CLI module for flowagent - command-line interface and subcommands.
//!
//! Runs the interactive console by default, with subcommands for a single
//! turn and for the calculator alone.

pub mod commands;

pub use commands::Cli;
