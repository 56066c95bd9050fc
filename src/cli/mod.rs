//! CLI module for vscode-bisect - command-line flags.

pub mod commands;

pub use commands::{Cli, RuntimeArg};
