//! CLI flag definitions using clap.
//!
//! A session either bisects between `--good` and `--bad`, or launches a
//! single `--commit`.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use vscode_bisect::domain::Runtime;

/// Bisect released VS Code Insiders builds to find where a regression started
#[derive(Parser, Debug)]
#[command(name = "vscode-bisect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Where builds run
    #[arg(short, long, value_enum, default_value_t = RuntimeArg::Web)]
    pub runtime: RuntimeArg,

    /// Commit known to be good (default: oldest released build)
    #[arg(short, long)]
    pub good: Option<String>,

    /// Commit known to be bad (default: newest released build)
    #[arg(short, long)]
    pub bad: Option<String>,

    /// Launch one commit instead of bisecting
    #[arg(long, conflicts_with_all = ["good", "bad"])]
    pub commit: Option<String>,

    /// Measure desktop startup time for each build
    #[arg(long)]
    pub perf: bool,

    /// Startup samples per build in perf mode
    #[arg(long, requires = "perf", value_parser = clap::value_parser!(u32).range(1..))]
    pub perf_runs: Option<u32>,

    /// Judge builds slower than this many milliseconds as bad, without asking
    #[arg(long, requires = "perf")]
    pub perf_threshold: Option<u64>,

    /// Delete cached builds and data before starting
    #[arg(long)]
    pub reset: bool,

    /// Workspace root for cached builds and data
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Runtime names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeArg {
    /// Local web server opened in the browser
    Web,
    /// Local desktop application
    Desktop,
    /// Hosted build on insiders.vscode.dev
    #[value(name = "vscode.dev")]
    VscodeDev,
}

impl From<RuntimeArg> for Runtime {
    fn from(arg: RuntimeArg) -> Self {
        match arg {
            RuntimeArg::Web => Runtime::WebLocal,
            RuntimeArg::Desktop => Runtime::DesktopLocal,
            RuntimeArg::VscodeDev => Runtime::WebRemote,
        }
    }
}
