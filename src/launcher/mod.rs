//! Process launcher - turns a build into a running, stoppable instance.
//!
//! Each runtime has its own launch path:
//! - web: local server process, ready once it prints its access URL
//! - vscode.dev: opens the hosted build, nothing runs locally
//! - desktop: application process, optionally sampled for startup time

mod browser;
mod instance;
mod perf;
mod process;
mod process_launcher;
mod readiness;

pub use browser::{Browser, SystemBrowser};
pub use instance::Instance;
pub use perf::{PERF_MARKERS, PerfOptions, parse_elapsed, read_perf_file};
pub use process::ProcessHandle;
pub use process_launcher::{LaunchSettings, ProcessLauncher};
pub use readiness::{match_ready_url, wait_for_ready};

use async_trait::async_trait;

use crate::domain::Build;
use crate::error::Result;

/// Produces a running instance for a build
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, build: &Build) -> Result<Instance>;
}
