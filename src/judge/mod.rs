//! Judges - decide whether a running build is good or bad.
//!
//! - PromptJudge asks the operator on the terminal
//! - ThresholdJudge compares measured startup time against a limit

mod prompt;
mod threshold;

pub use prompt::PromptJudge;
pub use threshold::ThresholdJudge;

use async_trait::async_trait;

use crate::domain::{Build, Verdict};
use crate::error::{BisectError, Result};
use crate::launcher::Instance;

/// Classifies launched builds
#[async_trait]
pub trait Judge: Send + Sync {
    /// Verdict for the running instance
    async fn judge(&self, instance: &Instance) -> Result<Verdict>;

    /// Decide how to continue after `build` failed to start.
    ///
    /// The default gives up and propagates the error.
    async fn recover(&self, build: &Build, error: BisectError) -> Result<Verdict> {
        let _ = build;
        Err(error)
    }
}
