//! Binary search over released builds.

mod engine;
mod outcome;
mod state;

pub use engine::Bisector;
pub use outcome::{BisectOutcome, BisectReport, compare_url};
pub use state::BisectState;
