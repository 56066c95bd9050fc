//! Build catalog - resolves a runtime to the ordered list of released builds
//! and narrows it to the range between the bisection bounds.

mod range;
mod source;

pub use range::BuildCatalog;
pub use source::{CommitSource, HttpCommitSource, parse_catalog};
