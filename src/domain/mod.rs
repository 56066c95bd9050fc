//! Domain types for vscode-bisect
//!
//! - Runtime: where a build executes (local web, remote web, desktop)
//! - Build: one released artifact
//! - BuildRange: newest-first candidates between the bisection bounds
//! - Verdict: the judge's answer for a running build

pub mod build;
pub mod verdict;

pub use build::{Build, BuildRange, Runtime};
pub use verdict::Verdict;
