//! vscode-bisect - find the VS Code build that introduced a regression
//!
//! Fetches the released build catalog, installs builds on demand into a local
//! cache, launches them (web server, desktop app or hosted page) and binary
//! searches the range using verdicts from the operator or a startup-time probe.

pub mod bisect;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod install;
pub mod judge;
pub mod launcher;
pub mod platform;
pub mod workspace;

pub use error::{BisectError, Result};
