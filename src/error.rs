//! Error types for vscode-bisect
//!
//! Centralized error handling using thiserror. Variants are grouped the way they
//! are reported: configuration problems surface before anything is launched,
//! network and artifact problems abort the current operation, and process
//! problems abort the current bisection step.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Runtime;

/// All error types that can occur while bisecting
#[derive(Debug, Error)]
pub enum BisectError {
    /// A user supplied commit is not part of the fetched catalog
    #[error("Commit not found in build catalog: {0}")]
    CommitNotFound(String),

    /// Good and bad bounds are the same commit
    #[error("Good and bad commit are the same: {0}")]
    SameCommit(String),

    /// Bad bound is not newer than the good bound
    #[error("Invalid range: bad commit {bad} (index {bad_index}) must be newer than good commit {good} (index {good_index})")]
    InvalidRange {
        bad: String,
        bad_index: usize,
        good: String,
        good_index: usize,
    },

    /// Host OS/architecture has no build target
    #[error("Unsupported platform: {os}-{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// Runtime has nothing to install or launch in the requested way
    #[error("Unsupported runtime for this operation: {0}")]
    UnsupportedRuntime(Runtime),

    /// Catalog fetch or archive download failed
    #[error("Network error: {0}")]
    Network(String),

    /// Build was installed but its executable is missing
    #[error("Executable missing at {}; the cached build may be corrupt, try --reset", .0.display())]
    MissingArtifact(PathBuf),

    /// Archive extraction failed
    #[error("Extraction failed: {0}")]
    Extract(String),

    /// Child process could not be spawned
    #[error("Failed to spawn {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Child process exited before it signalled readiness
    #[error("Process exited before it was ready: {0}")]
    ProcessExited(String),

    /// Child process never signalled readiness
    #[error("Timed out after {0}ms waiting for the web server to become ready")]
    ReadyTimeout(u64),

    /// Process is still alive after the stop sequence completed
    #[error("Failed to stop process {pid}: {reason}")]
    Stop { pid: u32, reason: String },

    /// Opening the browser failed
    #[error("Failed to open browser: {0}")]
    Browser(String),

    /// The session was cancelled (Ctrl-C)
    #[error("Cancelled")]
    Cancelled,

    /// Interactive prompt failure
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BisectError {
    /// Whether this error is a configuration problem detected before launching anything
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BisectError::CommitNotFound(_)
                | BisectError::SameCommit(_)
                | BisectError::InvalidRange { .. }
                | BisectError::UnsupportedPlatform { .. }
                | BisectError::UnsupportedRuntime(_)
        )
    }

    /// Whether a build failed to start, as opposed to the session being broken
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            BisectError::Spawn { .. } | BisectError::ProcessExited(_) | BisectError::ReadyTimeout(_) | BisectError::Browser(_)
        )
    }
}

impl From<reqwest::Error> for BisectError {
    fn from(err: reqwest::Error) -> Self {
        BisectError::Network(err.to_string())
    }
}

/// Result type alias for bisect operations
pub type Result<T> = std::result::Result<T, BisectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_not_found_error() {
        let err = BisectError::CommitNotFound("abc123".to_string());
        assert_eq!(err.to_string(), "Commit not found in build catalog: abc123");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_range_error() {
        let err = BisectError::InvalidRange {
            bad: "b".to_string(),
            bad_index: 4,
            good: "g".to_string(),
            good_index: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("bad commit b (index 4)"));
        assert!(msg.contains("good commit g (index 2)"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_artifact_mentions_reset() {
        let err = BisectError::MissingArtifact(PathBuf::from("/tmp/builds/abc/code"));
        let msg = err.to_string();
        assert!(msg.contains("/tmp/builds/abc/code"));
        assert!(msg.contains("--reset"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_spawn_error_names_path() {
        let err = BisectError::Spawn {
            path: PathBuf::from("/opt/code"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/opt/code"));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BisectError = io_err.into();
        assert!(matches!(err, BisectError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_cancelled_is_not_configuration() {
        assert!(!BisectError::Cancelled.is_configuration());
        assert!(!BisectError::ReadyTimeout(100).is_configuration());
    }

    #[test]
    fn test_launch_failures() {
        assert!(BisectError::ReadyTimeout(100).is_launch_failure());
        assert!(BisectError::ProcessExited("crash".to_string()).is_launch_failure());
        assert!(!BisectError::Cancelled.is_launch_failure());
        assert!(!BisectError::MissingArtifact(PathBuf::from("/x")).is_launch_failure());
        assert!(!BisectError::Network("down".to_string()).is_launch_failure());
    }
}
