//! Build identity and the ordered candidate range.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution environment for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runtime {
    /// Local web server opened in the default browser
    WebLocal,
    /// Hosted web build, nothing runs locally
    WebRemote,
    /// Local desktop application
    DesktopLocal,
}

impl Runtime {
    /// Short name used in cache paths and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::WebLocal => "web",
            Runtime::WebRemote => "vscode.dev",
            Runtime::DesktopLocal => "desktop",
        }
    }

    /// Whether builds for this runtime are downloaded and run locally
    pub fn is_local(&self) -> bool {
        !matches!(self, Runtime::WebRemote)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One released artifact, identified by runtime and commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Build {
    pub runtime: Runtime,
    pub commit: String,
}

impl Build {
    pub fn new(runtime: Runtime, commit: impl Into<String>) -> Self {
        Self {
            runtime,
            commit: commit.into(),
        }
    }

    /// First `len` characters of the commit, for display and short paths
    pub fn short_commit(&self, len: usize) -> &str {
        match self.commit.char_indices().nth(len) {
            Some((idx, _)) => &self.commit[..idx],
            None => &self.commit,
        }
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.commit, self.runtime)
    }
}

/// Candidate builds between a bad and a good bound, newest first.
///
/// Positions are index based: duplicate commits stay distinct entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRange {
    builds: Vec<Build>,
}

impl BuildRange {
    pub fn new(builds: Vec<Build>) -> Self {
        Self { builds }
    }

    /// Build a range from commit hashes (newest first)
    pub fn from_commits<I, S>(runtime: Runtime, commits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            builds: commits.into_iter().map(|c| Build::new(runtime, c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Build> {
        self.builds.get(index)
    }

    /// Newest build, presumed bad
    pub fn newest(&self) -> Option<&Build> {
        self.builds.first()
    }

    /// Oldest build, presumed good
    pub fn oldest(&self) -> Option<&Build> {
        self.builds.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Build> {
        self.builds.iter()
    }
}
