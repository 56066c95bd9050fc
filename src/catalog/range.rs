//! Range selection between the good and bad bounds.

use std::sync::Arc;

use log::info;

use super::CommitSource;
use crate::domain::{BuildRange, Runtime};
use crate::error::{BisectError, Result};
use crate::platform::Platform;

/// Produces the working range for a bisection session
pub struct BuildCatalog<S: CommitSource> {
    source: Arc<S>,
    platform: Platform,
}

impl<S: CommitSource> BuildCatalog<S> {
    pub fn new(source: Arc<S>, platform: Platform) -> Self {
        Self { source, platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Fetch all released commits for `runtime` and return the inclusive slice
    /// from the bad bound (newest by default) to the good bound (oldest by default).
    pub async fn fetch_range(&self, runtime: Runtime, good: Option<&str>, bad: Option<&str>) -> Result<BuildRange> {
        if let (Some(good), Some(bad)) = (good, bad)
            && good == bad
        {
            return Err(BisectError::SameCommit(good.to_string()));
        }

        let commits = self.source.fetch_commits(runtime, self.platform).await?;

        // Explicit bounds must exist even when the catalog is empty
        let bad_index = bad.map(|commit| find_commit(&commits, commit)).transpose()?;
        let good_index = good.map(|commit| find_commit(&commits, commit)).transpose()?;
        if commits.is_empty() {
            return Ok(BuildRange::default());
        }
        let bad_index = bad_index.unwrap_or(0);
        let good_index = good_index.unwrap_or(commits.len() - 1);

        let both_explicit = good.is_some() && bad.is_some();
        if bad_index > good_index || (both_explicit && bad_index == good_index) {
            return Err(BisectError::InvalidRange {
                bad: commits[bad_index].clone(),
                bad_index,
                good: commits[good_index].clone(),
                good_index,
            });
        }

        info!(
            "Bisecting {} builds between {} (bad) and {} (good)",
            good_index - bad_index + 1,
            commits[bad_index],
            commits[good_index]
        );

        Ok(BuildRange::from_commits(
            runtime,
            commits[bad_index..=good_index].iter().cloned(),
        ))
    }
}

fn find_commit(commits: &[String], commit: &str) -> Result<usize> {
    commits
        .iter()
        .position(|c| c == commit)
        .ok_or_else(|| BisectError::CommitNotFound(commit.to_string()))
}
