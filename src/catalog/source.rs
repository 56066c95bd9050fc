//! Commit sources.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::domain::Runtime;
use crate::error::{BisectError, Result};
use crate::platform::{BuildTarget, Platform};

/// Provides released commit hashes, newest first
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn fetch_commits(&self, runtime: Runtime, platform: Platform) -> Result<Vec<String>>;
}

/// Commit source backed by the update service
pub struct HttpCommitSource {
    client: Client,
    update_base: String,
}

impl HttpCommitSource {
    pub fn new(update_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BisectError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            update_base: update_base.into(),
        })
    }

    /// Catalog URL for a runtime on a platform
    pub fn url(&self, runtime: Runtime, platform: Platform) -> String {
        let target = BuildTarget::resolve(runtime, platform);
        format!(
            "{}/api/commits/insider/{}",
            self.update_base.trim_end_matches('/'),
            target.catalog_platform
        )
    }
}

#[async_trait]
impl CommitSource for HttpCommitSource {
    async fn fetch_commits(&self, runtime: Runtime, platform: Platform) -> Result<Vec<String>> {
        let url = self.url(runtime, platform);
        debug!("Fetching commit catalog from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BisectError::Network(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BisectError::Network(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BisectError::Network(format!("Reading {} failed: {}", url, e)))?;
        let commits = parse_catalog(&url, &body)?;

        debug!("Catalog has {} commits", commits.len());
        Ok(commits)
    }
}

/// Catalog body fetched from `url`: a JSON array of commit hashes, newest first
pub fn parse_catalog(url: &str, body: &str) -> Result<Vec<String>> {
    serde_json::from_str(body).map_err(|e| BisectError::Network(format!("Invalid catalog from {}: {}", url, e)))
}
