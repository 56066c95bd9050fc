//! Archive download.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::{BisectError, Result};

/// Downloads an archive to a local file
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Streams archives over HTTP straight to disk
pub struct HttpArchiveFetcher {
    client: Client,
}

impl HttpArchiveFetcher {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        // No overall timeout: archives are large and links may be slow
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BisectError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BisectError::Network(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BisectError::Network(format!("GET {} returned {}", url, status)));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| BisectError::Network(format!("Download of {} interrupted: {}", url, e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(())
    }
}
