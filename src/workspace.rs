//! On-disk layout for cached builds and scratch data.
//!
//! ```text
//! <root>/
//!   builds/<runtime>/<commit>/   extracted archives (kept across sessions)
//!   data/user-data/              desktop user data
//!   data/extensions/             extensions for desktop and web
//!   data/server-data/            web server data
//!   data/perf.txt                startup timings written by perf runs
//! ```

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Result;

/// Directory tree shared by all launches of a session
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn builds_dir(&self) -> PathBuf {
        self.root.join("builds")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.data_dir().join("user-data")
    }

    pub fn extensions_dir(&self) -> PathBuf {
        self.data_dir().join("extensions")
    }

    pub fn server_data_dir(&self) -> PathBuf {
        self.data_dir().join("server-data")
    }

    pub fn perf_file(&self) -> PathBuf {
        self.data_dir().join("perf.txt")
    }

    /// Start a session from a clean data tree.
    ///
    /// Called once per session; state then persists across bisection steps.
    /// Cached builds are left alone.
    pub async fn initialize(&self) -> Result<()> {
        let data_dir = self.data_dir();
        if tokio::fs::try_exists(&data_dir).await? {
            debug!("Clearing data directory {}", data_dir.display());
            tokio::fs::remove_dir_all(&data_dir).await?;
        }

        for dir in [self.user_data_dir(), self.extensions_dir(), self.server_data_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(self.builds_dir()).await?;

        info!("Workspace initialized at {}", self.root.display());
        Ok(())
    }

    /// Remove everything, cached builds included.
    pub async fn reset(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.root).await? {
            info!("Removing workspace {}", self.root.display());
            tokio::fs::remove_dir_all(&self.root).await?;
        }
        Ok(())
    }
}
