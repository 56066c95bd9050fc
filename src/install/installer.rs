//! Idempotent build installation.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};

use super::{ArchiveFetcher, extract_archive};
use crate::domain::Build;
use crate::error::{BisectError, Result};
use crate::platform::{ArchiveSpec, BuildTarget, Platform};
use crate::workspace::Workspace;

/// Written into the install directory once extraction completed
pub const INSTALL_MARKER: &str = ".installed";

/// Commit prefix length used where paths must stay short
const SHORT_COMMIT_LEN: usize = 8;

/// Ensures builds are downloaded and extracted under the workspace
pub struct ArchiveInstaller<F: ArchiveFetcher> {
    fetcher: Arc<F>,
    workspace: Workspace,
    platform: Platform,
    update_base: String,
}

impl<F: ArchiveFetcher> ArchiveInstaller<F> {
    pub fn new(fetcher: Arc<F>, workspace: Workspace, platform: Platform, update_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            workspace,
            platform,
            update_base: update_base.into(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn archive_spec(&self, build: &Build) -> Result<(&'static BuildTarget, ArchiveSpec)> {
        let target = BuildTarget::resolve(build.runtime, self.platform);
        let spec = target.archive.ok_or(BisectError::UnsupportedRuntime(build.runtime))?;
        Ok((target, spec))
    }

    /// Deterministic install directory for a build
    pub fn install_dir(&self, build: &Build) -> PathBuf {
        let target = BuildTarget::resolve(build.runtime, self.platform);
        let name = if target.short_paths {
            build.short_commit(SHORT_COMMIT_LEN)
        } else {
            build.commit.as_str()
        };
        self.workspace.builds_dir().join(build.runtime.as_str()).join(name)
    }

    /// Where the executable for a build is expected after installation
    pub fn executable_path(&self, build: &Build) -> Result<PathBuf> {
        let (_, spec) = self.archive_spec(build)?;
        Ok(self.install_dir(build).join(spec.executable))
    }

    /// Download URL for a build's archive
    pub fn download_url(&self, build: &Build) -> Result<String> {
        let (_, spec) = self.archive_spec(build)?;
        Ok(format!(
            "{}/commit:{}/{}/insider",
            self.update_base.trim_end_matches('/'),
            build.commit,
            spec.download_platform
        ))
    }

    /// Make sure `build` is installed and return its install directory.
    ///
    /// Returns immediately when the install marker exists. A directory without
    /// marker is a leftover from an interrupted install and is replaced.
    pub async fn ensure_installed(&self, build: &Build) -> Result<PathBuf> {
        let (_, spec) = self.archive_spec(build)?;
        let dir = self.install_dir(build);
        let marker = dir.join(INSTALL_MARKER);

        if tokio::fs::try_exists(&marker).await? {
            debug!("Build {} already installed at {}", build.commit, dir.display());
            return Ok(dir);
        }

        if tokio::fs::try_exists(&dir).await? {
            warn!("Removing incomplete install at {}", dir.display());
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&dir).await?;

        let url = self.download_url(build)?;
        let archive = dir.with_file_name(format!(
            "{}-{}",
            dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            spec.kind.file_name()
        ));

        let result = async {
            self.fetcher.fetch(&url, &archive).await?;
            extract_archive(&archive, spec.kind, &dir).await?;
            tokio::fs::write(&marker, &build.commit).await?;
            Ok::<_, BisectError>(())
        }
        .await;

        if tokio::fs::try_exists(&archive).await.unwrap_or(false)
            && let Err(e) = tokio::fs::remove_file(&archive).await
        {
            warn!("Failed to remove archive {}: {}", archive.display(), e);
        }
        result?;

        info!("Installed {} to {}", build, dir.display());
        Ok(dir)
    }
}
