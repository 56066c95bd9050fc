//! Archive extraction using the platform's archive tools.

use std::path::Path;

use log::debug;
use tokio::process::Command;

use crate::error::{BisectError, Result};
use crate::platform::ArchiveKind;

/// Extract `archive` into `dest`, which must exist.
pub async fn extract_archive(archive: &Path, kind: ArchiveKind, dest: &Path) -> Result<()> {
    let mut cmd = match kind {
        ArchiveKind::TarGz => {
            let mut cmd = Command::new("tar");
            cmd.arg("-xzf").arg(archive).arg("-C").arg(dest);
            cmd
        }
        // bsdtar ships with Windows and reads zip files
        ArchiveKind::Zip if cfg!(windows) => {
            let mut cmd = Command::new("tar");
            cmd.arg("-xf").arg(archive).arg("-C").arg(dest);
            cmd
        }
        ArchiveKind::Zip => {
            let mut cmd = Command::new("unzip");
            cmd.arg("-q").arg("-o").arg(archive).arg("-d").arg(dest);
            cmd
        }
    };

    debug!("Extracting {} into {}", archive.display(), dest.display());
    let output = cmd
        .output()
        .await
        .map_err(|e| BisectError::Extract(format!("Failed to run extractor for {}: {}", archive.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BisectError::Extract(format!(
            "{} (exit code {:?}): {}",
            archive.display(),
            output.status.code(),
            stderr.trim()
        )));
    }

    Ok(())
}
