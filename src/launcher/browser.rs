//! Opening URLs in the user's browser.

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error::{BisectError, Result};

/// Opens a URL for the operator
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}

/// Uses the desktop's default browser
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn command(url: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(url);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

#[async_trait]
impl Browser for SystemBrowser {
    async fn open(&self, url: &str) -> Result<()> {
        debug!("Opening {}", url);
        let output = Self::command(url)
            .output()
            .await
            .map_err(|e| BisectError::Browser(format!("{}: {}", url, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BisectError::Browser(format!("{}: {}", url, stderr.trim())));
        }
        Ok(())
    }
}
