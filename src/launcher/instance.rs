//! Live handle to a launched build.

use log::debug;

use super::ProcessHandle;
use crate::domain::Build;
use crate::error::Result;

/// A launched build.
///
/// Owns its process (if any) until [`Instance::stop`] succeeds. Dropping an
/// instance without stopping it kills the direct child only.
pub struct Instance {
    build: Build,
    process: Option<ProcessHandle>,
    url: Option<String>,
    elapsed_ms: Option<u64>,
}

impl Instance {
    /// Instance with no local process (hosted build)
    pub fn remote(build: Build, url: impl Into<String>) -> Self {
        Self {
            build,
            process: None,
            url: Some(url.into()),
            elapsed_ms: None,
        }
    }

    /// Instance backed by a running process
    pub fn running(build: Build, process: ProcessHandle, url: Option<String>) -> Self {
        Self {
            build,
            process: Some(process),
            url,
            elapsed_ms: None,
        }
    }

    /// Instance whose processes already exited, carrying a measurement
    pub fn finished(build: Build, elapsed_ms: Option<u64>) -> Self {
        Self {
            build,
            process: None,
            url: None,
            elapsed_ms,
        }
    }

    pub fn build(&self) -> &Build {
        &self.build
    }

    /// URL opened for the operator, if any
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Startup time in milliseconds (performance runs only)
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed_ms
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(ProcessHandle::pid)
    }

    /// Whether a local process is still running
    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            Some(process) => !process.has_exited(),
            None => false,
        }
    }

    /// Stop the instance. Calling it again after success is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        debug!("Stopping {} (pid {})", self.build.commit, process.pid());
        match process.terminate_tree().await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Keep ownership so the caller can try again
                self.process = Some(process);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("build", &self.build)
            .field("pid", &self.pid())
            .field("url", &self.url)
            .field("elapsed_ms", &self.elapsed_ms)
            .finish()
    }
}
