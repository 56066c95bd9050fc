//! Child process ownership and process-tree teardown.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::error::{BisectError, Result};

/// A spawned build process.
///
/// On Unix the process leads its own process group so the whole tree can be
/// signalled at once. Output is only ever logged.
///
/// The group is only signalled while the leader has not been reaped; once it
/// is reaped the group id may be reused by an unrelated process.
pub struct ProcessHandle {
    child: Child,
    pid: u32,
    reaped: bool,
    stop_timeout: Duration,
    drains: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
    /// Spawn `program` with piped stdout/stderr
    pub fn spawn(program: &Path, args: &[OsString], stop_timeout: Duration) -> Result<Self> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| BisectError::Spawn {
            path: program.to_path_buf(),
            source,
        })?;
        let pid = child
            .id()
            .ok_or_else(|| BisectError::ProcessExited(format!("{} exited immediately", program.display())))?;

        debug!("Spawned {} (pid {}) with args {:?}", program.display(), pid, args);

        let mut handle = Self {
            child,
            pid,
            reaped: false,
            stop_timeout,
            drains: Vec::new(),
        };
        if let Some(stderr) = handle.child.stderr.take() {
            handle.drain(BufReader::new(stderr).lines(), "stderr");
        }
        Ok(handle)
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Take stdout to scan it; hand the rest back with [`ProcessHandle::drain`]
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Log stdout for the rest of the process lifetime
    pub fn drain_stdout(&mut self) {
        if let Some(stdout) = self.child.stdout.take() {
            self.drain(BufReader::new(stdout).lines(), "stdout");
        }
    }

    /// Log remaining lines of a stream at debug level until it closes
    pub fn drain<R>(&mut self, mut lines: Lines<R>, stream: &'static str)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let pid = self.pid;
        self.drains.push(tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[{} {}] {}", pid, stream, line);
            }
        }));
    }

    /// Wait for the process to exit on its own
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await?;
        self.reaped = true;
        Ok(status)
    }

    /// Whether the process has exited. Reaps it if so.
    pub fn has_exited(&mut self) -> bool {
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            self.reaped = true;
        }
        self.reaped
    }

    /// Terminate the process and everything it spawned.
    ///
    /// Succeeds whenever the process is gone afterwards, including when it had
    /// already exited; only a process that is still alive is an error.
    pub async fn terminate_tree(&mut self) -> Result<()> {
        if self.reaped {
            debug!("Process {} already reaped, not signalling its group", self.pid);
            self.abort_drains();
            return Ok(());
        }

        self.signal_tree(false).await;

        if tokio::time::timeout(self.stop_timeout, self.child.wait()).await.is_err() {
            warn!(
                "Process {} did not exit within {}ms, killing",
                self.pid,
                self.stop_timeout.as_millis()
            );
            self.signal_tree(true).await;
            if let Err(e) = self.child.start_kill() {
                debug!("start_kill for {}: {}", self.pid, e);
            }
            let _ = tokio::time::timeout(self.stop_timeout, self.child.wait()).await;
        }

        self.abort_drains();

        if self.has_exited() {
            debug!("Process {} stopped", self.pid);
            Ok(())
        } else {
            Err(BisectError::Stop {
                pid: self.pid,
                reason: "still running after kill".to_string(),
            })
        }
    }

    fn abort_drains(&mut self) {
        for drain in self.drains.drain(..) {
            drain.abort();
        }
    }

    #[cfg(unix)]
    async fn signal_tree(&self, force: bool) {
        let signal = if force { "-KILL" } else { "-TERM" };
        let group = format!("-{}", self.pid);
        match Command::new("kill").args([signal, "--", group.as_str()]).output().await {
            Ok(output) if output.status.success() => {}
            // The group is usually gone already when the process exited by itself
            Ok(output) => debug!(
                "kill {} {}: {}",
                signal,
                group,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("Failed to run kill for process group {}: {}", self.pid, e),
        }
    }

    #[cfg(windows)]
    async fn signal_tree(&self, _force: bool) {
        let pid = self.pid.to_string();
        match Command::new("taskkill")
            .args(["/T", "/F", "/PID", pid.as_str()])
            .output()
            .await
        {
            Ok(output) if output.status.success() => {}
            Ok(output) => debug!(
                "taskkill {}: {}",
                pid,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("Failed to run taskkill for {}: {}", pid, e),
        }
    }
}
