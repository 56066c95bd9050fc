//! Runtime-specific launch paths.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::{Browser, Instance, Launcher, PERF_MARKERS, PerfOptions, ProcessHandle, read_perf_file, wait_for_ready};
use crate::domain::{Build, Runtime};
use crate::error::{BisectError, Result};
use crate::install::{ArchiveFetcher, ArchiveInstaller};
use crate::platform::BuildTarget;
use crate::workspace::Workspace;

/// Launch behaviour shared by all runtimes
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    /// Hosted web endpoint for the remote runtime
    pub remote_url: String,
    /// Deadline for the web server readiness line
    pub ready_timeout: Duration,
    /// Grace period between terminate and kill
    pub stop_timeout: Duration,
    /// Sample desktop startup time instead of handing the app to the operator
    pub perf: Option<PerfOptions>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            remote_url: "https://insiders.vscode.dev".to_string(),
            ready_timeout: Duration::from_secs(60),
            stop_timeout: Duration::from_secs(5),
            perf: None,
        }
    }
}

enum SampleOutcome {
    Exited(Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Launches installed builds as local processes or hosted pages
pub struct ProcessLauncher<F: ArchiveFetcher, B: Browser> {
    installer: Arc<ArchiveInstaller<F>>,
    browser: Arc<B>,
    workspace: Workspace,
    settings: LaunchSettings,
    cancel: CancellationToken,
}

impl<F: ArchiveFetcher, B: Browser> ProcessLauncher<F, B> {
    pub fn new(installer: Arc<ArchiveInstaller<F>>, browser: Arc<B>, workspace: Workspace, settings: LaunchSettings) -> Self {
        Self {
            installer,
            browser,
            workspace,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight launches when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn target(&self, build: &Build) -> &'static BuildTarget {
        BuildTarget::resolve(build.runtime, self.installer.platform())
    }

    /// Install the build and confirm its executable exists.
    ///
    /// Cancelling abandons the install; without its marker the next attempt
    /// starts over.
    async fn prepare_executable(&self, build: &Build) -> Result<PathBuf> {
        tokio::select! {
            installed = self.installer.ensure_installed(build) => installed?,
            _ = self.cancel.cancelled() => {
                info!("Install of {} cancelled", build.commit);
                return Err(BisectError::Cancelled);
            }
        };
        let executable = self.installer.executable_path(build)?;
        if !tokio::fs::try_exists(&executable).await? {
            return Err(BisectError::MissingArtifact(executable));
        }
        Ok(executable)
    }

    fn web_args(&self, target: &BuildTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = target.args.iter().map(OsString::from).collect();
        args.push("--server-data-dir".into());
        args.push(self.workspace.server_data_dir().into_os_string());
        args.push("--extensions-dir".into());
        args.push(self.workspace.extensions_dir().into_os_string());
        args
    }

    fn desktop_args(&self, target: &BuildTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = target.args.iter().map(OsString::from).collect();
        args.push("--user-data-dir".into());
        args.push(self.workspace.user_data_dir().into_os_string());
        args.push("--extensions-dir".into());
        args.push(self.workspace.extensions_dir().into_os_string());
        args
    }

    async fn launch_remote(&self, build: &Build) -> Result<Instance> {
        let url = format!(
            "{}/?vscode-version={}",
            self.settings.remote_url.trim_end_matches('/'),
            build.commit
        );
        info!("Opening {}", url);
        self.browser.open(&url).await?;
        Ok(Instance::remote(build.clone(), url))
    }

    async fn launch_web(&self, build: &Build) -> Result<Instance> {
        let executable = self.prepare_executable(build).await?;
        let args = self.web_args(self.target(build));

        let mut process = ProcessHandle::spawn(&executable, &args, self.settings.stop_timeout)?;
        let Some(stdout) = process.take_stdout() else {
            process.terminate_tree().await?;
            return Err(BisectError::ProcessExited("server stdout unavailable".to_string()));
        };
        let mut lines = BufReader::new(stdout).lines();

        let ready_timeout = self.settings.ready_timeout;
        let ready = tokio::select! {
            result = tokio::time::timeout(ready_timeout, wait_for_ready(&mut lines)) => match result {
                Ok(ready) => ready,
                Err(_) => Err(BisectError::ReadyTimeout(ready_timeout.as_millis() as u64)),
            },
            _ = self.cancel.cancelled() => Err(BisectError::Cancelled),
        };

        let url = match ready {
            Ok(url) => url,
            Err(e) => {
                if let Err(stop_err) = process.terminate_tree().await {
                    warn!("Failed to stop server after launch error: {}", stop_err);
                }
                return Err(e);
            }
        };
        process.drain(lines, "stdout");

        info!("Web server for {} ready at {}", build.commit, url);
        let mut instance = Instance::running(build.clone(), process, Some(url.clone()));
        if let Err(e) = self.browser.open(&url).await {
            if let Err(stop_err) = instance.stop().await {
                warn!("Failed to stop server after browser error: {}", stop_err);
            }
            return Err(e);
        }
        Ok(instance)
    }

    async fn launch_desktop(&self, build: &Build) -> Result<Instance> {
        let executable = self.prepare_executable(build).await?;
        let args = self.desktop_args(self.target(build));

        let mut process = ProcessHandle::spawn(&executable, &args, self.settings.stop_timeout)?;
        process.drain_stdout();

        info!("Started {} (pid {})", build, process.pid());
        Ok(Instance::running(build.clone(), process, None))
    }

    /// Run the build `perf.runs` times, each until it exits by itself or the
    /// deadline passes, and keep the fastest recorded startup time.
    async fn launch_desktop_perf(&self, build: &Build, perf: PerfOptions) -> Result<Instance> {
        let executable = self.prepare_executable(build).await?;
        let perf_file = self.workspace.perf_file();

        let mut args = self.desktop_args(self.target(build));
        args.extend(PERF_MARKERS.iter().map(OsString::from));
        args.push("--prof-duration-markers-file".into());
        args.push(perf_file.clone().into_os_string());

        let mut samples = Vec::new();
        for run in 1..=perf.runs {
            if tokio::fs::try_exists(&perf_file).await? {
                tokio::fs::remove_file(&perf_file).await?;
            }

            let mut process = ProcessHandle::spawn(&executable, &args, self.settings.stop_timeout)?;
            process.drain_stdout();

            let outcome = tokio::select! {
                status = process.wait() => SampleOutcome::Exited(status),
                _ = tokio::time::sleep(perf.timeout) => SampleOutcome::TimedOut,
                _ = self.cancel.cancelled() => SampleOutcome::Cancelled,
            };

            match outcome {
                SampleOutcome::Exited(Ok(status)) => {
                    debug!("Perf run {}/{} exited with {}", run, perf.runs, status);
                    match read_perf_file(&perf_file).await {
                        Some(ms) => {
                            info!("Perf run {}/{} for {}: {}ms", run, perf.runs, build.commit, ms);
                            samples.push(ms);
                        }
                        None => warn!("Perf run {}/{} for {} produced no timing", run, perf.runs, build.commit),
                    }
                    // Leader is reaped; this only releases the output drains
                    process.terminate_tree().await?;
                }
                SampleOutcome::Exited(Err(e)) => {
                    process.terminate_tree().await?;
                    return Err(e);
                }
                SampleOutcome::TimedOut => {
                    warn!(
                        "Perf run {}/{} for {} timed out after {}ms",
                        run,
                        perf.runs,
                        build.commit,
                        perf.timeout.as_millis()
                    );
                    process.terminate_tree().await?;
                }
                SampleOutcome::Cancelled => {
                    process.terminate_tree().await?;
                    return Err(BisectError::Cancelled);
                }
            }
        }

        Ok(Instance::finished(build.clone(), samples.into_iter().min()))
    }
}

#[async_trait]
impl<F: ArchiveFetcher, B: Browser> Launcher for ProcessLauncher<F, B> {
    async fn launch(&self, build: &Build) -> Result<Instance> {
        if self.cancel.is_cancelled() {
            return Err(BisectError::Cancelled);
        }

        match build.runtime {
            Runtime::WebRemote => self.launch_remote(build).await,
            Runtime::WebLocal => self.launch_web(build).await,
            Runtime::DesktopLocal => match self.settings.perf {
                Some(perf) => self.launch_desktop_perf(build, perf).await,
                None => self.launch_desktop(build).await,
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::install::INSTALL_MARKER;
    use crate::launcher::test_support::write_script;
    use crate::platform::Platform;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct NoDownloads;

    #[async_trait]
    impl ArchiveFetcher for NoDownloads {
        async fn fetch(&self, url: &str, _dest: &Path) -> Result<()> {
            Err(BisectError::Network(format!("unexpected download of {}", url)))
        }
    }

    #[derive(Default)]
    struct RecordingBrowser {
        opened: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Browser for RecordingBrowser {
        async fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct Fixture {
        temp: TempDir,
        workspace: Workspace,
        installer: Arc<ArchiveInstaller<NoDownloads>>,
        browser: Arc<RecordingBrowser>,
    }

    impl Fixture {
        async fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let workspace = Workspace::new(temp.path().join("root"));
            workspace.initialize().await.unwrap();
            let installer = Arc::new(ArchiveInstaller::new(
                Arc::new(NoDownloads),
                workspace.clone(),
                Platform::LinuxX64,
                "https://update.example.com",
            ));
            Self {
                temp,
                workspace,
                installer,
                browser: Arc::new(RecordingBrowser::default()),
            }
        }

        /// Pretend `build` is installed with `script` as its executable
        fn install(&self, build: &Build, script: &str) {
            let dir = self.installer.install_dir(build);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(INSTALL_MARKER), &build.commit).unwrap();
            let exe = self.installer.executable_path(build).unwrap();
            let relative = exe.strip_prefix(&dir).unwrap();
            write_script(&dir, relative.to_str().unwrap(), script);
        }

        fn launcher(&self, settings: LaunchSettings) -> ProcessLauncher<NoDownloads, RecordingBrowser> {
            ProcessLauncher::new(
                self.installer.clone(),
                self.browser.clone(),
                self.workspace.clone(),
                settings,
            )
        }

        fn opened(&self) -> Vec<String> {
            self.browser.opened.lock().unwrap().clone()
        }
    }

    fn fast_settings() -> LaunchSettings {
        LaunchSettings {
            ready_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_remote_opens_versioned_url() {
        let fixture = Fixture::new().await;
        let launcher = fixture.launcher(LaunchSettings {
            remote_url: "https://insiders.vscode.dev/".to_string(),
            ..fast_settings()
        });
        let build = Build::new(Runtime::WebRemote, "abc123");

        let mut instance = launcher.launch(&build).await.unwrap();
        assert_eq!(fixture.opened(), vec!["https://insiders.vscode.dev/?vscode-version=abc123"]);
        assert!(instance.pid().is_none());
        instance.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_web_waits_for_ready_line_and_opens_browser() {
        let fixture = Fixture::new().await;
        let args_file = fixture.temp.path().join("args.txt");
        let build = Build::new(Runtime::WebLocal, "abc123");
        fixture.install(
            &build,
            &format!(
                "echo \"$@\" > {}\necho '*'\necho 'Web UI available at http://localhost:8000/?tkn=abc-123'\nsleep 30\n",
                args_file.display()
            ),
        );

        let launcher = fixture.launcher(fast_settings());
        let mut instance = launcher.launch(&build).await.unwrap();

        assert_eq!(instance.url(), Some("http://localhost:8000/?tkn=abc-123"));
        assert_eq!(fixture.opened(), vec!["http://localhost:8000/?tkn=abc-123"]);
        assert!(instance.is_running());

        let args = std::fs::read_to_string(&args_file).unwrap();
        assert!(args.contains("--accept-server-license-terms"));
        assert!(args.contains("--disable-telemetry"));
        assert!(args.contains(&format!("--server-data-dir {}", fixture.workspace.server_data_dir().display())));
        assert!(args.contains(&format!("--extensions-dir {}", fixture.workspace.extensions_dir().display())));

        instance.stop().await.unwrap();
        assert!(!instance.is_running());
        instance.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_web_exit_before_ready() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::WebLocal, "abc123");
        fixture.install(&build, "echo 'port in use' >&2\nexit 1\n");

        let err = fixture.launcher(fast_settings()).launch(&build).await.unwrap_err();
        assert!(matches!(err, BisectError::ProcessExited(_)));
        assert!(fixture.opened().is_empty());
    }

    #[tokio::test]
    async fn test_web_ready_timeout() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::WebLocal, "abc123");
        fixture.install(&build, "sleep 30\n");

        let launcher = fixture.launcher(LaunchSettings {
            ready_timeout: Duration::from_millis(200),
            ..fast_settings()
        });
        let err = launcher.launch(&build).await.unwrap_err();
        assert!(matches!(err, BisectError::ReadyTimeout(200)));
    }

    #[tokio::test]
    async fn test_web_launch_cancelled() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::WebLocal, "abc123");
        fixture.install(&build, "sleep 30\n");

        let cancel = CancellationToken::new();
        let launcher = fixture.launcher(fast_settings()).with_cancellation(cancel.clone());
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let err = launcher.launch(&build).await.unwrap_err();
        assert!(matches!(err, BisectError::Cancelled));
        trigger.await.unwrap();

        // Further launches are refused
        let err = launcher.launch(&build).await.unwrap_err();
        assert!(matches!(err, BisectError::Cancelled));
    }

    #[tokio::test]
    async fn test_missing_executable_is_artifact_error() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::DesktopLocal, "abc123");
        let dir = fixture.installer.install_dir(&build);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(INSTALL_MARKER), "abc123").unwrap();

        let err = fixture.launcher(fast_settings()).launch(&build).await.unwrap_err();
        match err {
            BisectError::MissingArtifact(path) => {
                assert!(path.ends_with("VSCode-linux-x64/code-insiders"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_not_installed_surfaces_download_error() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::DesktopLocal, "abc123");

        let err = fixture.launcher(fast_settings()).launch(&build).await.unwrap_err();
        assert!(matches!(err, BisectError::Network(_)));
    }

    /// Takes seconds per download
    struct SlowLink;

    #[async_trait]
    impl ArchiveFetcher for SlowLink {
        async fn fetch(&self, url: &str, _dest: &Path) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Err(BisectError::Network(format!("{} finished too late", url)))
        }
    }

    #[tokio::test]
    async fn test_cancel_during_download() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::new(temp.path().join("root"));
        workspace.initialize().await.unwrap();
        let installer = Arc::new(ArchiveInstaller::new(
            Arc::new(SlowLink),
            workspace.clone(),
            Platform::LinuxX64,
            "https://update.example.com",
        ));
        let cancel = CancellationToken::new();
        let launcher = ProcessLauncher::new(installer.clone(), Arc::new(RecordingBrowser::default()), workspace, fast_settings())
            .with_cancellation(cancel.clone());
        let build = Build::new(Runtime::DesktopLocal, "abc123");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let err = launcher.launch(&build).await.unwrap_err();

        assert!(matches!(err, BisectError::Cancelled), "got {err}");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!installer.install_dir(&build).join(INSTALL_MARKER).exists());
    }

    #[tokio::test]
    async fn test_desktop_passes_data_dirs() {
        let fixture = Fixture::new().await;
        let args_file = fixture.temp.path().join("args.txt");
        let build = Build::new(Runtime::DesktopLocal, "abc123");
        fixture.install(&build, &format!("echo \"$@\" > {}\nsleep 30\n", args_file.display()));

        let mut instance = fixture.launcher(fast_settings()).launch(&build).await.unwrap();
        assert!(instance.elapsed_ms().is_none());

        let mut args = String::new();
        for _ in 0..50 {
            args = std::fs::read_to_string(&args_file).unwrap_or_default();
            if !args.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(args.contains(&format!("--user-data-dir {}", fixture.workspace.user_data_dir().display())));
        assert!(args.contains("--disable-workspace-trust"));
        assert!(fixture.opened().is_empty());

        instance.stop().await.unwrap();
        instance.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_perf_keeps_fastest_sample() {
        let fixture = Fixture::new().await;
        let counter = fixture.temp.path().join("counter");
        let build = Build::new(Runtime::DesktopLocal, "abc123");
        fixture.install(
            &build,
            &format!(
                r#"n=$(cat {counter} 2>/dev/null || echo 0)
n=$((n + 1))
echo $n > {counter}
while [ $# -gt 0 ]; do
  if [ "$1" = "--prof-duration-markers-file" ]; then
    printf '%s\tcode/didStartWorkbench\n' $((1000 - n * 100)) > "$2"
  fi
  shift
done
"#,
                counter = counter.display()
            ),
        );

        let launcher = fixture.launcher(LaunchSettings {
            perf: Some(PerfOptions {
                runs: 3,
                timeout: Duration::from_secs(10),
            }),
            ..fast_settings()
        });
        let mut instance = launcher.launch(&build).await.unwrap();

        assert_eq!(instance.elapsed_ms(), Some(700));
        assert_eq!(std::fs::read_to_string(&counter).unwrap().trim(), "3");
        assert!(!instance.is_running());
        instance.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_perf_timeout_is_missing_sample() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::DesktopLocal, "abc123");
        fixture.install(&build, "sleep 30\n");

        let launcher = fixture.launcher(LaunchSettings {
            perf: Some(PerfOptions {
                runs: 2,
                timeout: Duration::from_millis(200),
            }),
            ..fast_settings()
        });
        let instance = launcher.launch(&build).await.unwrap();
        assert_eq!(instance.elapsed_ms(), None);
    }

    #[tokio::test]
    async fn test_perf_without_results_file() {
        let fixture = Fixture::new().await;
        let build = Build::new(Runtime::DesktopLocal, "abc123");
        fixture.install(&build, "exit 0\n");

        let launcher = fixture.launcher(LaunchSettings {
            perf: Some(PerfOptions {
                runs: 1,
                timeout: Duration::from_secs(5),
            }),
            ..fast_settings()
        });
        let instance = launcher.launch(&build).await.unwrap();
        assert_eq!(instance.elapsed_ms(), None);
    }
}
