use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::{LevelFilter, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod cli;
mod config;

use cli::Cli;
use config::Config;
use vscode_bisect::BisectError;
use vscode_bisect::bisect::Bisector;
use vscode_bisect::catalog::{BuildCatalog, CommitSource, HttpCommitSource};
use vscode_bisect::domain::{Runtime, Verdict};
use vscode_bisect::install::{ArchiveInstaller, HttpArchiveFetcher};
use vscode_bisect::judge::{Judge, PromptJudge, ThresholdJudge};
use vscode_bisect::launcher::{LaunchSettings, Launcher, PerfOptions, ProcessLauncher, SystemBrowser};
use vscode_bisect::platform::Platform;
use vscode_bisect::workspace::Workspace;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    // RUST_LOG still wins over the default level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .context("Failed to initialize logger")?;

    info!("Logging initialized at {}", level);
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(root) = &cli.root {
        config.workspace.root = Some(root.clone());
    }
    if let Some(runs) = cli.perf_runs {
        config.perf.runs = runs;
    }
    if let Some(threshold) = cli.perf_threshold {
        config.perf.threshold_ms = Some(threshold);
    }
    config
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    let runtime = Runtime::from(cli.runtime);
    if cli.perf && runtime != Runtime::DesktopLocal {
        bail!("--perf is only supported with --runtime desktop");
    }

    let platform = Platform::current().context("Failed to detect platform")?;
    info!("Running on {}", platform);

    let workspace = Workspace::new(config.workspace.resolved_root());
    if cli.reset {
        println!("{} {}", "Resetting".yellow(), workspace.root().display());
        workspace.reset().await.context("Failed to reset workspace")?;
    }
    workspace.initialize().await.context("Failed to initialize workspace")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping the running build");
            on_interrupt.cancel();
        }
    });

    let request_timeout = Duration::from_millis(config.endpoints.request_timeout_ms);
    let source = HttpCommitSource::new(&config.endpoints.update_base, request_timeout)
        .context("Failed to create catalog client")?;
    let fetcher = HttpArchiveFetcher::new(request_timeout).context("Failed to create download client")?;

    let installer = ArchiveInstaller::new(
        Arc::new(fetcher),
        workspace.clone(),
        platform,
        &config.endpoints.update_base,
    );
    let settings = LaunchSettings {
        remote_url: config.endpoints.remote_url.clone(),
        ready_timeout: config.launch.ready_timeout(),
        stop_timeout: config.launch.stop_timeout(),
        perf: cli.perf.then(|| PerfOptions {
            runs: config.perf.runs,
            timeout: Duration::from_millis(config.perf.timeout_ms),
        }),
    };
    let launcher = ProcessLauncher::new(Arc::new(installer), Arc::new(SystemBrowser), workspace, settings)
        .with_cancellation(cancel.clone());
    let catalog = BuildCatalog::new(Arc::new(source), platform);

    match (cli.perf, config.perf.threshold_ms) {
        (true, Some(threshold)) => {
            println!("{} {}ms", "Judging automatically, threshold".cyan(), threshold);
            let judge = ThresholdJudge::new(threshold, config.perf.max_retries);
            run_session(cli, runtime, catalog, launcher, judge, cancel).await
        }
        _ => run_session(cli, runtime, catalog, launcher, PromptJudge::stdin(), cancel).await,
    }
}

async fn run_session<S, L, J>(
    cli: &Cli,
    runtime: Runtime,
    catalog: BuildCatalog<S>,
    launcher: L,
    judge: J,
    cancel: CancellationToken,
) -> Result<()>
where
    S: CommitSource,
    L: Launcher,
    J: Judge,
{
    let bisector = Bisector::new(catalog, Arc::new(launcher), Arc::new(judge)).with_cancellation(cancel);

    let result = match &cli.commit {
        Some(commit) => match bisector.try_commit(runtime, commit).await {
            Ok(Verdict::Quit) => Ok(()),
            Ok(verdict) => {
                println!("{} {} is {}", "Result:".green(), commit, verdict);
                Ok(())
            }
            Err(e) => Err(e),
        },
        None => bisector
            .run(runtime, cli.good.as_deref(), cli.bad.as_deref())
            .await
            .map(|report| report.print_summary()),
    };

    match result {
        Ok(()) => Ok(()),
        Err(BisectError::Cancelled) => {
            println!("{}", "Cancelled".yellow());
            Ok(())
        }
        Err(e) => Err(e).context("Bisection failed"),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let config = apply_overrides(&cli, config);
    config.validate().context("Invalid configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(run_application(&cli, &config));

    // A prompt still waiting on stdin must not keep the process alive
    runtime.shutdown_background();

    result.context("Application failed")
}
