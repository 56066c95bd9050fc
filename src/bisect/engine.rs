//! Drives launches and verdicts through the binary search.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::{BisectOutcome, BisectReport, BisectState};
use crate::catalog::{BuildCatalog, CommitSource};
use crate::domain::{Build, BuildRange, Runtime, Verdict};
use crate::error::{BisectError, Result};
use crate::judge::Judge;
use crate::launcher::Launcher;

/// Bisection session over released builds
pub struct Bisector<S: CommitSource, L: Launcher, J: Judge> {
    catalog: BuildCatalog<S>,
    launcher: Arc<L>,
    judge: Arc<J>,
    cancel: CancellationToken,
}

impl<S: CommitSource, L: Launcher, J: Judge> Bisector<S, L, J> {
    pub fn new(catalog: BuildCatalog<S>, launcher: Arc<L>, judge: Arc<J>) -> Self {
        Self {
            catalog,
            launcher,
            judge,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort waiting on the judge when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Find the newest bad / oldest good pair between `good` and `bad`.
    ///
    /// Missing bounds default to the oldest and newest released build.
    pub async fn run(&self, runtime: Runtime, good: Option<&str>, bad: Option<&str>) -> Result<BisectReport> {
        let range = tokio::select! {
            range = self.catalog.fetch_range(runtime, good, bad) => range?,
            _ = self.cancel.cancelled() => return Err(BisectError::Cancelled),
        };

        if range.len() < 2 {
            let outcome = match range.get(0) {
                Some(build) if good.is_some() => BisectOutcome::AllGood {
                    newest_good: build.clone(),
                },
                Some(build) if bad.is_some() => BisectOutcome::AllBad {
                    oldest_bad: build.clone(),
                },
                _ => BisectOutcome::InsufficientBuilds,
            };
            info!("Only {} build(s) in range, nothing to bisect", range.len());
            return Ok(BisectReport::new(outcome));
        }

        self.search(&range).await
    }

    /// Binary search over an already selected range
    pub async fn search(&self, range: &BuildRange) -> Result<BisectReport> {
        if range.len() < 2 {
            return Ok(BisectReport::new(BisectOutcome::InsufficientBuilds));
        }

        let mut state = BisectState::new(range.len());
        let mut report = BisectReport::new(BisectOutcome::NoBuildsJudged);
        let mut judged: HashMap<usize, Verdict> = HashMap::new();
        let mut newest_good: Option<(usize, &Build)> = None;
        let mut oldest_bad: Option<(usize, &Build)> = None;

        loop {
            let index = state.current_index();
            let Some(build) = range.get(index) else {
                break;
            };

            let verdict = match judged.get(&index) {
                Some(verdict) => {
                    debug!("Reusing verdict {} for {}", verdict, build.commit);
                    *verdict
                }
                None => {
                    info!(
                        "Step: build {} of {} ({}), chunk {}",
                        index + 1,
                        range.len(),
                        build.commit,
                        state.current_chunk()
                    );
                    report.launches += 1;
                    let verdict = self.try_build(build).await?;
                    report.history.push((build.clone(), verdict));
                    verdict
                }
            };

            match verdict {
                Verdict::Quit => {
                    info!("Bisection aborted at {}", build.commit);
                    report.outcome = BisectOutcome::Aborted;
                    return Ok(report);
                }
                Verdict::Retry => {
                    debug!("Retrying {}", build.commit);
                    continue;
                }
                Verdict::Bad => {
                    if oldest_bad.is_none_or(|(i, _)| index > i) {
                        oldest_bad = Some((index, build));
                    }
                }
                Verdict::Good => {
                    if newest_good.is_none_or(|(i, _)| index < i) {
                        newest_good = Some((index, build));
                    }
                }
            }
            judged.insert(index, verdict);

            if state.step(verdict) {
                break;
            }
        }

        report.outcome = match (oldest_bad, newest_good) {
            (Some((bad_index, bad)), Some((good_index, good))) => {
                if good_index != bad_index + 1 {
                    warn!(
                        "Verdicts are inconsistent, {} (bad) and {} (good) are not adjacent",
                        bad.commit, good.commit
                    );
                }
                BisectOutcome::Boundary {
                    bad: bad.clone(),
                    good: good.clone(),
                }
            }
            (Some((_, bad)), None) => BisectOutcome::AllBad {
                oldest_bad: bad.clone(),
            },
            (None, Some((_, good))) => BisectOutcome::AllGood {
                newest_good: good.clone(),
            },
            (None, None) => BisectOutcome::NoBuildsJudged,
        };
        Ok(report)
    }

    /// Launch one commit and ask the judge about it, without bisecting.
    ///
    /// Retries relaunch the same build. Returns the final verdict.
    pub async fn try_commit(&self, runtime: Runtime, commit: &str) -> Result<Verdict> {
        let build = Build::new(runtime, commit);
        loop {
            let verdict = self.try_build(&build).await?;
            if verdict != Verdict::Retry {
                return Ok(verdict);
            }
        }
    }

    /// Launch `build`, collect a verdict and stop the instance.
    ///
    /// The instance is always stopped before returning, whatever the judge said.
    async fn try_build(&self, build: &Build) -> Result<Verdict> {
        let mut instance = match self.launcher.launch(build).await {
            Ok(instance) => instance,
            Err(e) if e.is_launch_failure() => {
                warn!("Build {} failed to start: {}", build.commit, e);
                return self.judge.recover(build, e).await;
            }
            Err(e) => return Err(e),
        };

        let verdict = tokio::select! {
            verdict = self.judge.judge(&instance) => verdict,
            _ = self.cancel.cancelled() => Err(BisectError::Cancelled),
        };

        let stopped = instance.stop().await;
        let verdict = verdict?;
        stopped?;
        Ok(verdict)
    }
}
