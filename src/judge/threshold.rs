//! Automated judge for performance bisection.

use std::collections::HashMap;

use async_trait::async_trait;
use log::{info, warn};
use tokio::sync::Mutex;

use super::Judge;
use crate::domain::Verdict;
use crate::error::Result;
use crate::launcher::Instance;

/// Judges builds by measured startup time.
///
/// A build slower than the threshold is bad. A build that produced no
/// measurement is retried up to `max_retries` times and then judged bad.
pub struct ThresholdJudge {
    threshold_ms: u64,
    max_retries: u32,
    retries: Mutex<HashMap<String, u32>>,
}

impl ThresholdJudge {
    pub fn new(threshold_ms: u64, max_retries: u32) -> Self {
        Self {
            threshold_ms,
            max_retries,
            retries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Judge for ThresholdJudge {
    async fn judge(&self, instance: &Instance) -> Result<Verdict> {
        let commit = &instance.build().commit;

        let Some(elapsed) = instance.elapsed_ms() else {
            let mut retries = self.retries.lock().await;
            let count = retries.entry(commit.clone()).or_insert(0);
            if *count < self.max_retries {
                *count += 1;
                warn!("No startup time for {}, retry {}/{}", commit, count, self.max_retries);
                return Ok(Verdict::Retry);
            }
            warn!("No startup time for {} after {} retries, marking bad", commit, self.max_retries);
            return Ok(Verdict::Bad);
        };

        let verdict = if elapsed > self.threshold_ms {
            Verdict::Bad
        } else {
            Verdict::Good
        };
        info!(
            "{}: {}ms (threshold {}ms) => {}",
            commit, elapsed, self.threshold_ms, verdict
        );
        Ok(verdict)
    }
}
