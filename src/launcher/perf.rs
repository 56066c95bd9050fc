//! Startup performance sampling.

use std::path::Path;
use std::time::Duration;

use log::warn;

/// Arguments that make an instrumented desktop build record its startup time
/// and exit on its own
pub const PERF_MARKERS: &[&str] = &[
    "--prof-duration-markers",
    "code/timeOrigin",
    "--prof-duration-markers",
    "code/didStartWorkbench",
];

/// How startup time is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfOptions {
    /// Samples per build; the fastest is kept
    pub runs: u32,
    /// Deadline for one sample
    pub timeout: Duration,
}

impl Default for PerfOptions {
    fn default() -> Self {
        Self {
            runs: 3,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Leading decimal integer of the first line, in milliseconds
pub fn parse_elapsed(content: &str) -> Option<u64> {
    let first = content.lines().next()?.trim_start();
    let digits: String = first.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Read the elapsed time written by a perf run.
///
/// A missing or malformed file yields `None`.
pub async fn read_perf_file(path: &Path) -> Option<u64> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let elapsed = parse_elapsed(&content);
            if elapsed.is_none() {
                warn!("Malformed perf results in {}", path.display());
            }
            elapsed
        }
        Err(e) => {
            warn!("No perf results at {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_elapsed() {
        assert_eq!(parse_elapsed("1234\tcode/didStartWorkbench\n"), Some(1234));
        assert_eq!(parse_elapsed("987"), Some(987));
        assert_eq!(parse_elapsed("  42 ms\nsecond line 7"), Some(42));
        assert_eq!(parse_elapsed("abc 123"), None);
        assert_eq!(parse_elapsed(""), None);
        assert_eq!(parse_elapsed("\n123"), None);
    }

    #[tokio::test]
    async fn test_read_perf_file_soft_failures() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("perf.txt");
        assert_eq!(read_perf_file(&path).await, None);

        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(read_perf_file(&path).await, None);

        std::fs::write(&path, "1500\tcode/timeOrigin\n").unwrap();
        assert_eq!(read_perf_file(&path).await, Some(1500));
    }
}
