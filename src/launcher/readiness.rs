//! Web server readiness detection.

use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncBufRead, Lines};

use crate::error::{BisectError, Result};

static READY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Web UI available at (http://localhost:\d+/\?tkn=\S+)").unwrap());

/// Extract the access URL from a server output line, if it is the readiness line
pub fn match_ready_url(line: &str) -> Option<String> {
    READY_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read lines until the readiness line appears and return its URL.
///
/// Fails with `ProcessExited` if the stream ends first.
pub async fn wait_for_ready<R>(lines: &mut Lines<R>) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        log::debug!("[server] {}", line);
        if let Some(url) = match_ready_url(&line) {
            return Ok(url);
        }
    }
    Err(BisectError::ProcessExited(
        "server output ended before the web UI was available".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[test]
    fn test_match_ready_url() {
        assert_eq!(
            match_ready_url("Web UI available at http://localhost:8000/?tkn=5f1c-aa09"),
            Some("http://localhost:8000/?tkn=5f1c-aa09".to_string())
        );
        assert_eq!(
            match_ready_url("[main 2024-01-01] Web UI available at http://localhost:9888/?tkn=abc"),
            Some("http://localhost:9888/?tkn=abc".to_string())
        );
        assert_eq!(match_ready_url("Extension host agent started."), None);
        assert_eq!(match_ready_url("Web UI available at http://example.com/"), None);
    }

    #[tokio::test]
    async fn test_wait_for_ready_skips_noise() {
        let output: &[u8] = b"*\n* Visual Studio Code Server\n*\nWeb UI available at http://localhost:8000/?tkn=t0k3n\nmore\n";
        let mut lines = BufReader::new(output).lines();
        let url = wait_for_ready(&mut lines).await.unwrap();
        assert_eq!(url, "http://localhost:8000/?tkn=t0k3n");
        // Remaining output is still readable
        assert_eq!(lines.next_line().await.unwrap(), Some("more".to_string()));
    }

    #[tokio::test]
    async fn test_wait_for_ready_eof() {
        let output: &[u8] = b"starting\nshutting down\n";
        let mut lines = BufReader::new(output).lines();
        let err = wait_for_ready(&mut lines).await.unwrap_err();
        assert!(matches!(err, BisectError::ProcessExited(_)));
    }
}
