//! Interactive operator prompt.

use std::io::Write;

use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::Judge;
use crate::domain::{Build, Verdict};
use crate::error::{BisectError, Result};
use crate::launcher::Instance;

/// Asks the operator for a verdict on each build
pub struct PromptJudge<R> {
    input: Mutex<Lines<R>>,
}

impl PromptJudge<BufReader<Stdin>> {
    /// Prompt on the terminal
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> PromptJudge<R> {
    pub fn new(reader: R) -> Self {
        Self {
            input: Mutex::new(reader.lines()),
        }
    }

    /// Print `question` and read answers until one parses.
    ///
    /// End of input counts as quit.
    async fn ask(&self, question: &str, allowed: &[Verdict]) -> Result<Verdict> {
        let mut input = self.input.lock().await;
        loop {
            print!("{} ", question);
            std::io::stdout().flush().map_err(|e| BisectError::Prompt(e.to_string()))?;

            let Some(line) = input.next_line().await.map_err(|e| BisectError::Prompt(e.to_string()))? else {
                println!();
                return Ok(Verdict::Quit);
            };

            match Verdict::parse(&line) {
                Some(verdict) if allowed.contains(&verdict) => return Ok(verdict),
                _ => println!("{}", "Please answer with one of the listed options.".yellow()),
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Judge for PromptJudge<R> {
    async fn judge(&self, instance: &Instance) -> Result<Verdict> {
        let build = instance.build();
        println!();
        println!("{} {}", "Trying build:".cyan(), build.commit.bold());
        if let Some(url) = instance.url() {
            println!("  {}", url);
        }
        if let Some(ms) = instance.elapsed_ms() {
            println!("  {} {}ms", "Startup time:".cyan(), ms);
        }

        self.ask(
            "Is this build good? [g]ood / [b]ad / [r]etry / [q]uit:",
            &[Verdict::Good, Verdict::Bad, Verdict::Retry, Verdict::Quit],
        )
        .await
    }

    async fn recover(&self, build: &Build, error: BisectError) -> Result<Verdict> {
        println!();
        println!("{} {}: {}", "Failed to start".red(), build.commit.bold(), error);
        self.ask(
            "Mark it [b]ad, [r]etry or [q]uit:",
            &[Verdict::Bad, Verdict::Retry, Verdict::Quit],
        )
        .await
    }
}
