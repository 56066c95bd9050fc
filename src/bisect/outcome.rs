//! Bisection results and their terminal summary.

use colored::Colorize;

use crate::domain::{Build, Verdict};

const COMPARE_URL: &str = "https://github.com/microsoft/vscode/compare";

/// How a bisection session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BisectOutcome {
    /// Adjacent pair where the regression was introduced
    Boundary { bad: Build, good: Build },
    /// Every build judged was bad
    AllBad { oldest_bad: Build },
    /// Every build judged was good
    AllGood { newest_good: Build },
    /// Fewer than two builds to choose from
    InsufficientBuilds,
    /// The search ended without a single verdict
    NoBuildsJudged,
    /// The operator quit
    Aborted,
}

impl BisectOutcome {
    /// GitHub compare link between the good and bad commit
    pub fn compare_url(&self) -> Option<String> {
        match self {
            BisectOutcome::Boundary { bad, good } => Some(compare_url(&good.commit, &bad.commit)),
            _ => None,
        }
    }
}

pub fn compare_url(good: &str, bad: &str) -> String {
    format!("{}/{}...{}", COMPARE_URL, good, bad)
}

/// Result of a session: the outcome plus every verdict taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BisectReport {
    pub outcome: BisectOutcome,
    /// Number of launches issued, retries included
    pub launches: usize,
    /// Verdicts in the order they were given
    pub history: Vec<(Build, Verdict)>,
}

impl BisectReport {
    pub fn new(outcome: BisectOutcome) -> Self {
        Self {
            outcome,
            launches: 0,
            history: Vec::new(),
        }
    }

    /// Print the result for the operator
    pub fn print_summary(&self) {
        println!();
        match &self.outcome {
            BisectOutcome::Boundary { bad, good } => {
                println!("{}", "Bisection complete".green().bold());
                println!("  {} {}", "Last good build: ".green(), good.commit);
                println!("  {} {}", "First bad build: ".red(), bad.commit);
                println!("  {} {}", "Changes:".cyan(), compare_url(&good.commit, &bad.commit));
            }
            BisectOutcome::AllBad { oldest_bad } => {
                println!("{}", "All builds are bad".red().bold());
                println!("  Even the oldest build {} shows the problem.", oldest_bad.commit);
                println!("  Try again with an older --good commit.");
            }
            BisectOutcome::AllGood { newest_good } => {
                println!("{}", "All builds are good".green().bold());
                println!("  Even the newest build {} does not show the problem.", newest_good.commit);
                println!("  Try again with a newer --bad commit.");
            }
            BisectOutcome::InsufficientBuilds => {
                println!("{}", "Not enough builds to bisect".yellow().bold());
                println!("  Widen the range between --good and --bad.");
            }
            BisectOutcome::NoBuildsJudged => {
                println!("{}", "No builds were judged".yellow().bold());
            }
            BisectOutcome::Aborted => {
                println!("{}", "Bisection aborted".yellow().bold());
            }
        }

        if !self.history.is_empty() {
            println!();
            println!("{} ({} launches)", "Verdicts:".cyan(), self.launches);
            for (build, verdict) in &self.history {
                println!("  {} {}", build.commit, verdict);
            }
        }
    }
}
