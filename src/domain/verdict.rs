//! Judge verdicts.

use std::fmt;

/// Classification of a running build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Build behaves correctly
    Good,
    /// Build exhibits the regression
    Bad,
    /// Launch the same build again without advancing
    Retry,
    /// Abort the session
    Quit,
}

impl Verdict {
    /// Parse an operator answer (`g`, `good`, `b`, `bad`, `r`, `retry`, `q`, `quit`)
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "g" | "good" => Some(Verdict::Good),
            "b" | "bad" => Some(Verdict::Bad),
            "r" | "retry" => Some(Verdict::Retry),
            "q" | "quit" => Some(Verdict::Quit),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Good => "good",
            Verdict::Bad => "bad",
            Verdict::Retry => "retry",
            Verdict::Quit => "quit",
        };
        f.write_str(s)
    }
}
