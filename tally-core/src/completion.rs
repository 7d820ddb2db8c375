//! The categorization capability: prompt text in, completion text out.
//!
//! The remote model lives behind this trait so a canned response or a
//! deterministic rule engine can replace it without touching the loaders,
//! the response parser or the writers.

use anyhow::Result;

pub trait Completer {
    /// One blocking call. Errors propagate unchanged; no retry.
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<F> Completer for F
where
    F: Fn(&str) -> Result<String>,
{
    fn complete(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

/// Always answers with the same text. Handy for replays and tests.
#[derive(Debug, Clone)]
pub struct CannedCompleter {
    pub response: String,
}

impl CannedCompleter {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Completer for CannedCompleter {
    fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}
