//! Placeholder issued when generation could not produce a real challenge.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::context::EvalContext;

/// Always counts as solved (for nothing) so the next evaluation drains it
/// from the board and generation can try again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyChallenge {
    /// Branch the generation pass ran on.
    pub branch: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl DummyChallenge {
    /// Placeholder for an exhausted generation pass.
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            created: Utc::now(),
        }
    }

    /// Placeholders never block the board.
    pub fn is_solvable(&self, _ctx: &EvalContext<'_>) -> bool {
        true
    }

    /// Immediately solved, so evaluation retires it without any reward or
    /// a rejection record.
    pub fn is_solved(&mut self, _ctx: &EvalContext<'_>) -> bool {
        true
    }

    /// Placeholders score nothing.
    pub fn score(&self) -> u32 {
        0
    }
}

/// All placeholders on the same branch are interchangeable.
impl PartialEq for DummyChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.branch == other.branch
    }
}

impl fmt::Display for DummyChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No challenge could be generated this round, try again after the next build")
    }
}
