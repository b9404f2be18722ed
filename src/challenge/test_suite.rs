//! Challenge to write a new test.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::challenge::context::EvalContext;
use crate::vcs::history::{self, HistoryMiner};

/// Solved when the working copy contains more test files than at creation
/// and the contributor has touched a test file since the recorded commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteChallenge {
    /// Contributor the challenge belongs to.
    pub identity_id: String,
    /// Branch the challenge was created on.
    pub branch: String,
    /// HEAD commit at creation, the mining floor for the solve check.
    pub commit_id: String,
    /// Number of test files in the working copy at creation.
    pub initial_test_count: usize,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Solve timestamp, set at most once.
    pub solved: Option<DateTime<Utc>>,
}

impl TestSuiteChallenge {
    /// Record the current test-file count as the baseline to beat.
    pub fn new(
        identity_id: impl Into<String>,
        branch: impl Into<String>,
        commit_id: impl Into<String>,
        initial_test_count: usize,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            branch: branch.into(),
            commit_id: commit_id.into(),
            initial_test_count,
            created: Utc::now(),
            solved: None,
        }
    }

    /// A new test can always be written.
    pub fn is_solvable(&self, _ctx: &EvalContext<'_>) -> bool {
        true
    }

    /// Solved when the test-file count grew and the growth is attributable
    /// to this contributor.
    pub fn is_solved(&mut self, ctx: &EvalContext<'_>) -> bool {
        if self.solved.is_some() {
            return true;
        }

        let current = history::count_test_files(&ctx.workspace, &ctx.config.mining);
        if current <= self.initial_test_count {
            return false;
        }

        let Ok(miner) = HistoryMiner::open(&ctx.workspace, ctx.config.mining.clone()) else {
            return false;
        };
        let records = miner.mine(&self.commit_id, ctx.identities);
        let touched_test = history::test_records(&records)
            .iter()
            .any(|record| record.changed_by.contains(&self.identity_id));
        if !touched_test {
            debug!(identity = %self.identity_id, "test count grew without an attributed test change");
            return false;
        }

        self.solved = Some(Utc::now());
        true
    }

    /// Flat score.
    pub fn score(&self) -> u32 {
        1
    }
}

/// Natural key: contributor and the commit the count was taken at.
impl PartialEq for TestSuiteChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.identity_id == other.identity_id && self.commit_id == other.commit_id
    }
}

impl fmt::Display for TestSuiteChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Write a new test on branch {}", self.branch)
    }
}
