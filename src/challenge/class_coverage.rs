//! Challenge to raise the line coverage of a whole class.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::context::EvalContext;
use crate::challenge::model::HIGH_COVERAGE_THRESHOLD;
use crate::coverage::artifacts::FileFacts;
use crate::coverage::report::SourceReport;

/// Solved when the class's instruction-coverage ratio strictly exceeds
/// the ratio captured at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCoverageChallenge {
    /// Coverage facts of the class at creation.
    pub facts: FileFacts,
    /// Branch the challenge was created on.
    pub branch: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Solve timestamp, set at most once.
    pub solved: Option<DateTime<Utc>>,
    /// Coverage ratio observed at solve time.
    pub solved_coverage: Option<f64>,
}

impl ClassCoverageChallenge {
    /// Snapshot the class's coverage as the baseline to beat.
    pub fn new(facts: FileFacts, branch: impl Into<String>) -> Self {
        Self {
            facts,
            branch: branch.into(),
            created: Utc::now(),
            solved: None,
            solved_coverage: None,
        }
    }

    /// Still solvable while any line of the class is not fully covered.
    pub fn is_solvable(&self, ctx: &EvalContext<'_>) -> bool {
        if ctx.branch != self.branch {
            return true;
        }
        if !self.facts.artifacts.all_exist(&ctx.workspace) {
            return true;
        }
        let markup = self.facts.artifacts.source_markup_in(&ctx.workspace);
        match SourceReport::from_file(&markup) {
            Ok(report) => !report.uncovered_lines().is_empty(),
            Err(_) => true,
        }
    }

    /// Solved when the class's coverage ratio strictly improved.
    pub fn is_solved(&mut self, ctx: &EvalContext<'_>) -> bool {
        if self.solved.is_some() {
            return true;
        }
        let current = self.facts.current_coverage(&ctx.workspace);
        if current > self.facts.coverage {
            self.solved = Some(Utc::now());
            self.solved_coverage = Some(current);
            return true;
        }
        false
    }

    /// Worth more once the class already had high coverage.
    pub fn score(&self) -> u32 {
        if self.facts.coverage >= HIGH_COVERAGE_THRESHOLD {
            2
        } else {
            1
        }
    }
}

/// Natural key: the class itself.
impl PartialEq for ClassCoverageChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.facts.package == other.facts.package && self.facts.file_name == other.facts.file_name
    }
}

impl fmt::Display for ClassCoverageChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Write a test to cover more lines of class {} (branch {})",
            self.facts.class_name(),
            self.branch
        )
    }
}
