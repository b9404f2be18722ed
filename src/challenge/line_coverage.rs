//! Challenge to cover one specific source line.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::context::EvalContext;
use crate::challenge::model::HIGH_COVERAGE_THRESHOLD;
use crate::coverage::artifacts::FileFacts;
use crate::coverage::report::{BranchBaseline, LineStatus, SourceLine, SourceReport};
use crate::coverage::tracker;

/// Solved when the recorded line, relocated in the current markup, covers
/// strictly more branches than it did at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineCoverageChallenge {
    /// Coverage facts of the owning class at creation.
    pub facts: FileFacts,
    /// 1-based line number at creation.
    pub line_number: usize,
    /// Trimmed source text of the line at creation.
    pub line_text: String,
    /// Coverage status of the line at creation.
    pub status: LineStatus,
    /// Branch counters decoded from the title annotation at creation.
    pub baseline: BranchBaseline,
    /// Branch the challenge was created on.
    pub branch: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Solve timestamp, set at most once.
    pub solved: Option<DateTime<Utc>>,
    /// Coverage ratio observed at solve time.
    pub solved_coverage: Option<f64>,
}

impl LineCoverageChallenge {
    /// Snapshot a markup line as the target.
    pub fn new(facts: FileFacts, line: &SourceLine, branch: impl Into<String>) -> Self {
        Self {
            facts,
            line_number: line.number,
            line_text: line.text.clone(),
            status: line.status,
            baseline: BranchBaseline::from_line(line.status, line.title.as_deref()),
            branch: branch.into(),
            created: Utc::now(),
            solved: None,
            solved_coverage: None,
        }
    }

    /// Still solvable while the recorded line can be relocated among the
    /// not-fully-covered lines.
    pub fn is_solvable(&self, ctx: &EvalContext<'_>) -> bool {
        if ctx.branch != self.branch {
            return true;
        }
        if !self.facts.artifacts.all_exist(&ctx.workspace) {
            return true;
        }
        let markup = self.facts.artifacts.source_markup_in(&ctx.workspace);
        let Ok(report) = SourceReport::from_file(&markup) else {
            return true;
        };
        let candidates = report.uncovered_lines();
        tracker::relocate(&self.line_text, self.line_number, &candidates).is_some()
    }

    /// Solved when the relocated line covers more branches than it did at
    /// creation.
    pub fn is_solved(&mut self, ctx: &EvalContext<'_>) -> bool {
        if self.solved.is_some() {
            return true;
        }
        let markup = self.facts.artifacts.source_markup_in(&ctx.workspace);
        let Ok(report) = SourceReport::from_file(&markup) else {
            return false;
        };
        // Relocate over the whole document first; filtering to covered
        // lines up front would let a distant covered twin shadow the real
        // (still missed) target.
        let candidates: Vec<&SourceLine> = report.lines.iter().collect();
        let Some(line) = tracker::relocate(&self.line_text, self.line_number, &candidates) else {
            return false;
        };
        if line.status == LineStatus::Missed {
            return false;
        }
        if self.baseline.newly_covered(line.title.as_deref()).is_none() {
            return false;
        }
        self.solved = Some(Utc::now());
        self.solved_coverage = Some(self.facts.current_coverage(&ctx.workspace));
        true
    }

    /// Worth more for branching lines or already well-covered classes.
    pub fn score(&self) -> u32 {
        if self.facts.coverage >= HIGH_COVERAGE_THRESHOLD || self.baseline.max > 1 {
            3
        } else {
            2
        }
    }
}

/// Natural key: class plus line number and text.
impl PartialEq for LineCoverageChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.facts.package == other.facts.package
            && self.facts.file_name == other.facts.file_name
            && self.line_number == other.line_number
            && self.line_text == other.line_text
    }
}

impl fmt::Display for LineCoverageChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Write a test to cover line {} of class {} (branch {})",
            self.line_number,
            self.facts.class_name(),
            self.branch
        )
    }
}
