//! Challenge to raise the line coverage of a single method.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::context::EvalContext;
use crate::challenge::model::HIGH_COVERAGE_THRESHOLD;
use crate::coverage::artifacts::FileFacts;
use crate::coverage::report;

/// Solved when the target method has strictly fewer missed lines than at
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCoverageChallenge {
    /// Coverage facts of the owning class at creation.
    pub facts: FileFacts,
    /// Method name as rendered in the method table.
    pub method_name: String,
    /// Total line count of the method at creation.
    pub lines: usize,
    /// Missed line count at creation.
    pub missed_lines: usize,
    /// First source line of the method, if known.
    pub first_line: Option<usize>,
    /// Branch the challenge was created on.
    pub branch: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Solve timestamp, set at most once.
    pub solved: Option<DateTime<Utc>>,
    /// Coverage ratio observed at solve time.
    pub solved_coverage: Option<f64>,
}

impl MethodCoverageChallenge {
    /// Snapshot a method's missed-line count as the baseline to beat.
    pub fn new(facts: FileFacts, method: &report::MethodEntry, branch: impl Into<String>) -> Self {
        Self {
            facts,
            method_name: method.name.clone(),
            lines: method.lines,
            missed_lines: method.missed_lines,
            first_line: method.first_line,
            branch: branch.into(),
            created: Utc::now(),
            solved: None,
            solved_coverage: None,
        }
    }

    /// Still solvable while the method exists with missed lines.
    pub fn is_solvable(&self, ctx: &EvalContext<'_>) -> bool {
        if ctx.branch != self.branch {
            return true;
        }
        if !self.facts.artifacts.all_exist(&ctx.workspace) {
            return true;
        }
        let table = self.facts.artifacts.method_table_in(&ctx.workspace);
        match report::parse_method_table(&table) {
            Ok(entries) => entries
                .iter()
                .any(|m| m.name == self.method_name && m.missed_lines > 0),
            Err(_) => true,
        }
    }

    /// Solved when the method has fewer missed lines than at creation.
    pub fn is_solved(&mut self, ctx: &EvalContext<'_>) -> bool {
        if self.solved.is_some() {
            return true;
        }
        let table = self.facts.artifacts.method_table_in(&ctx.workspace);
        let Ok(entries) = report::parse_method_table(&table) else {
            return false;
        };
        let Some(entry) = entries.iter().find(|m| m.name == self.method_name) else {
            return false;
        };
        if entry.missed_lines < self.missed_lines {
            self.solved = Some(Utc::now());
            self.solved_coverage = Some(self.facts.current_coverage(&ctx.workspace));
            return true;
        }
        false
    }

    /// Worth more once the class already had high coverage.
    pub fn score(&self) -> u32 {
        if self.facts.coverage >= HIGH_COVERAGE_THRESHOLD {
            3
        } else {
            2
        }
    }
}

/// Natural key: class plus method name.
impl PartialEq for MethodCoverageChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.facts.package == other.facts.package
            && self.facts.file_name == other.facts.file_name
            && self.method_name == other.method_name
    }
}

impl fmt::Display for MethodCoverageChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Write a test to cover more lines of method {} in class {} (branch {})",
            self.method_name,
            self.facts.class_name(),
            self.branch
        )
    }
}
