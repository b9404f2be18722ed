//! Challenges produced by registered extension factories.
//!
//! Extension categories (mutation, smell, anything host-defined) are built
//! by factory functions registered at startup. The engine carries their
//! records through the board but delegates the solve decision to the host,
//! which calls [`CustomChallenge::mark_solved`] when its own evaluation
//! succeeds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::context::EvalContext;
use crate::coverage::artifacts::FileFacts;
use crate::selection::category::CategoryTag;

/// Challenge with host-defined semantics, identified by its category name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomChallenge {
    /// Category name the producing factory was registered under.
    pub name: String,
    /// Human-readable goal shown to the contributor.
    pub description: String,
    /// Fixed score awarded on solve.
    pub points: u32,
    /// Coverage facts of the target file, when file-scoped.
    pub facts: Option<FileFacts>,
    /// Branch the challenge was created on.
    pub branch: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Solve timestamp, set at most once.
    pub solved: Option<DateTime<Utc>>,
}

impl CustomChallenge {
    /// Build a challenge under the given registered category name.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        facts: Option<FileFacts>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            points,
            facts,
            branch: branch.into(),
            created: Utc::now(),
            solved: None,
        }
    }

    /// The category tag the producing factory was registered under.
    pub fn category(&self) -> CategoryTag {
        CategoryTag::from(self.name.clone())
    }

    /// Host-evaluated challenges stay solvable until the host decides.
    pub fn is_solvable(&self, _ctx: &EvalContext<'_>) -> bool {
        true
    }

    /// Reflects the host's decision recorded via [`Self::mark_solved`].
    pub fn is_solved(&mut self, _ctx: &EvalContext<'_>) -> bool {
        self.solved.is_some()
    }

    /// Record the host's solve decision. The timestamp is set once.
    pub fn mark_solved(&mut self) {
        if self.solved.is_none() {
            self.solved = Some(Utc::now());
        }
    }

    /// Fixed score declared by the producing factory.
    pub fn score(&self) -> u32 {
        self.points
    }
}

/// Natural key: category name, description and target file.
impl PartialEq for CustomChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.facts.as_ref().map(|f| f.class_name())
                == other.facts.as_ref().map(|f| f.class_name())
    }
}

impl fmt::Display for CustomChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
