//! The closed challenge variant set and its common surface.
//!
//! Every challenge kind is a plain struct; this enum is the single
//! polymorphic seam. Records serialize internally tagged on `category` so
//! a persisted challenge is flat and self-describing, and deserializing a
//! record from an older run restores the exact variant.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::branch_coverage::BranchCoverageChallenge;
use crate::challenge::build::BuildChallenge;
use crate::challenge::class_coverage::ClassCoverageChallenge;
use crate::challenge::context::EvalContext;
use crate::challenge::custom::CustomChallenge;
use crate::challenge::dummy::DummyChallenge;
use crate::challenge::line_coverage::LineCoverageChallenge;
use crate::challenge::method_coverage::MethodCoverageChallenge;
use crate::challenge::test_suite::TestSuiteChallenge;
use crate::selection::category::CategoryTag;

/// Coverage ratio past which coverage challenges are worth more.
pub const HIGH_COVERAGE_THRESHOLD: f64 = 0.8;

/// One challenge instance of any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum Challenge {
    /// Fix a failing build.
    #[serde(rename = "build")]
    Build(BuildChallenge),
    /// Write a new test.
    #[serde(rename = "test")]
    Test(TestSuiteChallenge),
    /// Raise the coverage of a whole class.
    #[serde(rename = "class-coverage")]
    Class(ClassCoverageChallenge),
    /// Raise the coverage of a single method.
    #[serde(rename = "method-coverage")]
    Method(MethodCoverageChallenge),
    /// Cover a specific line.
    #[serde(rename = "line-coverage")]
    Line(LineCoverageChallenge),
    /// Cover more branches of a specific line.
    #[serde(rename = "branch-coverage")]
    Branch(BranchCoverageChallenge),
    /// Placeholder when generation came up empty.
    #[serde(rename = "dummy")]
    Dummy(DummyChallenge),
    /// Extension challenge from a registered factory.
    #[serde(rename = "custom")]
    Custom(CustomChallenge),
}

impl Challenge {
    /// Category tag of the instance.
    pub fn category(&self) -> CategoryTag {
        match self {
            Self::Build(_) => CategoryTag::Build,
            Self::Test(_) => CategoryTag::Test,
            Self::Class(_) => CategoryTag::Class,
            Self::Method(_) => CategoryTag::Method,
            Self::Line(_) => CategoryTag::Line,
            Self::Branch(_) => CategoryTag::Branch,
            Self::Dummy(_) => CategoryTag::Dummy,
            Self::Custom(c) => c.category(),
        }
    }

    /// Creation timestamp.
    pub fn created(&self) -> DateTime<Utc> {
        match self {
            Self::Build(c) => c.created,
            Self::Test(c) => c.created,
            Self::Class(c) => c.created,
            Self::Method(c) => c.created,
            Self::Line(c) => c.created,
            Self::Branch(c) => c.created,
            Self::Dummy(c) => c.created,
            Self::Custom(c) => c.created,
        }
    }

    /// Solve timestamp, if the challenge has been solved.
    pub fn solved(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Build(c) => c.solved,
            Self::Test(c) => c.solved,
            Self::Class(c) => c.solved,
            Self::Method(c) => c.solved,
            Self::Line(c) => c.solved,
            Self::Branch(c) => c.solved,
            Self::Dummy(_) => None,
            Self::Custom(c) => c.solved,
        }
    }

    /// Whether the goal can still be met, re-derived from current state.
    pub fn is_solvable(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::Build(c) => c.is_solvable(ctx),
            Self::Test(c) => c.is_solvable(ctx),
            Self::Class(c) => c.is_solvable(ctx),
            Self::Method(c) => c.is_solvable(ctx),
            Self::Line(c) => c.is_solvable(ctx),
            Self::Branch(c) => c.is_solvable(ctx),
            Self::Dummy(c) => c.is_solvable(ctx),
            Self::Custom(c) => c.is_solvable(ctx),
        }
    }

    /// Whether the goal has now been met. Idempotent; records the solve
    /// timestamp exactly once.
    pub fn is_solved(&mut self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::Build(c) => c.is_solved(ctx),
            Self::Test(c) => c.is_solved(ctx),
            Self::Class(c) => c.is_solved(ctx),
            Self::Method(c) => c.is_solved(ctx),
            Self::Line(c) => c.is_solved(ctx),
            Self::Branch(c) => c.is_solved(ctx),
            Self::Dummy(c) => c.is_solved(ctx),
            Self::Custom(c) => c.is_solved(ctx),
        }
    }

    /// Points awarded when the challenge is solved.
    pub fn score(&self) -> u32 {
        match self {
            Self::Build(c) => c.score(),
            Self::Test(c) => c.score(),
            Self::Class(c) => c.score(),
            Self::Method(c) => c.score(),
            Self::Line(c) => c.score(),
            Self::Branch(c) => c.score(),
            Self::Dummy(c) => c.score(),
            Self::Custom(c) => c.score(),
        }
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(c) => c.fmt(f),
            Self::Test(c) => c.fmt(f),
            Self::Class(c) => c.fmt(f),
            Self::Method(c) => c.fmt(f),
            Self::Line(c) => c.fmt(f),
            Self::Branch(c) => c.fmt(f),
            Self::Dummy(c) => c.fmt(f),
            Self::Custom(c) => c.fmt(f),
        }
    }
}
