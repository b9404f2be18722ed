//! Evaluation and generation contexts.
//!
//! Both contexts are plain typed views over the state of one build. They
//! borrow shared read-only inputs (configuration, identities, candidate
//! facts) and are rebuilt for every evaluation; nothing in them outlives
//! the build that produced it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::config::CovquestConfig;
use crate::coverage::artifacts::FileFacts;
use crate::vcs::identity::Identity;

/// Per-build context for challenge lifecycle evaluation.
pub struct EvalContext<'a> {
    /// Branch being evaluated.
    pub branch: String,
    /// Root of the checked-out workspace holding the report artifacts.
    pub workspace: PathBuf,
    /// Whether the build that triggered this evaluation succeeded.
    pub build_succeeded: bool,
    /// Engine configuration.
    pub config: &'a CovquestConfig,
    /// Known contributor identities, for mining-backed checks.
    pub identities: &'a [Identity],
}

/// Typed inputs for one challenge generation pass.
pub struct GenerationContext<'a> {
    /// Engine configuration.
    pub config: &'a CovquestConfig,
    /// Root of the checked-out workspace.
    pub workspace: &'a Path,
    /// Branch the generated challenges belong to.
    pub branch: &'a str,
    /// HEAD commit id at generation time.
    pub head_commit: &'a str,
    /// Contributor the challenges are generated for.
    pub identity: &'a Identity,
    /// Candidate files the contributor recently touched, with coverage
    /// facts attached.
    pub candidates: &'a [FileFacts],
}

/// Exclusion set accumulated during one generation pass.
///
/// Threaded by value through the candidate search so that a file rejected
/// in one attempt (missing artifacts, no usable element) is not retried in
/// the next. Scoped to a single pass; never shared across users or builds.
#[derive(Debug, Default)]
pub struct GenerationState {
    excluded: HashSet<PathBuf>,
}

impl GenerationState {
    /// Fresh, empty state for a new generation pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a candidate path as unusable for the rest of this pass.
    pub fn exclude(&mut self, path: impl Into<PathBuf>) {
        self.excluded.insert(path.into());
    }

    /// Whether a candidate path was already excluded in this pass.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.contains(path)
    }
}
