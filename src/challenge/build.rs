//! Challenge to fix a failing build.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::context::EvalContext;

/// Issued when the contributor's build fails; solved by the next
/// successful build on the same branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildChallenge {
    /// Contributor the challenge belongs to.
    pub identity_id: String,
    /// Branch of the failing build.
    pub branch: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Solve timestamp, set at most once.
    pub solved: Option<DateTime<Utc>>,
}

impl BuildChallenge {
    /// Issue a build challenge for a failed build.
    pub fn new(identity_id: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            branch: branch.into(),
            created: Utc::now(),
            solved: None,
        }
    }

    /// A build can always be fixed.
    pub fn is_solvable(&self, _ctx: &EvalContext<'_>) -> bool {
        true
    }

    /// Solved by the first successful build after creation.
    pub fn is_solved(&mut self, ctx: &EvalContext<'_>) -> bool {
        if self.solved.is_some() {
            return true;
        }
        if ctx.build_succeeded {
            self.solved = Some(Utc::now());
            return true;
        }
        false
    }

    /// Flat score.
    pub fn score(&self) -> u32 {
        1
    }
}

/// Natural key: one open build challenge per contributor and branch.
impl PartialEq for BuildChallenge {
    fn eq(&self, other: &Self) -> bool {
        self.identity_id == other.identity_id && self.branch == other.branch
    }
}

impl fmt::Display for BuildChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fix the failing build on branch {}", self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CovquestConfig;
    use std::path::PathBuf;

    fn ctx(config: &CovquestConfig, build_succeeded: bool) -> EvalContext<'_> {
        EvalContext {
            branch: "master".to_string(),
            workspace: PathBuf::from("."),
            build_succeeded,
            config,
            identities: &[],
        }
    }

    #[test]
    fn solved_by_a_successful_build() {
        let config = CovquestConfig::default();
        let mut challenge = BuildChallenge::new("u1", "master");

        assert!(challenge.is_solvable(&ctx(&config, false)));
        assert!(!challenge.is_solved(&ctx(&config, false)));
        assert!(challenge.solved.is_none());

        assert!(challenge.is_solved(&ctx(&config, true)));
        let stamp = challenge.solved;
        assert!(stamp.is_some());

        // A later failing build must not unsolve or re-stamp it.
        assert!(challenge.is_solved(&ctx(&config, false)));
        assert_eq!(challenge.solved, stamp);
    }
}
