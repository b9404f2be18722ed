//! Per-contributor challenge board and its state machine.
//!
//! States: `Active -> {Solved, Rejected, Stored}`, `Stored -> Active`
//! (restore) or `Stored -> Rejected`. Solved and rejected instances are
//! immutable afterwards; they stay on the board as the contributor's
//! history and feed de-duplication of future generation passes.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::challenge::context::EvalContext;
use crate::challenge::model::Challenge;
use crate::core::errors::{CovquestError, Result};

/// A rejected challenge with the contributor's stated reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedChallenge {
    /// The rejected instance, frozen at rejection time.
    pub challenge: Challenge,
    /// Free-text reason, possibly empty for automatic rejections.
    pub reason: String,
    /// Rejection timestamp.
    pub rejected_at: DateTime<Utc>,
}

/// Outcome counts of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationOutcome {
    /// Challenges moved to solved.
    pub solved: usize,
    /// Challenges auto-rejected as no longer solvable.
    pub unsolvable: usize,
}

/// All challenge state of one contributor in one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeBoard {
    /// Active challenges.
    pub current: Vec<Challenge>,
    /// Solved history, in solve order.
    pub solved: Vec<Challenge>,
    /// Rejected history, in rejection order.
    pub rejected: Vec<RejectedChallenge>,
    /// Shelved challenges, excluded from evaluation until restored.
    pub stored: Vec<Challenge>,
    /// Accumulated score from solved challenges.
    pub score: u32,
}

impl ChallengeBoard {
    /// Empty board for a new contributor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every active challenge against the current build.
    ///
    /// Solved challenges award their score and move to the solved history;
    /// challenges no longer solvable are auto-rejected. Safe to call on
    /// every build: both predicates are idempotent.
    pub fn evaluate(&mut self, ctx: &EvalContext<'_>) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::default();
        let mut still_active = Vec::with_capacity(self.current.len());

        for mut challenge in self.current.drain(..) {
            if challenge.is_solved(ctx) {
                info!(category = %challenge.category(), score = challenge.score(), "challenge solved");
                self.score += challenge.score();
                self.solved.push(challenge);
                outcome.solved += 1;
            } else if !challenge.is_solvable(ctx) {
                debug!(category = %challenge.category(), "challenge no longer solvable");
                self.rejected.push(RejectedChallenge {
                    challenge,
                    reason: "not solvable anymore".to_string(),
                    rejected_at: Utc::now(),
                });
                outcome.unsolvable += 1;
            } else {
                still_active.push(challenge);
            }
        }

        self.current = still_active;
        outcome
    }

    /// Reject the active challenge at `index` with the given reason.
    pub fn reject(&mut self, index: usize, reason: impl Into<String>) -> Result<()> {
        if index >= self.current.len() {
            return Err(CovquestError::validation(format!(
                "no active challenge at index {index}"
            )));
        }
        let challenge = self.current.remove(index);
        self.rejected.push(RejectedChallenge {
            challenge,
            reason: reason.into(),
            rejected_at: Utc::now(),
        });
        Ok(())
    }

    /// Shelve the active challenge at `index`.
    pub fn store(&mut self, index: usize) -> Result<()> {
        if index >= self.current.len() {
            return Err(CovquestError::validation(format!(
                "no active challenge at index {index}"
            )));
        }
        let challenge = self.current.remove(index);
        self.stored.push(challenge);
        Ok(())
    }

    /// Restore the stored challenge at `index` to the active set.
    ///
    /// `max_open` bounds the active set; restoring past it is an error so
    /// the contributor cannot sidestep the open-challenge limit.
    pub fn restore(&mut self, index: usize, max_open: usize) -> Result<()> {
        if index >= self.stored.len() {
            return Err(CovquestError::validation(format!(
                "no stored challenge at index {index}"
            )));
        }
        if self.current.len() >= max_open {
            return Err(CovquestError::validation(format!(
                "restoring would exceed the limit of {max_open} open challenges"
            )));
        }
        let challenge = self.stored.remove(index);
        self.current.push(challenge);
        Ok(())
    }

    /// Reject the stored challenge at `index`.
    pub fn reject_stored(&mut self, index: usize, reason: impl Into<String>) -> Result<()> {
        if index >= self.stored.len() {
            return Err(CovquestError::validation(format!(
                "no stored challenge at index {index}"
            )));
        }
        let challenge = self.stored.remove(index);
        self.rejected.push(RejectedChallenge {
            challenge,
            reason: reason.into(),
            rejected_at: Utc::now(),
        });
        Ok(())
    }

    /// Whether an equal challenge was rejected before.
    pub fn was_rejected(&self, challenge: &Challenge) -> bool {
        self.rejected.iter().any(|r| &r.challenge == challenge)
    }

    /// Whether an equal challenge is active, stored or already solved.
    pub fn is_duplicate(&self, challenge: &Challenge) -> bool {
        self.current.iter().any(|c| c == challenge)
            || self.stored.iter().any(|c| c == challenge)
            || self.solved.iter().any(|c| c == challenge)
    }

    /// Load a persisted board.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CovquestError::io(format!("Failed to read challenge board {}", path.display()), e)
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the board. The record round-trips losslessly.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            CovquestError::io(format!("Failed to write challenge board {}", path.display()), e)
        })
    }
}
