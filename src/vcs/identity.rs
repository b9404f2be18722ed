//! Contributor identities and commit author resolution.
//!
//! An [`Identity`] is a serializable snapshot of a contributor mirrored out
//! of the host's user store for use during mining; it carries no live
//! back-reference. Resolution of raw commit author metadata is deliberately
//! conservative (false negatives over false positives), since attributing a
//! change to the wrong person would award them a challenge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Snapshot of a known contributor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier in the host user store.
    pub id: String,
    /// Full display name.
    pub display_name: String,
    /// Known VCS author-name aliases.
    pub aliases: BTreeSet<String>,
    /// Registered email address.
    pub email: String,
}

impl Identity {
    /// Create an identity with no aliases.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            aliases: BTreeSet::new(),
            email: email.into(),
        }
    }

    /// Add a VCS author-name alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }
}

/// Match a raw commit author against the known identities.
///
/// Precedence, first match wins, no scoring:
/// 1. the raw author name is present verbatim in a candidate's alias set;
/// 2. the candidate's display name contains both the first and the last
///    whitespace-delimited token of the raw author name;
/// 3. the raw author email equals the candidate's registered email.
pub fn resolve<'a>(
    raw_name: &str,
    raw_email: &str,
    candidates: &'a [Identity],
) -> Option<&'a Identity> {
    let tokens: Vec<&str> = raw_name.split_whitespace().collect();
    let first = tokens.first().copied().unwrap_or_default();
    let last = tokens.last().copied().unwrap_or_default();

    candidates.iter().find(|candidate| {
        candidate.aliases.contains(raw_name)
            || (!first.is_empty()
                && candidate.display_name.contains(first)
                && candidate.display_name.contains(last))
            || (!raw_email.is_empty() && candidate.email == raw_email)
    })
}
