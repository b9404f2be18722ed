//! Startup registry of extension challenge factories.
//!
//! Extension categories (mutation, smell, host-defined ones) are served by
//! factory functions registered once at startup against a category tag.
//! There is no runtime discovery; an unregistered tag simply never
//! produces a challenge.

use indexmap::IndexMap;

use crate::challenge::context::GenerationContext;
use crate::challenge::custom::CustomChallenge;
use crate::core::errors::{CovquestError, Result};
use crate::selection::category::CategoryTag;

/// Factory contract: inspect the typed generation context and either
/// produce a challenge or decline with `Ok(None)`.
pub type ChallengeFactory =
    Box<dyn Fn(&GenerationContext<'_>) -> Result<Option<CustomChallenge>> + Send + Sync>;

/// Registered extension factories, keyed by category tag.
#[derive(Default)]
pub struct ChallengeRegistry {
    factories: IndexMap<CategoryTag, ChallengeFactory>,
}

impl ChallengeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `tag`. Re-registering a tag is an error;
    /// replacement semantics would hide a wiring mistake.
    pub fn register(&mut self, tag: CategoryTag, factory: ChallengeFactory) -> Result<()> {
        if self.factories.contains_key(&tag) {
            return Err(CovquestError::validation(format!(
                "challenge factory for category '{tag}' already registered"
            )));
        }
        self.factories.insert(tag, factory);
        Ok(())
    }

    /// Factory registered for `tag`, if any.
    pub fn get(&self, tag: &CategoryTag) -> Option<&ChallengeFactory> {
        self.factories.get(tag)
    }

    /// Registered category tags, in registration order.
    pub fn tags(&self) -> Vec<CategoryTag> {
        self.factories.keys().cloned().collect()
    }
}
