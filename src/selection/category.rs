//! Challenge category tags and the weighted category draw.
//!
//! Categories are a closed set for the built-in challenge kinds plus an
//! `Extension` escape hatch for categories registered through the factory
//! registry at startup. Tags serialize as plain strings so they can key the
//! configuration weight map.

use std::fmt;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CovquestError, Result};

/// Tag identifying a challenge category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryTag {
    /// Fix a failing build.
    Build,
    /// Write a new test.
    Test,
    /// Raise line coverage of a whole class.
    Class,
    /// Raise line coverage of a single method.
    Method,
    /// Cover a specific line.
    Line,
    /// Cover more branches of a specific line.
    Branch,
    /// Kill a surviving mutant (requires mutation artifacts).
    Mutation,
    /// Remove a code smell.
    Smell,
    /// Placeholder when no challenge could be generated.
    Dummy,
    /// Category registered by an extension factory.
    Extension(String),
}

impl CategoryTag {
    /// Canonical string form of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Class => "class-coverage",
            Self::Method => "method-coverage",
            Self::Line => "line-coverage",
            Self::Branch => "branch-coverage",
            Self::Mutation => "mutation",
            Self::Smell => "smell",
            Self::Dummy => "dummy",
            Self::Extension(name) => name,
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CategoryTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "build" => Self::Build,
            "test" => Self::Test,
            "class-coverage" => Self::Class,
            "method-coverage" => Self::Method,
            "line-coverage" => Self::Line,
            "branch-coverage" => Self::Branch,
            "mutation" => Self::Mutation,
            "smell" => Self::Smell,
            "dummy" => Self::Dummy,
            _ => Self::Extension(value),
        }
    }
}

impl From<CategoryTag> for String {
    fn from(tag: CategoryTag) -> Self {
        tag.as_str().to_string()
    }
}

/// Draw a category from the positive-integer weight table.
///
/// The table is expanded into a flat bag (each category repeated `weight`
/// times) and a uniform draw picks the winner, so a category with weight 0
/// or absent from the table never appears. The mutation category is removed
/// from the bag entirely when mutation artifacts are not configured. An
/// empty table is an error, never a silent default.
pub fn select_category(
    weights: &IndexMap<CategoryTag, u32>,
    mutation_available: bool,
    rng: &mut impl Rng,
) -> Result<CategoryTag> {
    let mut bag = Vec::new();
    for (tag, weight) in weights {
        if *tag == CategoryTag::Mutation && !mutation_available {
            continue;
        }
        for _ in 0..*weight {
            bag.push(tag.clone());
        }
    }

    if bag.is_empty() {
        return Err(CovquestError::validation(
            "challenge category weight table is empty",
        ));
    }

    let index = rng.random_range(0..bag.len());
    Ok(bag[index].clone())
}
