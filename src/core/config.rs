//! Configuration types for the covquest engine.
//!
//! Configuration is split per pipeline stage (mining, generation, reports)
//! with serde round-trip through YAML and per-section `validate()` methods
//! that surface structured [`CovquestError::Config`] values.

use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::{CovquestError, Result};
use crate::selection::category::CategoryTag;

/// Top-level configuration for a covquest evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovquestConfig {
    /// Project identification.
    pub project: ProjectConfig,

    /// Commit history mining settings.
    #[serde(default)]
    pub mining: MiningConfig,

    /// Challenge generation settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Coverage report artifact locations.
    #[serde(default)]
    pub reports: ReportConfig,
}

/// Project identification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Display name of the project, used in challenge descriptions.
    pub name: String,
}

/// Settings for the commit history miner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Maximum number of commits examined before the search gives up.
    pub search_budget: usize,

    /// Path segments that mark a source tree root (e.g. "src").
    pub source_roots: Vec<String>,

    /// File extensions treated as source files under a source root.
    pub source_extensions: Vec<String>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            search_budget: 50,
            source_roots: vec!["src".to_string()],
            source_extensions: vec![
                "java".to_string(),
                "kt".to_string(),
                "rs".to_string(),
            ],
        }
    }
}

/// Settings for the challenge generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of open (active) challenges per user.
    pub max_open_challenges: usize,

    /// Selection attempts before falling back to a placeholder challenge.
    pub attempts: usize,

    /// Positive-integer weights per challenge category.
    pub weights: IndexMap<CategoryTag, u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let mut weights = IndexMap::new();
        weights.insert(CategoryTag::Class, 2);
        weights.insert(CategoryTag::Method, 3);
        weights.insert(CategoryTag::Line, 4);
        weights.insert(CategoryTag::Branch, 3);
        weights.insert(CategoryTag::Test, 1);
        weights.insert(CategoryTag::Mutation, 2);
        Self {
            max_open_challenges: 3,
            attempts: 5,
            weights,
        }
    }
}

/// Locations of the coverage report artifacts, relative to the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Root directory of the per-file coverage markup.
    pub report_root: PathBuf,

    /// Path of the tabular per-class summary (CSV).
    pub summary_csv: PathBuf,

    /// Path of the mutation testing report, if mutation challenges are
    /// enabled for the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_report: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_root: PathBuf::from("target/site/coverage"),
            summary_csv: PathBuf::from("target/site/coverage/summary.csv"),
            mutation_report: None,
        }
    }
}

impl CovquestConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| {
            CovquestError::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a YAML file.
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            CovquestError::io(format!("Failed to write config file {}", path.display()), e)
        })
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(CovquestError::config_field(
                "project name must not be empty",
                "project.name",
            ));
        }
        self.mining.validate()?;
        self.generation.validate()?;
        Ok(())
    }

    /// Whether mutation challenge generation is configured.
    pub fn mutation_available(&self) -> bool {
        self.reports.mutation_report.is_some()
    }
}

impl Default for CovquestConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                name: "project".to_string(),
            },
            mining: MiningConfig::default(),
            generation: GenerationConfig::default(),
            reports: ReportConfig::default(),
        }
    }
}

impl MiningConfig {
    /// Validate mining settings.
    pub fn validate(&self) -> Result<()> {
        if self.search_budget == 0 {
            return Err(CovquestError::config_field(
                "search budget must be positive",
                "mining.search_budget",
            ));
        }
        if self.source_roots.is_empty() {
            return Err(CovquestError::config_field(
                "at least one source root is required",
                "mining.source_roots",
            ));
        }
        Ok(())
    }
}

impl GenerationConfig {
    /// Validate generation settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_open_challenges == 0 {
            return Err(CovquestError::config_field(
                "maximum open challenge count must be positive",
                "generation.max_open_challenges",
            ));
        }
        if self.attempts == 0 {
            return Err(CovquestError::config_field(
                "attempt count must be positive",
                "generation.attempts",
            ));
        }
        for (tag, weight) in &self.weights {
            if *weight == 0 {
                return Err(CovquestError::config_field(
                    format!("weight for category '{tag}' must be positive"),
                    "generation.weights",
                ));
            }
        }
        Ok(())
    }
}
