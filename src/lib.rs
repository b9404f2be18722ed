//! # Covquest: Coverage Challenge Engine
//!
//! A gamification engine for CI builds: it mines recent commit history,
//! attributes changed files to known contributors, and generates personal
//! coverage challenges ("cover line 42 of Foo") that are re-evaluated
//! against fresh coverage reports on every build. This library provides:
//!
//! - **History mining**: bounded breadth-first commit traversal with
//!   identity attribution
//! - **Candidate selection**: linear-rank selection biased toward
//!   low-coverage files, weighted category draw
//! - **Challenge lifecycle**: solvable/solved predicates re-derived from
//!   current report state, with a per-contributor challenge board
//! - **Report parsing**: per-line coverage markup, method tables and the
//!   per-class CSV summary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use covquest::challenge::board::ChallengeBoard;
//! use covquest::challenge::context::EvalContext;
//! use covquest::core::config::CovquestConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CovquestConfig::from_yaml_file("covquest.yml")?;
//!     let mut board = ChallengeBoard::from_json_file("board.json".as_ref())?;
//!
//!     let ctx = EvalContext {
//!         branch: "master".to_string(),
//!         workspace: ".".into(),
//!         build_succeeded: true,
//!         config: &config,
//!         identities: &[],
//!     };
//!     let outcome = board.evaluate(&ctx);
//!     println!("solved {} challenges", outcome.solved);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Configuration and error types
pub mod core {
    //! Configuration and error types.

    pub mod config;
    pub mod errors;
}

// Version-control access
pub mod vcs {
    //! Commit history mining and contributor identity resolution.

    pub mod history;
    pub mod identity;
}

// Coverage report input
pub mod coverage {
    //! Coverage report parsing, artifact locations and line relocation.

    pub mod artifacts;
    pub mod report;
    pub mod tracker;
}

// Random selection primitives
pub mod selection {
    //! Rank-based candidate selection and the weighted category draw.

    pub mod category;
    pub mod rank;
}

// Challenge model, lifecycle and generation
pub mod challenge {
    //! Challenge kinds, the per-contributor board and the generation
    //! pipeline.

    pub mod board;
    pub mod branch_coverage;
    pub mod build;
    pub mod class_coverage;
    pub mod context;
    pub mod custom;
    pub mod dummy;
    pub mod factory;
    pub mod line_coverage;
    pub mod method_coverage;
    pub mod model;
    pub mod registry;
    pub mod test_suite;
}

// Re-export primary types for convenience
pub use challenge::board::ChallengeBoard;
pub use challenge::model::Challenge;
pub use core::config::CovquestConfig;
pub use core::errors::{CovquestError, Result};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
