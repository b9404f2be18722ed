//! Error types for the covquest library.
//!
//! All fallible operations return [`Result`]. Failures in the evaluation
//! pipeline are deliberately non-fatal to the enclosing build: mining errors
//! degrade to empty attribution sets and missing report artifacts degrade to
//! "not yet decidable", so most variants here surface only through the CLI
//! and configuration paths.

use std::io;

use thiserror::Error;

/// Main result type for covquest operations.
pub type Result<T> = std::result::Result<T, CovquestError>;

/// Error type for all covquest operations.
#[derive(Error, Debug)]
pub enum CovquestError {
    /// I/O related errors (file operations, workspace access).
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors.
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Coverage report parsing errors.
    #[error("Parse error: {message}")]
    Parse {
        /// Error description
        message: String,
        /// File path where the error occurred
        file_path: Option<String>,
    },

    /// Validation errors for input data.
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
    },

    /// Serialization/deserialization errors.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Version-control access errors.
    #[error("VCS error: {message}")]
    Vcs {
        /// Error description
        message: String,
        /// Underlying libgit2 error
        #[source]
        source: Option<git2::Error>,
    },

    /// Challenge generation errors.
    #[error("Generation error: {message}")]
    Generation {
        /// Error description
        message: String,
    },
}

impl CovquestError {
    /// Create an I/O error with context.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error tied to a specific field.
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            file_path: None,
        }
    }

    /// Create a parse error tied to a file.
    pub fn parse_in(message: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            file_path: Some(file_path.into()),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a VCS error with a libgit2 source.
    pub fn vcs(message: impl Into<String>, source: git2::Error) -> Self {
        Self::Vcs {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a challenge generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

impl From<git2::Error> for CovquestError {
    fn from(err: git2::Error) -> Self {
        Self::Vcs {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for CovquestError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for CovquestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let err = CovquestError::config_field("weight must be positive", "generation.weights");
        assert!(err.to_string().contains("weight must be positive"));

        let err = CovquestError::parse_in("unexpected tag", "report/Foo.java.html");
        assert!(matches!(err, CovquestError::Parse { file_path: Some(_), .. }));
    }

    #[test]
    fn io_errors_preserve_source() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err = CovquestError::io("failed to read report", inner);
        assert!(std::error::Error::source(&err).is_some());
    }
}
