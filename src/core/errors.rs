//! Shared error types for the engine

use crate::core::types::SanityIssue;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for impactmap operations
#[derive(Debug, Error)]
pub enum ImpactError {
    /// Unified diff could not be parsed; no partial record is produced
    #[error("Malformed diff at line {line}: {message}")]
    MalformedDiff { line: usize, message: String },

    /// Repository snapshot content could not be read or decoded
    #[error("Graph build error for {path}: {message}")]
    GraphBuild { path: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A fatal-class sanity violation; the record is withheld
    #[error("Fatal sanity violation: {}", format_issues(.issues))]
    FatalSanity { issues: Vec<SanityIssue> },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl ImpactError {
    /// Create a malformed-diff error with line context
    pub fn malformed_diff(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedDiff {
            line,
            message: message.into(),
        }
    }

    /// Create a graph-build error with path context
    pub fn graph_build(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::GraphBuild {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn format_issues(issues: &[SanityIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, ImpactError>;
