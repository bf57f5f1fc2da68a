//! Error types for dataset analysis
//!
//! Only structural lookups and type mismatches are errors. Degenerate
//! statistics (empty or single-sample runs, zero variance) return sentinel
//! values from [`crate::stats`] instead.

use std::fmt;
use thiserror::Error;

/// What kind of key a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Test,
    Variation,
    CacheState,
    Metric,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyKind::Test => "test",
            KeyKind::Variation => "variation",
            KeyKind::CacheState => "cache state",
            KeyKind::Metric => "metric",
        };
        f.write_str(name)
    }
}

/// Errors for dataset traversal and aggregation
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing {kind}: {name}")]
    MissingKey { kind: KeyKind, name: String },

    #[error("Expected a numeric value for {context}")]
    NonNumeric { context: String },

    #[error("Invalid delta specification: {0}")]
    InvalidDelta(String),

    #[error("Invalid selection expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid regex in selection: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub(crate) fn missing(kind: KeyKind, name: impl Into<String>) -> Self {
        AnalysisError::MissingKey {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn non_numeric(context: impl Into<String>) -> Self {
        AnalysisError::NonNumeric {
            context: context.into(),
        }
    }

    /// True for lookups that visitors are allowed to recover from
    pub fn is_missing_key(&self) -> bool {
        matches!(self, AnalysisError::MissingKey { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
