//! Error types for the CCA model
//!
//! Only malformed call-site arguments, config loading and doctrine
//! violations surface as errors. Everything else is reported as a typed
//! field on the returned value.

use crate::confidence::Confidence;
use std::path::PathBuf;

/// Malformed county identity; the one fail-fast case
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Required field empty or whitespace
    #[error("missing required identity field: {0}")]
    MissingField(&'static str),

    /// FIPS code is not five ASCII digits
    #[error("invalid county FIPS code: '{0}' (expected 5 digits)")]
    InvalidFips(String),

    /// State code is not two ASCII letters
    #[error("invalid state code: '{0}' (expected 2 letters)")]
    InvalidStateCode(String),
}

/// A constraint value present without a citation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("constraint '{field}' has a value but no citation")]
pub struct CitationViolation {
    /// Constraint name
    pub field: String,
}

/// Confidence raised without a citation-backed manual verification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DoctrineViolation {
    /// Upgrade attempted outside the manual verification path
    #[error("confidence upgrade {before} -> {after} without citation")]
    UncitedUpgrade {
        /// Confidence before the attempt
        before: Confidence,
        /// Requested confidence
        after: Confidence,
    },

    /// Manual verification missing its `verified_by` or citation
    #[error("manual verification requires {0}")]
    IncompleteVerification(&'static str),
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML parse failure
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid value
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
