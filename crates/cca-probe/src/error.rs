//! Probe and registry errors
//!
//! None of these cross the public probe entry points except
//! [`ProbeError::Identity`]; everything else degrades the record to the
//! all-unknown default.

use cca_detect::DetectorError;
use cca_model::{DoctrineViolation, IdentityError};

/// Message fragments that mark a failure as transient
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "connection",
    "temporarily unavailable",
];

/// Probe failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Malformed call-site identity; the only fail-fast case
    #[error("invalid county identity: {0}")]
    Identity(#[from] IdentityError),

    /// Page evidence could not be gathered
    #[error("page source failed: {0}")]
    Source(String),

    /// A probe step outside the per-detector isolation failed
    #[error("probe step failed: {0}")]
    Detector(#[from] DetectorError),
}

impl ProbeError {
    /// Page source failure
    #[inline]
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Whether the retry wrapper should try again
    ///
    /// Only page source failures whose message looks like a timeout or a
    /// network error qualify.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Source(message) => {
                let lowered = message.to_lowercase();
                TRANSIENT_MARKERS.iter().any(|m| lowered.contains(m))
            }
            Self::Identity(_) | Self::Detector(_) => false,
        }
    }
}

/// CCA registry failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No record stored for the county
    #[error("no capability profile for county '{0}'")]
    NotFound(String),

    /// Write rejected by the confidence doctrine
    #[error(transparent)]
    Doctrine(#[from] DoctrineViolation),
}
