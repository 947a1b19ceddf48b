//! Citation-backed constraint values
//!
//! A constraint value without a citation is never trusted. Remediation
//! always removes the value; a citation is never synthesized.

use crate::confidence::{apply_ceiling, Confidence};
use crate::error::CitationViolation;
use serde::{Deserialize, Serialize};

/// Where a constraint value was read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Ordinance section or document reference
    pub reference: String,
    /// Source URL, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Citation {
    /// Citation without a URL
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            url: None,
        }
    }

    /// Attach a URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// A citation with a blank reference does not count
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        !self.reference.trim().is_empty()
    }
}

/// A value that must carry a citation whenever it is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedConstraint<T> {
    /// The constraint value, `None` when unknown
    pub value: Option<T>,
    /// Required whenever `value` is present
    pub citation: Option<Citation>,
    /// Confidence in the value
    pub confidence: Confidence,
}

impl<T> Default for CitedConstraint<T> {
    fn default() -> Self {
        Self::unknown()
    }
}

impl<T> CitedConstraint<T> {
    /// Unknown value at low confidence
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            value: None,
            citation: None,
            confidence: Confidence::Low,
        }
    }

    /// Cited value
    pub fn cited(value: T, citation: Citation, confidence: Confidence) -> Self {
        Self {
            value: Some(value),
            citation: Some(citation),
            confidence,
        }
    }

    /// Check the value/citation invariant
    ///
    /// # Errors
    /// `CitationViolation` when a value is present without a meaningful
    /// citation.
    pub fn validate(&self, field: &str) -> Result<(), CitationViolation> {
        let cited = self.citation.as_ref().is_some_and(Citation::is_meaningful);
        if self.value.is_some() && !cited {
            Err(CitationViolation {
                field: field.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Force an uncited value back to unknown
    ///
    /// Returns the violation that was remediated, if any.
    pub fn enforce(&mut self, field: &str) -> Option<CitationViolation> {
        match self.validate(field) {
            Ok(()) => None,
            Err(violation) => {
                tracing::warn!(field, "uncited constraint value removed");
                self.value = None;
                self.citation = None;
                self.confidence = Confidence::Low;
                Some(violation)
            }
        }
    }

    /// Clamp confidence to a CCA ceiling
    #[must_use]
    pub fn capped(mut self, ceiling: Confidence) -> Self {
        self.confidence = apply_ceiling(self.confidence, ceiling);
        self
    }

    /// True when a cited value is present
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.value.is_some() && self.validate("").is_ok()
    }
}
