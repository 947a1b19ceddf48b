//! Confidence model
//!
//! Confidence is a totally ordered three-level scale. Every downstream value
//! derived from a County Capability Asset is clamped to the asset's ceiling
//! with [`apply_ceiling`]; raising a value above its ceiling is only
//! possible through a cited manual verification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence level, ordered `Low < Medium < High`
///
/// The same type is used for detector confidence, aggregated probe
/// confidence and the doctrine confidence ceiling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Weak or absent evidence
    #[default]
    Low,
    /// Corroborated automated evidence
    Medium,
    /// Reserved for cited manual verification
    High,
}

/// Alias used where a confidence value acts as an upper bound
pub type ConfidenceCeiling = Confidence;

impl Confidence {
    /// All levels in ascending order
    pub const ALL: [Confidence; 3] = [Confidence::Low, Confidence::Medium, Confidence::High];

    /// Numeric rank (low=1, medium=2, high=3)
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Confidence::Low => 1,
            Confidence::Medium => 2,
            Confidence::High => 3,
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }

    /// Clamp this value to `ceiling`
    #[inline]
    #[must_use]
    pub fn capped_at(self, ceiling: Confidence) -> Confidence {
        apply_ceiling(self, ceiling)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("unknown confidence level: '{other}'")),
        }
    }
}

/// Return the lower-ranked of `current` and `ceiling`
///
/// Pure and total. The result never exceeds either argument.
#[inline]
#[must_use]
pub fn apply_ceiling(current: Confidence, ceiling: Confidence) -> Confidence {
    if current.rank() <= ceiling.rank() {
        current
    } else {
        ceiling
    }
}

/// True iff `after` ranks strictly above `before`
///
/// Detection only. Cited manual verification writes `High` directly and
/// never passes through this check.
#[inline]
#[must_use]
pub fn is_upgrade_attempt(before: Confidence, after: Confidence) -> bool {
    after.rank() > before.rank()
}
