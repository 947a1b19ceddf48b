//! Pass 0 throttle
//!
//! Decides whether Pass 0 may run full automation for a county and caps
//! the confidence of anything it derives. Rows are evaluated in order:
//! absence and expiry before classification.

use cca_model::{apply_ceiling, AutomationClass, CcaView, Confidence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which row of the throttle table decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleBasis {
    /// No record on file
    NoProfile,
    /// Record past its TTL
    Expired,
    /// Manual or null automation class
    ManualOrUnknown,
    /// PDF-only county
    PdfOnly,
    /// API or portal county
    Automated,
    /// A class this build does not know
    UnrecognizedClass,
}

/// Pass 0 throttle decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleDecision {
    /// Full automation permitted
    pub allow_full_automation: bool,
    /// Ceiling for Pass 0 outputs
    pub confidence_cap: Confidence,
    /// Human-readable reason
    pub throttle_reason: String,
    /// Deciding row
    pub basis: ThrottleBasis,
}

impl ThrottleDecision {
    fn capped(basis: ThrottleBasis, reason: impl Into<String>) -> Self {
        Self {
            allow_full_automation: false,
            confidence_cap: Confidence::Low,
            throttle_reason: reason.into(),
            basis,
        }
    }

    /// Confidence a Pass 0 signal may carry under this decision
    #[must_use]
    pub fn effective(&self, signal: Confidence) -> Confidence {
        apply_ceiling(signal, self.confidence_cap)
    }
}

/// Throttle decision for a county
///
/// `default_ceiling` stands in for a record whose ceiling is unset.
#[must_use]
pub fn get_pass0_throttle(
    profile: Option<&dyn CcaView>,
    default_ceiling: Confidence,
    now: DateTime<Utc>,
) -> ThrottleDecision {
    let Some(profile) = profile else {
        return ThrottleDecision::capped(ThrottleBasis::NoProfile, "No capability profile");
    };
    if profile.is_expired(now) {
        return ThrottleDecision::capped(ThrottleBasis::Expired, "Capability profile expired");
    }

    match profile.automation_class() {
        None | Some(AutomationClass::Manual) => ThrottleDecision::capped(
            ThrottleBasis::ManualOrUnknown,
            "Manual or unknown automation class; capped at low",
        ),
        Some(AutomationClass::Pdf) => {
            ThrottleDecision::capped(ThrottleBasis::PdfOnly, "PDF-only county; weak signal only")
        }
        Some(class @ (AutomationClass::Api | AutomationClass::Portal)) => ThrottleDecision {
            allow_full_automation: true,
            confidence_cap: profile.confidence_ceiling().unwrap_or(default_ceiling),
            throttle_reason: format!("Automation permitted via {class}"),
            basis: ThrottleBasis::Automated,
        },
        Some(AutomationClass::Unrecognized) => {
            ThrottleDecision::capped(ThrottleBasis::UnrecognizedClass, "Unknown automation class")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_model::CapabilityProfile;
    use cca_test_utils::{api_profile, expired_profile, fixed_now, manual_profile, pdf_profile, v1, v2};
    use pretty_assertions::assert_eq;

    fn throttle(p: &CapabilityProfile) -> ThrottleDecision {
        get_pass0_throttle(Some(p), Confidence::Medium, fixed_now())
    }

    #[test]
    fn no_profile() {
        let d = get_pass0_throttle(None, Confidence::Medium, fixed_now());
        assert!(!d.allow_full_automation);
        assert_eq!(d.confidence_cap, Confidence::Low);
        assert_eq!(d.throttle_reason, "No capability profile");
    }

    #[test]
    fn expiry_precedes_classification() {
        let d = throttle(&expired_profile());
        assert_eq!(d.basis, ThrottleBasis::Expired);
        assert!(!d.allow_full_automation);
    }

    #[test]
    fn weak_classes_capped_low() {
        assert_eq!(throttle(&manual_profile()).basis, ThrottleBasis::ManualOrUnknown);
        assert_eq!(throttle(&pdf_profile()).basis, ThrottleBasis::PdfOnly);
        assert_eq!(throttle(&pdf_profile()).confidence_cap, Confidence::Low);
    }

    #[test]
    fn automated_class_uses_profile_ceiling() {
        let d = throttle(&api_profile());
        assert!(d.allow_full_automation);
        assert_eq!(d.confidence_cap, Confidence::Medium);

        let mut p = api_profile();
        p.confidence_ceiling = Confidence::Low;
        assert_eq!(throttle(&p).confidence_cap, Confidence::Low);
    }

    #[test]
    fn unset_ceiling_uses_default() {
        let mut record = v2(&api_profile());
        record.confidence_ceiling = None;
        let d = get_pass0_throttle(Some(&record), Confidence::Medium, fixed_now());
        assert_eq!(d.confidence_cap, Confidence::Medium);
    }

    #[test]
    fn null_class_is_capped() {
        let output = v1(&api_profile());
        let d = get_pass0_throttle(Some(&output), Confidence::Medium, fixed_now());
        assert_eq!(d.basis, ThrottleBasis::ManualOrUnknown);
        assert_eq!(d.confidence_cap, Confidence::Low);
    }

    #[test]
    fn unrecognized_class() {
        let mut record = v2(&api_profile());
        record.automation_class = Some(AutomationClass::Unrecognized);
        let d = get_pass0_throttle(Some(&record), Confidence::Medium, fixed_now());
        assert_eq!(d.throttle_reason, "Unknown automation class");
    }
}
