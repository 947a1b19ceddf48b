//! Output validation
//!
//! Findings are attached to the record and audited. They never block the
//! write: a partially unknown record is an acceptable outcome.

use cca_model::{AutomationClass, CapabilityProfile};

/// Check a finished record, returning one message per violation
#[must_use]
pub fn validate_profile(profile: &CapabilityProfile) -> Vec<String> {
    let mut violations = Vec::new();

    if profile.automation_class != AutomationClass::Manual && profile.source_urls.is_empty() {
        violations.push(format!(
            "automation_class '{}' requires at least one source URL",
            profile.automation_class
        ));
    }

    if profile.expires_at <= profile.last_verified_at {
        violations.push(format!(
            "non-positive TTL: expires_at {} is not after last_verified_at {}",
            profile.expires_at.to_rfc3339(),
            profile.last_verified_at.to_rfc3339()
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_model::{CountyIdentity, TtlPolicy};
    use chrono::{TimeZone, Utc};

    fn profile() -> CapabilityProfile {
        let county = CountyIdentity::new("c-1", "48453", "Travis County", "TX").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        CapabilityProfile::unknown(county, now, TtlPolicy::CalendarYear, None)
    }

    #[test]
    fn default_record_is_valid() {
        assert!(validate_profile(&profile()).is_empty());
    }

    #[test]
    fn automated_class_needs_sources() {
        let mut p = profile();
        p.automation_class = AutomationClass::Portal;
        let violations = validate_profile(&p);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("portal"));

        p.source_urls.push("https://county.accela.com".into());
        assert!(validate_profile(&p).is_empty());
    }

    #[test]
    fn non_positive_ttl_flagged() {
        let mut p = profile();
        p.expires_at = p.last_verified_at;
        assert!(validate_profile(&p)[0].starts_with("non-positive TTL"));
    }
}
