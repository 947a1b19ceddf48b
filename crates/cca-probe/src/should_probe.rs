//! Re-probe decision

use cca_model::{CcaView, Confidence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a caller is asking for a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeReason {
    /// No record on file
    Missing,
    /// Record past its TTL
    Expired,
    /// Pass 2 wants this county in scope
    Pass2Scope,
    /// Operator asked for it
    Manual,
}

impl ProbeReason {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeReason::Missing => "missing",
            ProbeReason::Expired => "expired",
            ProbeReason::Pass2Scope => "pass2_scope",
            ProbeReason::Manual => "manual",
        }
    }
}

impl fmt::Display for ProbeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing" => Ok(ProbeReason::Missing),
            "expired" => Ok(ProbeReason::Expired),
            "pass2_scope" => Ok(ProbeReason::Pass2Scope),
            "manual" => Ok(ProbeReason::Manual),
            other => Err(format!("unknown probe reason '{other}'")),
        }
    }
}

/// Whether a county should be (re)probed
///
/// True when the record is absent, the reason is `manual`, the record is
/// expired, or Pass 2 needs the county and the record's ceiling is `low`.
#[must_use]
pub fn should_probe_county<V: CcaView + ?Sized>(
    existing: Option<&V>,
    reason: ProbeReason,
    now: DateTime<Utc>,
) -> bool {
    let Some(profile) = existing else {
        return true;
    };
    reason == ProbeReason::Manual
        || profile.is_expired(now)
        || (reason == ProbeReason::Pass2Scope && profile.confidence_ceiling() == Some(Confidence::Low))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_model::{CapabilityProfile, CountyIdentity, TtlPolicy};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
    }

    fn profile(ceiling: Confidence) -> CapabilityProfile {
        let county = CountyIdentity::new("c-1", "48453", "Travis County", "TX").unwrap();
        let mut p = CapabilityProfile::unknown(county, now(), TtlPolicy::CalendarYear, None);
        p.confidence_ceiling = ceiling;
        p
    }

    #[test]
    fn absent_always_probes() {
        for reason in [ProbeReason::Missing, ProbeReason::Expired, ProbeReason::Pass2Scope] {
            assert!(should_probe_county::<CapabilityProfile>(None, reason, now()));
        }
    }

    #[test]
    fn fresh_medium_record_is_kept() {
        let p = profile(Confidence::Medium);
        assert!(!should_probe_county(Some(&p), ProbeReason::Missing, now()));
        assert!(!should_probe_county(Some(&p), ProbeReason::Pass2Scope, now()));
        assert!(should_probe_county(Some(&p), ProbeReason::Manual, now()));
    }

    #[test]
    fn low_ceiling_reprobed_only_for_pass2() {
        let p = profile(Confidence::Low);
        assert!(should_probe_county(Some(&p), ProbeReason::Pass2Scope, now()));
        assert!(!should_probe_county(Some(&p), ProbeReason::Expired, now()));
    }

    #[test]
    fn expired_record_reprobed() {
        let p = profile(Confidence::Medium);
        let later = now() + Duration::days(366);
        assert!(should_probe_county(Some(&p), ProbeReason::Missing, later));
    }

    #[test]
    fn reason_round_trips_through_str() {
        assert_eq!("pass2_scope".parse::<ProbeReason>().unwrap(), ProbeReason::Pass2Scope);
        assert!("later".parse::<ProbeReason>().is_err());
    }
}
