//! Pass 2 routing
//!
//! Picks how Pass 2 hydrates zoning constraints for a county. `retell`
//! (phone/manual) is only reachable when automation is not viable.

use cca_model::{apply_ceiling, is_absent_or_expired, AutomationClass, CcaView, Confidence, DocumentQuality};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pass 2 route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Automated crawl
    Firecrawl,
    /// Voice/manual outreach
    Retell,
    /// Human research queue
    ManualQueue,
    /// Nothing may run until the county is probed
    DoNothing,
}

impl Route {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Firecrawl => "firecrawl",
            Route::Retell => "retell",
            Route::ManualQueue => "manual_queue",
            Route::DoNothing => "do_nothing",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why Pass 2 does nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoNothingReason {
    /// No record on file
    NoProfile,
    /// Record past its TTL
    Expired,
}

/// Pass 2 routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Chosen route
    pub route_to: Route,
    /// Ceiling for Pass 2 outputs
    pub confidence_ceiling: Confidence,
    /// Human-readable reason
    pub routing_reason: String,
    /// Set when `route_to` is `do_nothing`
    pub do_nothing: Option<DoNothingReason>,
}

impl RoutingDecision {
    fn route(route_to: Route, confidence_ceiling: Confidence, reason: impl Into<String>) -> Self {
        Self {
            route_to,
            confidence_ceiling,
            routing_reason: reason.into(),
            do_nothing: None,
        }
    }

    fn nothing(reason: DoNothingReason, text: &str) -> Self {
        Self {
            route_to: Route::DoNothing,
            confidence_ceiling: Confidence::Low,
            routing_reason: text.to_string(),
            do_nothing: Some(reason),
        }
    }

    /// Confidence a Pass 2 value may carry under this decision
    #[must_use]
    pub fn effective(&self, signal: Confidence) -> Confidence {
        apply_ceiling(signal, self.confidence_ceiling)
    }
}

/// Routing decision for a county
///
/// Rows in order: absent or expired → `do_nothing`; viable → `firecrawl`
/// at the record's ceiling; manual class → `retell` at low; scanned PDFs →
/// `manual_queue`; anything else → `manual_queue`.
#[must_use]
pub fn get_pass2_routing(
    profile: Option<&dyn CcaView>,
    default_ceiling: Confidence,
    now: DateTime<Utc>,
) -> RoutingDecision {
    let Some(profile) = profile else {
        return RoutingDecision::nothing(DoNothingReason::NoProfile, "No capability profile");
    };
    if profile.is_expired(now) {
        return RoutingDecision::nothing(DoNothingReason::Expired, "Capability profile expired");
    }

    if profile.automation_viable() {
        RoutingDecision::route(
            Route::Firecrawl,
            profile.confidence_ceiling().unwrap_or(default_ceiling),
            "Automation viable",
        )
    } else if profile.automation_class() == Some(AutomationClass::Manual) {
        RoutingDecision::route(Route::Retell, Confidence::Low, "Manual county; automation not viable")
    } else if profile.document_quality() == Some(DocumentQuality::ScannedPdf) {
        RoutingDecision::route(Route::ManualQueue, Confidence::Low, "Scanned documents require manual review")
    } else {
        RoutingDecision::route(Route::ManualQueue, Confidence::Low, "Automation not viable")
    }
}

/// Whether Pass 2 may run at all: record present and unexpired
#[must_use]
pub fn should_pass2_proceed(profile: Option<&dyn CcaView>, now: DateTime<Utc>) -> bool {
    !is_absent_or_expired(profile, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_test_utils::{api_profile, expired_profile, fixed_now, manual_profile, pdf_profile};
    use pretty_assertions::assert_eq;

    #[test]
    fn absent_and_expired_do_nothing() {
        let d = get_pass2_routing(None, Confidence::Medium, fixed_now());
        assert_eq!(d.route_to, Route::DoNothing);
        assert_eq!(d.do_nothing, Some(DoNothingReason::NoProfile));

        let p = expired_profile();
        let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
        assert_eq!(d.do_nothing, Some(DoNothingReason::Expired));
        assert!(!should_pass2_proceed(Some(&p), fixed_now()));
    }

    #[test]
    fn viable_routes_to_firecrawl() {
        let p = api_profile();
        let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
        assert_eq!(d.route_to, Route::Firecrawl);
        assert_eq!(d.confidence_ceiling, Confidence::Medium);
        assert!(should_pass2_proceed(Some(&p), fixed_now()));
    }

    #[test]
    fn viable_manual_class_never_retell() {
        let mut p = manual_profile();
        p.automation_viable = true;
        let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
        assert_eq!(d.route_to, Route::Firecrawl);
    }

    #[test]
    fn manual_routes_to_retell() {
        let p = manual_profile();
        let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
        assert_eq!(d.route_to, Route::Retell);
        assert_eq!(d.confidence_ceiling, Confidence::Low);
    }

    #[test]
    fn scanned_and_other_go_to_queue() {
        let mut p = pdf_profile();
        p.document_quality = DocumentQuality::ScannedPdf;
        let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
        assert_eq!(d.route_to, Route::ManualQueue);
        assert!(d.routing_reason.contains("Scanned"));

        let d = get_pass2_routing(Some(&pdf_profile()), Confidence::Medium, fixed_now());
        assert_eq!(d.route_to, Route::ManualQueue);
        assert_eq!(d.routing_reason, "Automation not viable");
    }
}
