//! Audited pass-consumption contracts
//!
//! [`PassContracts`] wraps the Pass 0 and Pass 2 decision functions with
//! the configured default ceiling and appends one audit event per check.
//! Contracts only read the CCA; nothing here writes a record.
//!
//! Entries are keyed by the record's `county_id`, the same key the probe and
//! gates use, so one county's compliance report covers both passes. The
//! FIPS code travels in `details`, and keys the entry only when no record
//! exists.

use crate::pass0::{get_pass0_throttle, ThrottleDecision};
use crate::pass2::{get_pass2_routing, should_pass2_proceed, RoutingDecision};
use cca_audit::{AuditEvent, AuditSink};
use cca_model::{CcaView, GateConfig, PipelineStage};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

/// Read-only CCA consumer for Pass 0 and Pass 2
pub struct PassContracts {
    config: GateConfig,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for PassContracts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassContracts")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PassContracts {
    /// Create contracts over an audit sink
    #[must_use]
    pub fn new(config: GateConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self { config, audit }
    }

    /// Settings in use
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    fn event(
        profile: Option<&dyn CcaView>,
        county_fips: &str,
        stage: PipelineStage,
        action: &str,
        result: &str,
    ) -> AuditEvent {
        let key = profile.map_or(county_fips, |p| p.county_id());
        AuditEvent::new(key, stage, action, result)
    }

    /// Pass 0 throttle, audited under the record's county
    pub fn pass0_throttle(
        &self,
        profile: Option<&dyn CcaView>,
        county_fips: &str,
        now: DateTime<Utc>,
    ) -> ThrottleDecision {
        let decision = get_pass0_throttle(profile, self.config.default_ceiling, now);
        let result = if decision.allow_full_automation {
            "full_automation"
        } else {
            "throttled"
        };
        tracing::debug!(
            county_fips,
            result,
            cap = %decision.confidence_cap,
            "pass 0 throttle checked"
        );
        self.audit.emit(
            Self::event(profile, county_fips, PipelineStage::Pass0Throttle, "throttle_check", result)
                .with_ceiling(decision.confidence_cap)
                .with_details(json!({
                    "county_fips": county_fips,
                    "reason": decision.throttle_reason,
                    "basis": decision.basis,
                })),
        );
        decision
    }

    /// Pass 2 routing, audited under the record's county
    pub fn pass2_routing(
        &self,
        profile: Option<&dyn CcaView>,
        county_fips: &str,
        now: DateTime<Utc>,
    ) -> RoutingDecision {
        let decision = get_pass2_routing(profile, self.config.default_ceiling, now);
        tracing::debug!(
            county_fips,
            route = %decision.route_to,
            ceiling = %decision.confidence_ceiling,
            "pass 2 routing decided"
        );
        self.audit.emit(
            Self::event(
                profile,
                county_fips,
                PipelineStage::Pass2Routing,
                "routing_check",
                decision.route_to.as_str(),
            )
            .with_ceiling(decision.confidence_ceiling)
            .with_details(json!({
                "county_fips": county_fips,
                "reason": decision.routing_reason,
                "do_nothing": decision.do_nothing,
            })),
        );
        decision
    }

    /// Whether Pass 2 may run, audited under the record's county
    pub fn should_pass2_proceed(
        &self,
        profile: Option<&dyn CcaView>,
        county_fips: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let proceed = should_pass2_proceed(profile, now);
        let mut event = Self::event(
            profile,
            county_fips,
            PipelineStage::Pass2Routing,
            "proceed_check",
            if proceed { "proceed" } else { "do_nothing" },
        )
        .with_details(json!({ "county_fips": county_fips }));
        if let Some(ceiling) = profile.and_then(|p| p.confidence_ceiling()) {
            event = event.with_ceiling(ceiling);
        }
        self.audit.emit(event);
        proceed
    }
}
