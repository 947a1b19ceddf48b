//! Stage gates
//!
//! Each gate runs the kill conditions for its own stage and then enforces
//! the stage preconditions that kill conditions cannot express. Every gate
//! call is audited, whatever the outcome.

use crate::kill::{get_kill_action, KillContext, KillResult, KillSwitchRegistry, NextAction};
use cca_audit::{AuditEvent, AuditSink};
use cca_model::{is_absent_or_expired, CcaView, GateConfig, PipelineStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Outcome of a stage gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Stage being entered
    pub stage: PipelineStage,
    /// Whether the stage may run
    pub proceed: bool,
    /// Why
    pub reason: String,
    /// The kill that blocked the stage, if one fired
    pub kill: Option<KillResult>,
    /// Remedy for a kill
    pub next_action: Option<NextAction>,
}

impl GateResult {
    fn open(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            proceed: true,
            reason: reason.into(),
            kill: None,
            next_action: None,
        }
    }

    fn blocked(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            proceed: false,
            reason: reason.into(),
            kill: None,
            next_action: None,
        }
    }

    fn killed(stage: PipelineStage, kill: KillResult) -> Self {
        let next_action = get_kill_action(&kill);
        Self {
            stage,
            proceed: false,
            reason: kill.kill_reason.clone().unwrap_or_default(),
            kill: Some(kill),
            next_action,
        }
    }

    /// Audit result label
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match (self.proceed, self.kill.is_some()) {
            (true, _) => "proceed",
            (false, true) => "killed",
            (false, false) => "blocked",
        }
    }
}

/// Gatekeeper for the four pipeline stages
pub struct StageGates {
    registry: KillSwitchRegistry,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for StageGates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGates")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl StageGates {
    /// Gates using the standard registry and `config.max_retries`
    #[must_use]
    pub fn new(config: &GateConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            registry: KillSwitchRegistry::standard(config.max_retries),
            audit,
        }
    }

    /// The registry in use
    #[must_use]
    pub fn registry(&self) -> &KillSwitchRegistry {
        &self.registry
    }

    /// Stage 1: probe-stage kill conditions
    pub fn gate_stage1_probe(
        &self,
        county_id: &str,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        now: DateTime<Utc>,
    ) -> GateResult {
        let stage = PipelineStage::Probe;
        let kill = self.registry.check_for_stage(stage, profile, ctx, now);
        let result = if kill.should_kill {
            GateResult::killed(stage, kill)
        } else {
            GateResult::open(stage, "Capability profile current")
        };
        self.record(county_id, profile, ctx, result)
    }

    /// Stage 2: re-checks absence and expiry, then viability-scan kills
    pub fn gate_stage2_viability_scan(
        &self,
        county_id: &str,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        now: DateTime<Utc>,
    ) -> GateResult {
        let stage = PipelineStage::ViabilityScan;
        let result = if is_absent_or_expired(profile, now) {
            let kill = self
                .registry
                .check_for_stage(PipelineStage::Probe, profile, &KillContext::new(), now);
            GateResult::killed(stage, kill)
        } else {
            let kill = self.registry.check_for_stage(stage, profile, ctx, now);
            if kill.should_kill {
                GateResult::killed(stage, kill)
            } else {
                GateResult::open(stage, "Viability scan permitted")
            }
        };
        self.record(county_id, profile, ctx, result)
    }

    /// Stage 3: requires blocked geometry, then hydration kills
    pub fn gate_stage3_constraint_hydration(
        &self,
        county_id: &str,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        now: DateTime<Utc>,
    ) -> GateResult {
        let stage = PipelineStage::ConstraintHydration;
        let result = if ctx.geometry_blocked {
            let kill = self.registry.check_for_stage(stage, profile, ctx, now);
            if kill.should_kill {
                GateResult::killed(stage, kill)
            } else {
                GateResult::open(stage, "Geometry blocked; hydrating constraints")
            }
        } else {
            GateResult::blocked(stage, "Geometry not blocked; constraint hydration not required")
        };
        self.record(county_id, profile, ctx, result)
    }

    /// Stage 4: requires blocked geometry and at least one missing field
    pub fn gate_stage4_human_escalation(
        &self,
        county_id: &str,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        _now: DateTime<Utc>,
    ) -> GateResult {
        let stage = PipelineStage::HumanEscalation;
        let result = match (ctx.geometry_blocked, ctx.missing_fields.is_empty()) {
            (true, false) => GateResult::open(
                stage,
                format!("Escalating: missing {}", ctx.missing_fields.join(", ")),
            ),
            (false, _) => GateResult::blocked(stage, "Geometry not blocked; no escalation needed"),
            (true, true) => GateResult::blocked(stage, "No missing fields; no escalation needed"),
        };
        self.record(county_id, profile, ctx, result)
    }

    /// Run gates 1 to 4 in order, stopping at the first that does not proceed
    pub fn run_all(
        &self,
        county_id: &str,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        now: DateTime<Utc>,
    ) -> Vec<GateResult> {
        let gates: [fn(&Self, &str, Option<&dyn CcaView>, &KillContext, DateTime<Utc>) -> GateResult; 4] = [
            Self::gate_stage1_probe,
            Self::gate_stage2_viability_scan,
            Self::gate_stage3_constraint_hydration,
            Self::gate_stage4_human_escalation,
        ];
        let mut results = Vec::with_capacity(gates.len());
        for gate in gates {
            let result = gate(self, county_id, profile, ctx, now);
            let proceed = result.proceed;
            results.push(result);
            if !proceed {
                break;
            }
        }
        results
    }

    fn record(
        &self,
        county_id: &str,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        result: GateResult,
    ) -> GateResult {
        tracing::debug!(
            county = county_id,
            stage = %result.stage,
            outcome = result.outcome(),
            reason = %result.reason,
            "stage gate evaluated"
        );
        let mut event = AuditEvent::new(county_id, result.stage, "gate_check", result.outcome()).with_details(json!({
            "reason": result.reason,
            "condition_id": result.kill.as_ref().and_then(|k| k.condition_id.clone()),
            "next_action": result.next_action,
            "retry_count": ctx.retry_count,
            "geometry_blocked": ctx.geometry_blocked,
            "missing_fields": ctx.missing_fields,
        }));
        if let Some(ceiling) = profile.and_then(|p| p.confidence_ceiling()) {
            event = event.with_ceiling(ceiling);
        }
        self.audit.emit(event);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_audit::AuditLog;
    use cca_model::CapabilityProfile;
    use cca_test_utils::{api_profile, expired_profile, fixed_now, manual_profile};
    use pretty_assertions::assert_eq;

    fn gates() -> (StageGates, Arc<AuditLog>) {
        let log = Arc::new(AuditLog::new());
        (StageGates::new(&GateConfig::default(), log.clone()), log)
    }

    fn view(p: &CapabilityProfile) -> Option<&dyn CcaView> {
        Some(p)
    }

    #[test]
    fn stage1_kills_absent_profile() {
        let (g, log) = gates();
        let r = g.gate_stage1_probe("c-1", None, &KillContext::new(), fixed_now());
        assert!(!r.proceed);
        assert_eq!(r.next_action, Some(NextAction::TriggerProbe));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].event.result, "killed");
    }

    #[test]
    fn kill_audit_names_condition_and_action() {
        let (g, log) = gates();
        let p = manual_profile();
        g.gate_stage2_viability_scan("c-1", view(&p), &KillContext::new(), fixed_now());

        let entry = &log.entries()[0];
        assert_eq!(entry.event.stage, PipelineStage::ViabilityScan);
        let details = entry.event.details.as_ref().unwrap();
        assert_eq!(details["condition_id"], "K101");
        assert_eq!(details["next_action"], "route_to_manual_queue");
    }

    #[test]
    fn stage2_rechecks_expiry() {
        let (g, _) = gates();
        let expired = expired_profile();
        let r = g.gate_stage2_viability_scan("c-1", view(&expired), &KillContext::new(), fixed_now());
        assert!(!r.proceed);
        assert_eq!(r.kill.unwrap().condition_id.as_deref(), Some("K002"));
        assert_eq!(r.next_action, Some(NextAction::TriggerProbe));
    }

    #[test]
    fn stage2_routes_unverified_manual_county() {
        let (g, _) = gates();
        let p = manual_profile();
        let r = g.gate_stage2_viability_scan("c-1", view(&p), &KillContext::new(), fixed_now());
        assert_eq!(r.next_action, Some(NextAction::RouteToManualQueue));

        let p = api_profile();
        assert!(g.gate_stage2_viability_scan("c-1", view(&p), &KillContext::new(), fixed_now()).proceed);
    }

    #[test]
    fn stage3_requires_blocked_geometry() {
        let (g, log) = gates();
        let p = api_profile();

        let r = g.gate_stage3_constraint_hydration("c-1", view(&p), &KillContext::new(), fixed_now());
        assert!(!r.proceed);
        assert!(r.kill.is_none());
        assert_eq!(r.outcome(), "blocked");

        let ctx = KillContext::new().with_geometry_blocked(true);
        assert!(g.gate_stage3_constraint_hydration("c-1", view(&p), &ctx, fixed_now()).proceed);

        let ctx = ctx.with_missing_fields(["min_setback_ft"]);
        let r = g.gate_stage3_constraint_hydration("c-1", view(&p), &ctx, fixed_now());
        assert_eq!(r.next_action, Some(NextAction::TriggerHumanEscalation));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn stage4_needs_both_conditions() {
        let (g, _) = gates();
        let p = api_profile();
        let blocked_only = KillContext::new().with_geometry_blocked(true);
        let missing_only = KillContext::new().with_missing_fields(["max_height_ft"]);
        let both = blocked_only.clone().with_missing_fields(["max_height_ft"]);

        assert!(!g.gate_stage4_human_escalation("c-1", view(&p), &blocked_only, fixed_now()).proceed);
        assert!(!g.gate_stage4_human_escalation("c-1", view(&p), &missing_only, fixed_now()).proceed);
        assert!(g.gate_stage4_human_escalation("c-1", view(&p), &both, fixed_now()).proceed);
    }

    #[test]
    fn run_all_stops_at_first_block() {
        let (g, log) = gates();
        let p = api_profile();
        let results = g.run_all("c-1", view(&p), &KillContext::new(), fixed_now());
        assert_eq!(results.len(), 3);
        assert!(results[0].proceed && results[1].proceed);
        assert_eq!(results[2].stage, PipelineStage::ConstraintHydration);
        assert_eq!(log.len(), 3);
    }
}
