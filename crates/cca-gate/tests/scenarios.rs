//! End-to-end decisions over CCA records

use cca_audit::{AuditLog, AuditQuery, AuditSink};
use cca_gate::{
    check_kill_switch, check_kill_switch_for_stage, get_kill_action, get_pass0_throttle, get_pass2_routing,
    ConstraintSheet, KillContext, NextAction, PassContracts, Route, StageGates,
};
use cca_model::{AutomationClass, CcaView, Confidence, GateConfig, PipelineStage, ProbeConfig};
use cca_probe::{CapabilityProbe, CcaRegistry, PageEvidence, StaticPageSource};
use cca_test_utils::{fixed_now, manual_profile, profile, travis};
use chrono::Utc;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn scenario_a_absent_profile_throttles() {
    let d = get_pass0_throttle(None, Confidence::Medium, fixed_now());
    assert!(!d.allow_full_automation);
    assert_eq!(d.confidence_cap, Confidence::Low);
    assert_eq!(d.throttle_reason, "No capability profile");
}

#[test]
fn scenario_b_viable_api_county_crawls() {
    let p = profile(AutomationClass::Api, true, Confidence::Medium);
    let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
    assert_eq!(d.route_to, Route::Firecrawl);
    assert_eq!(d.confidence_ceiling, Confidence::Medium);
}

#[test]
fn scenario_c_manual_county_calls() {
    let p = manual_profile();
    let d = get_pass2_routing(Some(&p), Confidence::Medium, fixed_now());
    assert_eq!(d.route_to, Route::Retell);
    assert_eq!(d.confidence_ceiling, Confidence::Low);
}

#[test]
fn first_match_respects_declared_order() {
    let p = manual_profile();
    let view: Option<&dyn CcaView> = Some(&p);
    let ctx = KillContext::new().with_retry_count(3);

    let global = check_kill_switch(view, &ctx, fixed_now());
    assert_eq!(global.condition_id.as_deref(), Some("K003"));
    assert_eq!(global.stage, Some(PipelineStage::Probe));

    let scoped = check_kill_switch_for_stage(PipelineStage::ViabilityScan, view, &ctx, fixed_now());
    assert_eq!(scoped.condition_id.as_deref(), Some("K101"));
    assert_eq!(get_kill_action(&scoped), Some(NextAction::RouteToManualQueue));
}

#[tokio::test]
async fn probed_portal_county_flows_through_every_gate() {
    let log = Arc::new(AuditLog::new());
    let evidence = PageEvidence::with_urls(vec!["https://aca-prod.accela.com/TRAVIS/Default.aspx".into()])
        .with_document_links(vec![
            "https://library.municode.com/tx/travis_county/codes/code_of_ordinances".into(),
        ]);
    let probe = CapabilityProbe::new(ProbeConfig::default(), log.clone())
        .with_source(Arc::new(StaticPageSource::new(evidence)));
    let registry = CcaRegistry::new(probe, log.clone());

    let county = travis();
    let p = registry.ensure_fresh(&county).await;
    let now = Utc::now();
    let view: Option<&dyn CcaView> = Some(&p);

    let contracts = PassContracts::new(GateConfig::default(), log.clone());
    assert!(contracts.pass0_throttle(view, &county.county_fips, now).allow_full_automation);
    assert_eq!(contracts.pass2_routing(view, &county.county_fips, now).route_to, Route::Firecrawl);

    // Pass 2 hydrated one cited value and one uncited one
    let mut sheet: ConstraintSheet = serde_json::from_value(serde_json::json!({
        "max_height_ft": {"value": 40.0, "citation": {"reference": "Sec. 25-2-492"}, "confidence": "high"},
        "min_setback_ft": {"value": 25.0, "citation": null, "confidence": "medium"}
    }))
    .unwrap();
    let violations = sheet.sanitize(&county.county_id, log.as_ref());
    assert_eq!(violations.len(), 1);
    let sheet = sheet.capped(p.confidence_ceiling);
    assert_eq!(sheet.max_height_ft.confidence, Confidence::Medium);

    let ctx = KillContext::new()
        .with_geometry_blocked(true)
        .with_missing_fields(sheet.missing_fields());
    let gates = StageGates::new(&GateConfig::default(), log.clone());
    let results = gates.run_all(&county.county_id, view, &ctx, now);

    assert_eq!(results.len(), 3);
    assert!(results[0].proceed && results[1].proceed);
    assert_eq!(results[2].stage, PipelineStage::ConstraintHydration);
    assert_eq!(results[2].next_action, Some(NextAction::TriggerHumanEscalation));

    let escalate = gates.gate_stage4_human_escalation(&county.county_id, view, &ctx, now);
    assert!(escalate.proceed);

    let report = log.compliance_report(&county.county_id, &PipelineStage::GATED);
    assert!(report.passed(), "{report:?}");
    assert!(log.verify_integrity().is_ok());

    let hydration = log.query(&AuditQuery::new().county(&county.county_id).stage(PipelineStage::ConstraintHydration));
    assert_eq!(hydration.len(), 2);
}

#[test]
fn pass_checks_land_in_the_county_report() {
    let log = Arc::new(AuditLog::new());
    let contracts = PassContracts::new(GateConfig::default(), log.clone());
    let p = profile(AutomationClass::Api, true, Confidence::Medium);
    let view: Option<&dyn CcaView> = Some(&p);

    contracts.pass0_throttle(view, "48453", fixed_now());
    contracts.pass2_routing(view, "48453", fixed_now());
    StageGates::new(&GateConfig::default(), log.clone()).gate_stage1_probe(
        "tx-travis",
        view,
        &KillContext::new(),
        fixed_now(),
    );

    let report = log.compliance_report(
        "tx-travis",
        &[PipelineStage::Pass0Throttle, PipelineStage::Pass2Routing, PipelineStage::Probe],
    );
    assert!(report.passed(), "{report:?}");
    assert!(log.query(&AuditQuery::new().county("48453")).is_empty());
}

#[test]
fn pass_check_without_a_record_is_keyed_by_fips() {
    let log = Arc::new(AuditLog::new());
    let contracts = PassContracts::new(GateConfig::default(), log.clone());
    assert!(!contracts.should_pass2_proceed(None, "48453", fixed_now()));
    assert_eq!(log.query(&AuditQuery::new().county("48453")).len(), 1);
}

#[test]
fn audit_failure_never_blocks_a_gate() {
    struct Offline;
    impl AuditSink for Offline {
        fn record(&self, _event: cca_audit::AuditEvent) -> Result<(), cca_audit::AuditError> {
            Err(cca_audit::AuditError::SinkUnavailable("down".into()))
        }
    }

    let gates = StageGates::new(&GateConfig::default(), Arc::new(Offline));
    let r = gates.gate_stage1_probe("tx-travis", None, &KillContext::new(), fixed_now());
    assert!(!r.proceed);
    assert_eq!(r.next_action, Some(NextAction::TriggerProbe));
}
