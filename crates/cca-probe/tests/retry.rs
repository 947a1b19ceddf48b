//! Retry wrapper behavior under paused time

use async_trait::async_trait;
use cca_audit::AuditLog;
use cca_model::{AutomationClass, CountyIdentity, ProbeConfig, ZoningModel};
use cca_probe::{CapabilityProbe, DerivedUrls, PageEvidence, PageSource, ProbeError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Fails the first `failures` calls with `message`, then returns evidence
struct FlakySource {
    failures: u32,
    message: &'static str,
    calls: AtomicU32,
}

impl FlakySource {
    fn new(failures: u32, message: &'static str) -> Self {
        Self {
            failures,
            message,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for FlakySource {
    async fn fetch(&self, _county: &CountyIdentity, _derived: &DerivedUrls) -> Result<PageEvidence, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(ProbeError::source(self.message));
        }
        Ok(PageEvidence::with_urls(vec!["https://county.gov/permits/report.pdf".into()])
            .with_snippet("This county does not have zoning."))
    }
}

fn county() -> CountyIdentity {
    CountyIdentity::new("c-1", "48453", "Travis County", "TX").unwrap()
}

fn probe(source: Arc<FlakySource>, log: Arc<AuditLog>) -> CapabilityProbe {
    CapabilityProbe::new(ProbeConfig::default(), log).with_source(source)
}

#[tokio::test(start_paused = true)]
async fn transient_failure_retried_with_linear_backoff() {
    let source = Arc::new(FlakySource::new(2, "connection timed out"));
    let log = Arc::new(AuditLog::new());
    let probe = probe(source.clone(), log.clone());

    let started = Instant::now();
    let profile = probe.probe_with_retry(&county()).await;

    // waits 1s after attempt 1 and 2s after attempt 2
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
    assert_eq!(source.calls(), 3);
    assert!(profile.error_message.is_none());
    assert_eq!(profile.zoning_model, ZoningModel::NoZoning);
    assert_eq!(profile.automation_class, AutomationClass::Pdf);

    let retries = log.entries().iter().filter(|e| e.event.action == "probe_retry").count();
    assert_eq!(retries, 2);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_return_default_record() {
    let source = Arc::new(FlakySource::new(10, "network unreachable"));
    let log = Arc::new(AuditLog::new());
    let probe = probe(source.clone(), log.clone());

    let started = Instant::now();
    let profile = probe.probe_with_retry(&county()).await;

    assert_eq!(source.calls(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(3000));
    assert_eq!(profile.zoning_model, ZoningModel::Unknown);
    assert!(!profile.automation_viable);
    assert!(profile.error_message.as_deref().unwrap_or_default().contains("network unreachable"));

    let last = log.entries().pop().unwrap();
    assert_eq!(last.event.result, "degraded");
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_not_retried() {
    let source = Arc::new(FlakySource::new(1, "403 forbidden"));
    let probe = probe(source.clone(), Arc::new(AuditLog::new()));

    let started = Instant::now();
    let profile = probe.probe_with_retry(&county()).await;

    assert_eq!(source.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(profile.error_message.is_some());
}

#[tokio::test(start_paused = true)]
async fn attempt_cap_follows_config() {
    let source = Arc::new(FlakySource::new(10, "timeout"));
    let config = ProbeConfig::default().with_max_attempts(2).with_backoff_base_ms(50);
    let probe = CapabilityProbe::new(config, Arc::new(AuditLog::new())).with_source(source.clone());

    let started = Instant::now();
    probe.probe_with_retry(&county()).await;
    assert_eq!(source.calls(), 2);
    assert_eq!(started.elapsed(), Duration::from_millis(50));
}

#[tokio::test]
async fn run_probe_does_not_retry() {
    let source = Arc::new(FlakySource::new(1, "timeout"));
    let probe = probe(source.clone(), Arc::new(AuditLog::new()));

    let profile = probe
        .run_probe("c-1", "48453", "Travis County", "TX")
        .await
        .unwrap();
    assert_eq!(source.calls(), 1);
    assert!(profile.error_message.is_some());
}
