//! At most one probe in flight per county

use async_trait::async_trait;
use cca_audit::AuditLog;
use cca_model::{CountyIdentity, ProbeConfig};
use cca_probe::{CapabilityProbe, CcaRegistry, DerivedUrls, PageEvidence, PageSource, ProbeError, ProbeReason};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Takes a while and counts how often it is asked
#[derive(Default)]
struct SlowSource {
    calls: AtomicU32,
}

#[async_trait]
impl PageSource for SlowSource {
    async fn fetch(&self, _county: &CountyIdentity, _derived: &DerivedUrls) -> Result<PageEvidence, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(PageEvidence::with_urls(vec!["https://energov.county.gov/selfservice".into()]))
    }
}

fn registry(source: Arc<SlowSource>) -> Arc<CcaRegistry> {
    let log = Arc::new(AuditLog::new());
    let probe = CapabilityProbe::new(ProbeConfig::default(), log.clone()).with_source(source);
    Arc::new(CcaRegistry::new(probe, log))
}

fn county(id: &str) -> CountyIdentity {
    CountyIdentity::new(id, "48453", "Travis County", "TX").unwrap()
}

#[tokio::test(start_paused = true)]
async fn concurrent_refreshes_share_one_probe() {
    let source = Arc::new(SlowSource::default());
    let reg = registry(source.clone());

    let c = county("c-1");
    let (a, b, c3) = tokio::join!(
        reg.refresh(&c, ProbeReason::Manual),
        reg.refresh(&c, ProbeReason::Manual),
        reg.refresh(&c, ProbeReason::Manual),
    );

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(a, b);
    assert_eq!(b, c3);
}

#[tokio::test(start_paused = true)]
async fn different_counties_probe_independently() {
    let source = Arc::new(SlowSource::default());
    let reg = registry(source.clone());

    let handles: Vec<_> = ["c-1", "c-2", "c-3"]
        .into_iter()
        .map(|id| {
            let reg = reg.clone();
            let c = county(id);
            tokio::spawn(async move { reg.ensure_fresh(&c).await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(reg.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn later_request_probes_again() {
    let source = Arc::new(SlowSource::default());
    let reg = registry(source.clone());
    let c = county("c-1");

    reg.refresh(&c, ProbeReason::Manual).await;
    reg.refresh(&c, ProbeReason::Manual).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}
