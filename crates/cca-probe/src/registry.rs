//! CCA registry
//!
//! Holds one record per county and is the only place records are written.
//! Records come from the probe; the one other write path is a cited manual
//! verification (or a ceiling downgrade), both audited.
//!
//! Probing is single-flight per county: concurrent refreshes for the same
//! county queue on a per-county lock, and a caller that waited reuses the
//! record written after its request began instead of probing again.

use crate::error::RegistryError;
use crate::probe::CapabilityProbe;
use crate::should_probe::{should_probe_county, ProbeReason};
use cca_audit::{AuditEvent, AuditSink};
use cca_model::{CapabilityProfile, CcaView, Confidence, CountyIdentity, ManualVerification, PipelineStage};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredRecord {
    profile: CapabilityProfile,
    /// Registry-wide write counter value at the time of this write
    write_seq: u64,
}

/// Per-county CCA store
pub struct CcaRegistry {
    probe: CapabilityProbe,
    audit: Arc<dyn AuditSink>,
    records: DashMap<String, StoredRecord>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
    writes: AtomicU64,
}

impl std::fmt::Debug for CcaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CcaRegistry")
            .field("probe", &self.probe)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl CcaRegistry {
    /// Empty registry writing through `probe`
    #[must_use]
    pub fn new(probe: CapabilityProbe, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            probe,
            audit,
            records: DashMap::new(),
            inflight: DashMap::new(),
            writes: AtomicU64::new(0),
        }
    }

    /// Snapshot of a county's record, expired or not
    #[must_use]
    pub fn get(&self, county_id: &str) -> Option<CapabilityProfile> {
        self.records.get(county_id).map(|r| r.profile.clone())
    }

    /// Snapshot of a county's record if unexpired at `now`
    #[must_use]
    pub fn fresh(&self, county_id: &str, now: DateTime<Utc>) -> Option<CapabilityProfile> {
        self.get(county_id).filter(|p| !p.is_expired(now))
    }

    /// Number of counties on file
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no county is on file
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Probe the county if [`should_probe_county`] says so, else return the
    /// record on file
    pub async fn refresh(&self, county: &CountyIdentity, reason: ProbeReason) -> CapabilityProfile {
        let requested_at = self.writes.load(Ordering::SeqCst);
        let county_id = county.county_id.as_str();

        if let Some(existing) = self.get(county_id) {
            if !should_probe_county(Some(&existing), reason, Utc::now()) {
                tracing::debug!(county = county_id, %reason, "record on file is current");
                return existing;
            }
        }

        let lock = self
            .inflight
            .entry(county_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(stored) = self.records.get(county_id) {
            if stored.write_seq > requested_at {
                tracing::debug!(county = county_id, "reusing record written while waiting");
                return stored.profile.clone();
            }
        }

        let profile = self.probe.probe_with_retry(county).await;
        self.store(profile.clone());
        profile
    }

    /// Fresh record for the county, probing only when absent or expired
    pub async fn ensure_fresh(&self, county: &CountyIdentity) -> CapabilityProfile {
        self.refresh(county, ProbeReason::Missing).await
    }

    pub(crate) fn store(&self, profile: CapabilityProfile) {
        let write_seq = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        let county_id = profile.county.county_id.clone();
        self.audit.emit(
            AuditEvent::new(&county_id, PipelineStage::Probe, "cca_write", "stored")
                .with_ceiling(profile.confidence_ceiling)
                .with_details(json!({
                    "write_seq": write_seq,
                    "expires_at": profile.expires_at,
                })),
        );
        self.records.insert(county_id, StoredRecord { profile, write_seq });
    }

    /// Record a cited manual verification, raising the ceiling to `high`
    ///
    /// # Errors
    /// `RegistryError::NotFound` when the county has no record.
    pub fn apply_manual_verification(
        &self,
        county_id: &str,
        verification: ManualVerification,
    ) -> Result<CapabilityProfile, RegistryError> {
        let details = json!({
            "verified_by": verification.verified_by,
            "citation": verification.citation,
        });
        let profile = {
            let mut stored = self
                .records
                .get_mut(county_id)
                .ok_or_else(|| RegistryError::NotFound(county_id.to_string()))?;
            stored.profile.apply_manual_verification(verification);
            stored.write_seq = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            stored.profile.clone()
        };

        tracing::info!(county = county_id, "manual verification applied");
        self.audit.emit(
            AuditEvent::new(county_id, PipelineStage::Probe, "manual_verification", "verified")
                .with_ceiling(Confidence::High)
                .with_details(details)
                .manual(),
        );
        Ok(profile)
    }

    /// Change a ceiling outside manual verification
    ///
    /// Downgrades apply. Upgrades are doctrine violations: rejected, logged
    /// and audited, leaving the record untouched.
    ///
    /// # Errors
    /// `RegistryError::NotFound` when the county has no record,
    /// `RegistryError::Doctrine` for an uncited upgrade.
    pub fn set_ceiling(&self, county_id: &str, to: Confidence) -> Result<CapabilityProfile, RegistryError> {
        let outcome = {
            let mut stored = self
                .records
                .get_mut(county_id)
                .ok_or_else(|| RegistryError::NotFound(county_id.to_string()))?;
            match stored.profile.set_ceiling(to) {
                Ok(()) => {
                    stored.write_seq = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(stored.profile.clone())
                }
                Err(violation) => Err((violation, stored.profile.confidence_ceiling)),
            }
        };

        match outcome {
            Ok(profile) => {
                self.audit.emit(
                    AuditEvent::new(county_id, PipelineStage::Probe, "ceiling_change", "applied")
                        .with_ceiling(profile.confidence_ceiling),
                );
                Ok(profile)
            }
            Err((violation, current)) => {
                tracing::warn!(county = county_id, "rejected ceiling change: {}", violation);
                self.audit.emit(
                    AuditEvent::new(county_id, PipelineStage::Probe, "ceiling_change", "rejected")
                        .with_ceiling(current)
                        .with_error(violation.to_string()),
                );
                Err(violation.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_audit::AuditLog;
    use cca_model::{Citation, DoctrineViolation, ProbeConfig};

    fn county() -> CountyIdentity {
        CountyIdentity::new("c-1", "48453", "Travis County", "TX").unwrap()
    }

    fn registry(log: Arc<AuditLog>) -> CcaRegistry {
        let probe = CapabilityProbe::new(ProbeConfig::default(), log.clone());
        CcaRegistry::new(probe, log)
    }

    #[tokio::test]
    async fn ensure_fresh_probes_once() {
        let log = Arc::new(AuditLog::new());
        let reg = registry(log.clone());

        let first = reg.ensure_fresh(&county()).await;
        let second = reg.ensure_fresh(&county()).await;
        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);

        let writes = log.entries().iter().filter(|e| e.event.action == "cca_write").count();
        assert_eq!(writes, 1);
    }

    #[tokio::test]
    async fn manual_reason_forces_reprobe() {
        let reg = registry(Arc::new(AuditLog::new()));
        let first = reg.ensure_fresh(&county()).await;
        let second = reg.refresh(&county(), ProbeReason::Manual).await;
        assert!(second.last_verified_at >= first.last_verified_at);
    }

    #[tokio::test]
    async fn uncited_upgrade_rejected_and_audited() {
        let log = Arc::new(AuditLog::new());
        let reg = registry(log.clone());
        reg.ensure_fresh(&county()).await;

        let err = reg.set_ceiling("c-1", Confidence::High).unwrap_err();
        assert!(matches!(err, RegistryError::Doctrine(DoctrineViolation::UncitedUpgrade { .. })));
        assert_eq!(reg.get("c-1").unwrap().confidence_ceiling, Confidence::Low);

        let rejected = log.entries().into_iter().find(|e| e.event.result == "rejected").unwrap();
        assert!(rejected.event.error.is_some());
    }

    #[tokio::test]
    async fn manual_verification_is_the_upgrade_path() {
        let log = Arc::new(AuditLog::new());
        let reg = registry(log.clone());
        reg.ensure_fresh(&county()).await;

        let mv = ManualVerification::new("analyst", Citation::new("planning office call"), Utc::now()).unwrap();
        let p = reg.apply_manual_verification("c-1", mv).unwrap();
        assert_eq!(p.confidence_ceiling, Confidence::High);
        assert!(reg.get("c-1").unwrap().is_manually_verified());

        let last = log.entries().pop().unwrap();
        assert_eq!(last.event.action, "manual_verification");
        assert_eq!(last.event.source, cca_audit::AuditSource::Manual);
    }

    #[test]
    fn unknown_county_not_found() {
        let reg = registry(Arc::new(AuditLog::new()));
        assert_eq!(
            reg.set_ceiling("nope", Confidence::Low).unwrap_err(),
            RegistryError::NotFound("nope".into())
        );
    }
}
