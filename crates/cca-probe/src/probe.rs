//! Capability probe
//!
//! The probe is the only producer of CCA records. A run:
//!
//! 1. derives candidate planning/permits URLs from the county identity
//! 2. asks the [`PageSource`] for discovered URLs, document links and a snippet
//! 3. runs the four detectors independently (fanned out when configured)
//! 4. aggregates confidence, computes viability, classifies automation
//! 5. stamps verification time and expiry
//! 6. validates the record and attaches violations without blocking
//!
//! A detector failure degrades only that detector. Any other failure
//! degrades the whole record to the all-unknown default. Neither ever
//! reaches the caller.

use crate::aggregate::aggregate_confidence;
use crate::doctrine::{classify_automation, doctrine_ceiling};
use crate::error::ProbeError;
use crate::source::{NoPageSource, PageSource};
use crate::urls::derive_urls;
use crate::validation::validate_profile;
use cca_audit::{AuditEvent, AuditSink};
use cca_detect::{
    Detection, Detector, DetectorError, DetectorInput, DocumentDetector, InspectionDetector,
    PermitDetector, PermitFinding, ZoningDetector,
};
use cca_model::{
    automation_viable, CapabilityProfile, CountyIdentity, DocumentQuality, IdentityError,
    PipelineStage, ProbeConfig, ZoningModel,
};
use chrono::Utc;
use serde_json::json;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Results of the four detectors for one run
#[derive(Debug, Clone)]
pub struct DetectorRun {
    /// Zoning structure
    pub zoning: Detection<ZoningModel>,
    /// Permit access method and vendor
    pub permit: Detection<PermitFinding>,
    /// Document formatting
    pub documents: Detection<DocumentQuality>,
    /// Inspection linkage
    pub inspections: Detection<Option<bool>>,
}

impl DetectorRun {
    /// Run all four detectors
    ///
    /// Detectors share nothing, so `parallel` only changes scheduling.
    #[must_use]
    pub fn execute(input: &DetectorInput, parallel: bool) -> Self {
        if parallel {
            let ((zoning, permit), (documents, inspections)) = rayon::join(
                || {
                    rayon::join(
                        || run_detector(&ZoningDetector, input),
                        || run_detector(&PermitDetector, input),
                    )
                },
                || {
                    rayon::join(
                        || run_detector(&DocumentDetector, input),
                        || run_detector(&InspectionDetector, input),
                    )
                },
            );
            Self {
                zoning,
                permit,
                documents,
                inspections,
            }
        } else {
            Self {
                zoning: run_detector(&ZoningDetector, input),
                permit: run_detector(&PermitDetector, input),
                documents: run_detector(&DocumentDetector, input),
                inspections: run_detector(&InspectionDetector, input),
            }
        }
    }

    /// Per-detector confidences in fixed order
    #[must_use]
    pub fn confidences(&self) -> [cca_model::Confidence; 4] {
        [
            self.zoning.confidence,
            self.permit.confidence,
            self.documents.confidence,
            self.inspections.confidence,
        ]
    }

    /// All signals rendered as notes, detector by detector
    #[must_use]
    pub fn notes(&self) -> Vec<String> {
        self.zoning
            .signals
            .iter()
            .chain(&self.permit.signals)
            .chain(&self.documents.signals)
            .chain(&self.inspections.signals)
            .map(ToString::to_string)
            .collect()
    }

    /// Names of detectors that failed
    #[must_use]
    pub fn failed(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.zoning.is_failure() {
            failed.push(ZoningDetector.name());
        }
        if self.permit.is_failure() {
            failed.push(PermitDetector.name());
        }
        if self.documents.is_failure() {
            failed.push(DocumentDetector.name());
        }
        if self.inspections.is_failure() {
            failed.push(InspectionDetector.name());
        }
        failed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Run one detector, converting an error or panic into its degraded result
pub fn run_detector<D: Detector>(detector: &D, input: &DetectorInput) -> Detection<D::Value> {
    let name = detector.name();
    let error = match panic::catch_unwind(AssertUnwindSafe(|| detector.detect(input))) {
        Ok(Ok(found)) => return found,
        Ok(Err(e)) => e,
        Err(payload) => DetectorError::Panicked {
            detector: name,
            message: panic_message(payload.as_ref()),
        },
    };
    tracing::warn!(detector = name, "detector failed, substituting unknown: {}", error);
    Detection::failed(detector.fallback(), name, error.to_string())
}

/// Capability probe
pub struct CapabilityProbe {
    config: ProbeConfig,
    audit: Arc<dyn AuditSink>,
    source: Arc<dyn PageSource>,
}

impl std::fmt::Debug for CapabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityProbe")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CapabilityProbe {
    /// Probe with no page source
    #[must_use]
    pub fn new(config: ProbeConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            config,
            audit,
            source: Arc::new(NoPageSource),
        }
    }

    /// With a page source
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn PageSource>) -> Self {
        self.source = source;
        self
    }

    /// Probe settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Probe a county from raw identity fields
    ///
    /// # Errors
    /// `IdentityError` for malformed identity fields; nothing else.
    pub async fn run_probe(
        &self,
        county_id: &str,
        county_fips: &str,
        county_name: &str,
        state_code: &str,
    ) -> Result<CapabilityProfile, IdentityError> {
        let county = CountyIdentity::new(county_id, county_fips, county_name, state_code)?;
        Ok(self.probe(&county).await)
    }

    /// [`CapabilityProbe::run_probe`] with transient-failure retry
    ///
    /// # Errors
    /// `IdentityError` for malformed identity fields; nothing else.
    pub async fn run_probe_with_retry(
        &self,
        county_id: &str,
        county_fips: &str,
        county_name: &str,
        state_code: &str,
    ) -> Result<CapabilityProfile, IdentityError> {
        let county = CountyIdentity::new(county_id, county_fips, county_name, state_code)?;
        Ok(self.probe_with_retry(&county).await)
    }

    /// Probe once; failures degrade to the all-unknown record
    pub async fn probe(&self, county: &CountyIdentity) -> CapabilityProfile {
        match self.try_probe(county).await {
            Ok(profile) => profile,
            Err(e) => self.degrade(county, &e),
        }
    }

    /// Probe with linear backoff on transient failures
    ///
    /// Makes at most `max_attempts` attempts. After failed attempt `n` it
    /// waits `n * backoff_base`. Permanent failures and exhaustion both
    /// return the all-unknown record.
    pub async fn probe_with_retry(&self, county: &CountyIdentity) -> CapabilityProfile {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 1;
        loop {
            match self.try_probe(county).await {
                Ok(profile) => return profile,
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = self.config.backoff_base() * attempt;
                    tracing::warn!(
                        county = %county.county_id,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "transient probe failure, retrying: {}",
                        e
                    );
                    self.audit.emit(
                        AuditEvent::new(&county.county_id, PipelineStage::Probe, "probe_retry", "retrying")
                            .with_details(json!({ "attempt": attempt, "wait_ms": wait.as_millis() as u64 }))
                            .with_error(e.to_string()),
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::error!(county = %county.county_id, attempts = attempt, "probe retries exhausted");
                    }
                    return self.degrade(county, &e);
                }
            }
        }
    }

    /// One probe attempt, surfacing page source and classification errors
    ///
    /// # Errors
    /// `ProbeError::Source` when the page source fails,
    /// `ProbeError::Detector` when automation classification cannot run.
    pub async fn try_probe(&self, county: &CountyIdentity) -> Result<CapabilityProfile, ProbeError> {
        tracing::debug!(county = %county, "probing county capability");

        let derived = derive_urls(county);
        let evidence = self.source.fetch(county, &derived).await?;

        let mut urls = derived.to_vec();
        urls.extend(evidence.urls.iter().cloned());
        let mut input = DetectorInput::new(urls)
            .with_document_links(evidence.document_links.clone())
            .with_state(&county.state_code);
        if let Some(snippet) = &evidence.snippet {
            input = input.with_snippet_limit(snippet.clone(), self.config.snippet_limit);
        }

        let run = DetectorRun::execute(&input, self.config.parallel_detectors);

        let discovered = evidence.discovered();
        let classification = classify_automation(&discovered)?;
        let detected_vendor = run.permit.value.vendor.clone().or(classification.vendor);
        let ceiling = doctrine_ceiling(
            classification.class,
            detected_vendor.is_some(),
            run.zoning.value.doctrine(),
        );

        let verified_at = Utc::now();
        let mut profile = CapabilityProfile::unknown(county.clone(), verified_at, self.config.ttl, None);
        profile.zoning_model = run.zoning.value;
        profile.permit_system = run.permit.value.system;
        profile.document_quality = run.documents.value;
        profile.inspections_linked = run.inspections.value;
        profile.automation_viable = automation_viable(profile.permit_system, profile.document_quality);
        profile.automation_class = classification.class;
        profile.confidence_level = aggregate_confidence(&run.confidences());
        profile.confidence_ceiling = ceiling;
        profile.detected_vendor = detected_vendor;
        profile.planning_url = Some(derived.planning);
        profile.permits_url = Some(derived.permits);
        profile.source_urls = discovered;
        profile.notes = run.notes();
        profile.validation_violations = validate_profile(&profile);

        let failed = run.failed();
        if !profile.validation_violations.is_empty() {
            tracing::warn!(
                county = %county.county_id,
                violations = ?profile.validation_violations,
                "probe output has validation violations"
            );
        }
        tracing::info!(
            county = %county.county_id,
            automation_class = %profile.automation_class,
            viable = profile.automation_viable,
            ceiling = %profile.confidence_ceiling,
            "probe complete"
        );

        let result = if failed.is_empty() { "completed" } else { "partial" };
        self.audit.emit(
            AuditEvent::new(&county.county_id, PipelineStage::Probe, "capability_probe", result)
                .with_ceiling(profile.confidence_ceiling)
                .with_details(json!({
                    "automation_class": profile.automation_class,
                    "automation_viable": profile.automation_viable,
                    "confidence_level": profile.confidence_level,
                    "failed_detectors": failed,
                    "validation_violations": profile.validation_violations,
                })),
        );

        Ok(profile)
    }

    fn degrade(&self, county: &CountyIdentity, error: &ProbeError) -> CapabilityProfile {
        tracing::error!(county = %county.county_id, "probe failed, returning unknown profile: {}", error);
        let profile = CapabilityProfile::unknown(
            county.clone(),
            Utc::now(),
            self.config.ttl,
            Some(error.to_string()),
        );
        self.audit.emit(
            AuditEvent::new(&county.county_id, PipelineStage::Probe, "capability_probe", "degraded")
                .with_ceiling(profile.confidence_ceiling)
                .with_error(error.to_string()),
        );
        profile
    }
}
