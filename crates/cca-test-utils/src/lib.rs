//! Testing utilities for the CCA workspace
//!
//! Shared fixtures (identities, profiles, kill contexts) and audit sinks.

#![allow(missing_docs)]

use cca_audit::{AuditError, AuditEvent, AuditSink};
use cca_model::{
    AutomationClass, CapabilityProfile, Confidence, CountyIdentity, DocumentQuality, PermitSystem,
    TtlPolicy,
};
use cca_probe::{CapabilityProbeOutput, DoctrineCcaRecord};
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn travis() -> CountyIdentity {
    CountyIdentity::new("tx-travis", "48453", "Travis County", "TX").unwrap()
}

pub fn county(county_id: &str) -> CountyIdentity {
    CountyIdentity::new(county_id, "12345", "Example County", "GA").unwrap()
}

/// Unexpired profile verified at [`fixed_now`]
pub fn profile(class: AutomationClass, viable: bool, ceiling: Confidence) -> CapabilityProfile {
    let mut p = CapabilityProfile::unknown(travis(), fixed_now(), TtlPolicy::CalendarYear, None);
    p.automation_class = class;
    p.automation_viable = viable;
    p.confidence_ceiling = ceiling;
    p.confidence_level = ceiling;
    if viable {
        p.permit_system = PermitSystem::PortalScrape;
        p.document_quality = DocumentQuality::StructuredHtml;
    }
    if class != AutomationClass::Manual {
        p.source_urls.push("https://aca-prod.accela.com/TRAVIS".into());
    }
    p
}

pub fn api_profile() -> CapabilityProfile {
    profile(AutomationClass::Api, true, Confidence::Medium)
}

pub fn portal_profile() -> CapabilityProfile {
    profile(AutomationClass::Portal, true, Confidence::Medium)
}

pub fn pdf_profile() -> CapabilityProfile {
    profile(AutomationClass::Pdf, false, Confidence::Low)
}

pub fn manual_profile() -> CapabilityProfile {
    profile(AutomationClass::Manual, false, Confidence::Low)
}

/// Api profile whose TTL lapsed a day before [`fixed_now`]
pub fn expired_profile() -> CapabilityProfile {
    let mut p = api_profile();
    p.last_verified_at = fixed_now() - Duration::days(400);
    p.expires_at = fixed_now() - Duration::days(1);
    p
}

pub fn v1(profile: &CapabilityProfile) -> CapabilityProbeOutput {
    CapabilityProbeOutput::from(profile)
}

pub fn v2(profile: &CapabilityProfile) -> DoctrineCcaRecord {
    DoctrineCcaRecord::from(profile)
}

/// Sink that keeps raw events for assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn last(&self) -> Option<AuditEvent> {
        self.events.lock().last().cloned()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.action.clone()).collect()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Sink that rejects every event
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSink;

impl AuditSink for UnavailableSink {
    fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::SinkUnavailable("test sink offline".into()))
    }
}
