//! The County Capability Asset record
//!
//! [`CapabilityProfile`] is the canonical internal record. Both published
//! output shapes (profile-oriented and doctrine-locked) are projections of
//! it. Consumers never receive the record itself: they take a [`CcaView`],
//! which exposes getters only.

use crate::cited::Citation;
use crate::classification::{
    AutomationClass, DocumentQuality, DoctrineZoning, PermitSystem, ZoningModel,
};
use crate::confidence::{is_upgrade_attempt, Confidence};
use crate::county::CountyIdentity;
use crate::error::DoctrineViolation;
use crate::ttl::{self, TtlPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cited human verification; the sanctioned path to `High`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualVerification {
    /// Who verified
    pub verified_by: String,
    /// Evidence
    pub citation: Citation,
    /// When
    pub verified_at: DateTime<Utc>,
}

impl ManualVerification {
    /// Build a verification event
    ///
    /// # Errors
    /// `DoctrineViolation::IncompleteVerification` when `verified_by` or the
    /// citation reference is blank.
    pub fn new(
        verified_by: impl Into<String>,
        citation: Citation,
        verified_at: DateTime<Utc>,
    ) -> Result<Self, DoctrineViolation> {
        let verified_by = verified_by.into();
        if verified_by.trim().is_empty() {
            return Err(DoctrineViolation::IncompleteVerification("verified_by"));
        }
        if !citation.is_meaningful() {
            return Err(DoctrineViolation::IncompleteVerification("a citation"));
        }
        Ok(Self {
            verified_by,
            citation,
            verified_at,
        })
    }
}

/// Canonical County Capability Asset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// County identity
    pub county: CountyIdentity,
    /// Cheap-layer zoning structure
    pub zoning_model: ZoningModel,
    /// Permit access method from the permit detector
    pub permit_system: PermitSystem,
    /// Document formatting
    pub document_quality: DocumentQuality,
    /// Whether inspections live in the permit system; `None` when unknown
    pub inspections_linked: Option<bool>,
    /// Both permit and document legs support automation
    pub automation_viable: bool,
    /// Doctrine automation class
    pub automation_class: AutomationClass,
    /// Aggregated detector confidence
    pub confidence_level: Confidence,
    /// Doctrine ceiling for everything derived from this record
    pub confidence_ceiling: Confidence,
    /// Vendor platform, when one matched
    pub detected_vendor: Option<String>,
    /// Derived planning department URL (heuristic, unverified)
    pub planning_url: Option<String>,
    /// Derived permits URL (heuristic, unverified)
    pub permits_url: Option<String>,
    /// URLs discovered as evidence
    pub source_urls: Vec<String>,
    /// Free-text notes, including rendered detector signals
    pub notes: Vec<String>,
    /// Verification instant
    pub last_verified_at: DateTime<Utc>,
    /// Expiry under the probe's TTL policy
    pub expires_at: DateTime<Utc>,
    /// Cited manual verification, if any
    pub manual_verification: Option<ManualVerification>,
    /// Set when the probe degraded to the default record
    pub error_message: Option<String>,
    /// Output validation findings; reported, never blocking
    pub validation_violations: Vec<String>,
}

impl CapabilityProfile {
    /// The all-unknown default record
    ///
    /// Returned for any probe failure, including exhausted retries.
    #[must_use]
    pub fn unknown(
        county: CountyIdentity,
        verified_at: DateTime<Utc>,
        ttl: TtlPolicy,
        error_message: Option<String>,
    ) -> Self {
        Self {
            county,
            zoning_model: ZoningModel::Unknown,
            permit_system: PermitSystem::Unknown,
            document_quality: DocumentQuality::Unknown,
            inspections_linked: None,
            automation_viable: false,
            automation_class: AutomationClass::Manual,
            confidence_level: Confidence::Low,
            confidence_ceiling: Confidence::Low,
            detected_vendor: None,
            planning_url: None,
            permits_url: None,
            source_urls: Vec::new(),
            notes: Vec::new(),
            last_verified_at: verified_at,
            expires_at: ttl.expires_at(verified_at),
            manual_verification: None,
            error_message,
            validation_violations: Vec::new(),
        }
    }

    /// Doctrine-layer zoning
    #[must_use]
    pub fn doctrine_zoning(&self) -> DoctrineZoning {
        self.zoning_model.doctrine()
    }

    /// Set the ceiling, refusing uncited upgrades
    ///
    /// # Errors
    /// `DoctrineViolation::UncitedUpgrade` when `to` ranks above the current
    /// ceiling. Use [`CapabilityProfile::apply_manual_verification`] instead.
    pub fn set_ceiling(&mut self, to: Confidence) -> Result<(), DoctrineViolation> {
        if is_upgrade_attempt(self.confidence_ceiling, to) {
            return Err(DoctrineViolation::UncitedUpgrade {
                before: self.confidence_ceiling,
                after: to,
            });
        }
        self.confidence_ceiling = to;
        self.confidence_level = self.confidence_level.min(to);
        Ok(())
    }

    /// Record a cited manual verification, writing `High` directly
    pub fn apply_manual_verification(&mut self, verification: ManualVerification) {
        self.notes.push(format!(
            "manually verified by {}: {}",
            verification.verified_by, verification.citation.reference
        ));
        self.confidence_ceiling = Confidence::High;
        self.confidence_level = Confidence::High;
        self.manual_verification = Some(verification);
    }
}

/// Read-only view of a CCA record
///
/// Every consumer (kill switch, gates, pass contracts) accepts this trait
/// rather than a record, so no consumer can write back.
pub trait CcaView {
    /// County key
    fn county_id(&self) -> &str;

    /// Doctrine automation class; `None` when the shape does not carry one
    fn automation_class(&self) -> Option<AutomationClass>;

    /// Derived automation viability
    fn automation_viable(&self) -> bool;

    /// Permit access method
    fn permit_system(&self) -> Option<PermitSystem>;

    /// Document formatting
    fn document_quality(&self) -> Option<DocumentQuality>;

    /// Ceiling for downstream confidence; `None` when unset
    fn confidence_ceiling(&self) -> Option<Confidence>;

    /// Expiry instant; `None` means the TTL is unknown
    fn expires_at(&self) -> Option<DateTime<Utc>>;

    /// Whether a cited manual verification exists
    fn is_manually_verified(&self) -> bool;

    /// Expired records are equivalent to absent ones. Unknown expiry counts
    /// as expired.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at()
            .map_or(true, |expires_at| ttl::is_expired(expires_at, now))
    }
}

impl CcaView for CapabilityProfile {
    fn county_id(&self) -> &str {
        &self.county.county_id
    }

    fn automation_class(&self) -> Option<AutomationClass> {
        Some(self.automation_class)
    }

    fn automation_viable(&self) -> bool {
        self.automation_viable
    }

    fn permit_system(&self) -> Option<PermitSystem> {
        Some(self.permit_system)
    }

    fn document_quality(&self) -> Option<DocumentQuality> {
        Some(self.document_quality)
    }

    fn confidence_ceiling(&self) -> Option<Confidence> {
        Some(self.confidence_ceiling)
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        Some(self.expires_at)
    }

    fn is_manually_verified(&self) -> bool {
        self.manual_verification.is_some()
    }
}

/// True when `profile` is absent or expired at `now`
#[must_use]
pub fn is_absent_or_expired<V: CcaView + ?Sized>(profile: Option<&V>, now: DateTime<Utc>) -> bool {
    profile.map_or(true, |p| p.is_expired(now))
}
