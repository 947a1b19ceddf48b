//! Published CCA output shapes
//!
//! Two consumers expect two shapes. Both are projections of the same
//! [`CapabilityProfile`] and both implement [`CcaView`], so every gate and
//! pass contract accepts either.
//!
//! | Shape | Zoning | Confidence field | TTL |
//! |---|---|---|---|
//! | [`CapabilityProbeOutput`] | cheap layer | `confidence_level` | probe policy (calendar year by default) |
//! | [`DoctrineCcaRecord`] | doctrine layer | `confidence_ceiling` | 365 days |

use cca_model::ttl::DOCTRINE_TTL_DAYS;
use cca_model::{
    AutomationClass, CapabilityProfile, CcaView, Citation, Confidence, DocumentQuality,
    DoctrineZoning, PermitSystem, TtlPolicy, ZoningModel,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile-oriented output
///
/// Field names are the wire format.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProbeOutput {
    pub county_id: String,
    pub county_fips: String,
    pub county_name: String,
    pub state_code: String,
    pub zoning_model: ZoningModel,
    pub permit_system: PermitSystem,
    pub document_quality: DocumentQuality,
    pub inspections_linked: Option<bool>,
    pub automation_viable: bool,
    pub confidence_level: Confidence,
    pub detected_vendor: Option<String>,
    pub planning_url: Option<String>,
    pub permits_url: Option<String>,
    pub source_urls: Vec<String>,
    pub notes: Vec<String>,
    pub last_verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Verifier, when a cited manual verification exists
    #[serde(default)]
    pub verified_by: Option<String>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub validation_violations: Vec<String>,
}

impl From<&CapabilityProfile> for CapabilityProbeOutput {
    fn from(p: &CapabilityProfile) -> Self {
        Self {
            county_id: p.county.county_id.clone(),
            county_fips: p.county.county_fips.clone(),
            county_name: p.county.county_name.clone(),
            state_code: p.county.state_code.clone(),
            zoning_model: p.zoning_model,
            permit_system: p.permit_system,
            document_quality: p.document_quality,
            inspections_linked: p.inspections_linked,
            automation_viable: p.automation_viable,
            confidence_level: p.confidence_level,
            detected_vendor: p.detected_vendor.clone(),
            planning_url: p.planning_url.clone(),
            permits_url: p.permits_url.clone(),
            source_urls: p.source_urls.clone(),
            notes: p.notes.clone(),
            last_verified_at: p.last_verified_at,
            expires_at: p.expires_at,
            verified_by: p.manual_verification.as_ref().map(|m| m.verified_by.clone()),
            error_message: p.error_message.clone(),
            validation_violations: p.validation_violations.clone(),
        }
    }
}

/// The profile shape carries no automation class, and its
/// `confidence_level` doubles as the ceiling.
impl CcaView for CapabilityProbeOutput {
    fn county_id(&self) -> &str {
        &self.county_id
    }

    fn automation_class(&self) -> Option<AutomationClass> {
        None
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
        Some(self.confidence_level)
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        Some(self.expires_at)
    }

    fn is_manually_verified(&self) -> bool {
        self.verified_by.is_some()
    }
}

/// Doctrine-locked output
///
/// Fields a producer may leave null deserialize to `None`: consumers treat
/// a null class as manual, a null ceiling as their configured default and a
/// null expiry as expired.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctrineCcaRecord {
    pub county_id: String,
    pub county_fips: String,
    pub county_name: String,
    pub state_code: String,
    #[serde(default)]
    pub zoning_model: DoctrineZoning,
    #[serde(default)]
    pub automation_class: Option<AutomationClass>,
    /// Always `automation_class` mapped 1:1
    #[serde(default)]
    pub permit_system_type: PermitSystem,
    #[serde(default)]
    pub document_quality: DocumentQuality,
    #[serde(default)]
    pub inspections_linked: Option<bool>,
    #[serde(default)]
    pub automation_viable: bool,
    #[serde(default)]
    pub confidence_ceiling: Option<Confidence>,
    #[serde(default)]
    pub detected_vendor: Option<String>,
    #[serde(default)]
    pub source_urls: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    pub verified_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// TTL length in days
    pub ttl_days: i64,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verification_citation: Option<Citation>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub validation_violations: Vec<String>,
}

impl From<&CapabilityProfile> for DoctrineCcaRecord {
    fn from(p: &CapabilityProfile) -> Self {
        let verified_at = p.last_verified_at;
        Self {
            county_id: p.county.county_id.clone(),
            county_fips: p.county.county_fips.clone(),
            county_name: p.county.county_name.clone(),
            state_code: p.county.state_code.clone(),
            zoning_model: p.doctrine_zoning(),
            automation_class: Some(p.automation_class),
            permit_system_type: p.automation_class.permit_system(),
            document_quality: p.document_quality,
            inspections_linked: p.inspections_linked,
            automation_viable: p.automation_viable,
            confidence_ceiling: Some(p.confidence_ceiling),
            detected_vendor: p.detected_vendor.clone(),
            source_urls: p.source_urls.clone(),
            notes: p.notes.clone(),
            verified_at,
            expires_at: Some(TtlPolicy::doctrine().expires_at(verified_at)),
            ttl_days: DOCTRINE_TTL_DAYS,
            verified_by: p.manual_verification.as_ref().map(|m| m.verified_by.clone()),
            verification_citation: p.manual_verification.as_ref().map(|m| m.citation.clone()),
            error_message: p.error_message.clone(),
            validation_violations: p.validation_violations.clone(),
        }
    }
}

impl CcaView for DoctrineCcaRecord {
    fn county_id(&self) -> &str {
        &self.county_id
    }

    fn automation_class(&self) -> Option<AutomationClass> {
        self.automation_class
    }

    fn automation_viable(&self) -> bool {
        self.automation_viable
    }

    fn permit_system(&self) -> Option<PermitSystem> {
        Some(self.permit_system_type)
    }

    fn document_quality(&self) -> Option<DocumentQuality> {
        Some(self.document_quality)
    }

    fn confidence_ceiling(&self) -> Option<Confidence> {
        self.confidence_ceiling
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn is_manually_verified(&self) -> bool {
        self.verified_by.is_some() && self.verification_citation.is_some()
    }
}

/// Which shape to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    /// [`CapabilityProbeOutput`]
    #[default]
    V1,
    /// [`DoctrineCcaRecord`]
    V2,
}

impl OutputShape {
    /// Serialize `profile` in this shape
    ///
    /// # Errors
    /// Propagates `serde_json` failures.
    pub fn to_json(self, profile: &CapabilityProfile) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            OutputShape::V1 => serde_json::to_value(CapabilityProbeOutput::from(profile)),
            OutputShape::V2 => serde_json::to_value(DoctrineCcaRecord::from(profile)),
        }
    }
}

impl std::str::FromStr for OutputShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "profile" => Ok(OutputShape::V1),
            "v2" | "doctrine" => Ok(OutputShape::V2),
            other => Err(format!("unknown output shape '{other}' (expected v1 or v2)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cca_model::{CountyIdentity, ManualVerification};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn profile() -> CapabilityProfile {
        let county = CountyIdentity::new("c-1", "48453", "Travis County", "TX").unwrap();
        let verified = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let mut p = CapabilityProfile::unknown(county, verified, TtlPolicy::CalendarYear, None);
        p.zoning_model = ZoningModel::OverlayBased;
        p.automation_class = AutomationClass::Portal;
        p.detected_vendor = Some("Accela".into());
        p.confidence_ceiling = Confidence::Medium;
        p
    }

    #[test]
    fn shapes_differ_in_ttl() {
        let p = profile();
        let v1 = CapabilityProbeOutput::from(&p);
        let v2 = DoctrineCcaRecord::from(&p);

        assert_eq!(v1.expires_at, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
        assert_eq!(v2.expires_at, Some(v2.verified_at + Duration::days(365)));
        assert_eq!(v2.ttl_days, 365);
    }

    #[test]
    fn doctrine_projection() {
        let v2 = DoctrineCcaRecord::from(&profile());
        assert_eq!(v2.zoning_model, DoctrineZoning::Mixed);
        assert_eq!(v2.permit_system_type, PermitSystem::PortalScrape);
        assert_eq!(v2.confidence_ceiling, Some(Confidence::Medium));

        let json = serde_json::to_value(&v2).unwrap();
        assert_eq!(json["automation_class"], "portal");
        assert_eq!(json["permit_system_type"], "portal_scrape");
        assert_eq!(json["zoning_model"], "mixed");
    }

    #[test]
    fn views_agree_on_shared_fields() {
        let p = profile();
        let v1 = CapabilityProbeOutput::from(&p);
        let v2 = DoctrineCcaRecord::from(&p);
        assert_eq!(v1.county_id(), v2.county_id());
        assert_eq!(v1.automation_viable(), v2.automation_viable());
        assert_eq!(v1.document_quality(), v2.document_quality());
        assert_eq!(v1.automation_class(), None);
        assert_eq!(v2.automation_class(), Some(AutomationClass::Portal));
    }

    #[test]
    fn manual_verification_carried() {
        let mut p = profile();
        let mv = ManualVerification::new("analyst", Citation::new("county clerk email"), p.last_verified_at)
            .unwrap();
        p.apply_manual_verification(mv);

        assert!(CapabilityProbeOutput::from(&p).is_manually_verified());
        let v2 = DoctrineCcaRecord::from(&p);
        assert!(v2.is_manually_verified());
        assert_eq!(v2.confidence_ceiling, Some(Confidence::High));
    }

    #[test]
    fn sparse_doctrine_json_reads_as_unknown() {
        let v2: DoctrineCcaRecord = serde_json::from_str(
            r#"{"county_id":"c-1","county_fips":"48453","county_name":"Travis County",
                "state_code":"TX","verified_at":"2025-01-01T00:00:00Z","ttl_days":365,
                "automation_class":null}"#,
        )
        .unwrap();
        assert_eq!(v2.automation_class(), None);
        assert_eq!(v2.confidence_ceiling(), None);
        assert!(v2.is_expired(Utc::now()));
    }

    #[test]
    fn shape_parsing() {
        assert_eq!("v2".parse::<OutputShape>().unwrap(), OutputShape::V2);
        assert_eq!("profile".parse::<OutputShape>().unwrap(), OutputShape::V1);
        assert!("v3".parse::<OutputShape>().is_err());
    }
}
