//! Capability classifications
//!
//! These enums describe HOW a county's data can be reached and how its
//! zoning authority is structured. None of them describe substantive rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a county's permit and planning data is reachable
///
/// Drives every downstream routing decision. `Unrecognized` absorbs values
/// written by newer producers so consumers can still fall back to `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationClass {
    /// Machine-readable API
    Api,
    /// Vendor portal that can be scraped
    Portal,
    /// PDF logs only
    Pdf,
    /// Phone, counter or paper only
    Manual,
    /// Value not known to this build
    #[serde(other)]
    Unrecognized,
}

impl AutomationClass {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AutomationClass::Api => "api",
            AutomationClass::Portal => "portal",
            AutomationClass::Pdf => "pdf",
            AutomationClass::Manual => "manual",
            AutomationClass::Unrecognized => "unrecognized",
        }
    }

    /// Pure 1:1 mapping used by the doctrine record's `permit_system_type`
    #[must_use]
    pub fn permit_system(self) -> PermitSystem {
        match self {
            AutomationClass::Api => PermitSystem::Api,
            AutomationClass::Portal => PermitSystem::PortalScrape,
            AutomationClass::Pdf => PermitSystem::PdfLogs,
            AutomationClass::Manual => PermitSystem::ManualOnly,
            AutomationClass::Unrecognized => PermitSystem::Unknown,
        }
    }
}

impl fmt::Display for AutomationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cheap-layer zoning structure produced by the zoning detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoningModel {
    /// One ordinance covers the unincorporated county
    Countywide,
    /// Only incorporated municipalities zone
    MunicipalOnly,
    /// Zoning expressed mainly through overlay districts
    OverlayBased,
    /// No zoning authority; a valid terminal value
    NoZoning,
    /// Not determined
    #[default]
    Unknown,
}

impl ZoningModel {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ZoningModel::Countywide => "countywide",
            ZoningModel::MunicipalOnly => "municipal_only",
            ZoningModel::OverlayBased => "overlay_based",
            ZoningModel::NoZoning => "no_zoning",
            ZoningModel::Unknown => "unknown",
        }
    }

    /// Project onto the doctrine-layer vocabulary
    #[must_use]
    pub fn doctrine(self) -> DoctrineZoning {
        match self {
            ZoningModel::Countywide => DoctrineZoning::County,
            ZoningModel::MunicipalOnly => DoctrineZoning::Municipal,
            ZoningModel::OverlayBased => DoctrineZoning::Mixed,
            ZoningModel::NoZoning => DoctrineZoning::NoZoning,
            ZoningModel::Unknown => DoctrineZoning::Unknown,
        }
    }
}

impl fmt::Display for ZoningModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Doctrine-layer zoning structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctrineZoning {
    /// No zoning authority
    NoZoning,
    /// County holds zoning authority
    County,
    /// Municipalities hold zoning authority
    Municipal,
    /// Split or layered authority
    Mixed,
    /// Not determined
    #[default]
    Unknown,
}

impl DoctrineZoning {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoctrineZoning::NoZoning => "no_zoning",
            DoctrineZoning::County => "county",
            DoctrineZoning::Municipal => "municipal",
            DoctrineZoning::Mixed => "mixed",
            DoctrineZoning::Unknown => "unknown",
        }
    }
}

/// Permit data access method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitSystem {
    /// Public API
    Api,
    /// Scrapeable portal
    PortalScrape,
    /// Published PDF logs
    PdfLogs,
    /// Manual requests only
    ManualOnly,
    /// Not determined
    #[default]
    Unknown,
}

impl PermitSystem {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PermitSystem::Api => "api",
            PermitSystem::PortalScrape => "portal_scrape",
            PermitSystem::PdfLogs => "pdf_logs",
            PermitSystem::ManualOnly => "manual_only",
            PermitSystem::Unknown => "unknown",
        }
    }

    /// Permit leg of the automation viability rule
    #[inline]
    #[must_use]
    pub fn supports_automation(self) -> bool {
        matches!(self, PermitSystem::Api | PermitSystem::PortalScrape)
    }
}

impl fmt::Display for PermitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formatting of published zoning documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentQuality {
    /// HTML code library or CMS
    StructuredHtml,
    /// Text-layer PDF
    SearchablePdf,
    /// Image-only PDF
    ScannedPdf,
    /// Nothing published
    None,
    /// Not determined
    #[default]
    Unknown,
}

impl DocumentQuality {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentQuality::StructuredHtml => "structured_html",
            DocumentQuality::SearchablePdf => "searchable_pdf",
            DocumentQuality::ScannedPdf => "scanned_pdf",
            DocumentQuality::None => "none",
            DocumentQuality::Unknown => "unknown",
        }
    }

    /// Document leg of the automation viability rule
    #[inline]
    #[must_use]
    pub fn supports_automation(self) -> bool {
        matches!(
            self,
            DocumentQuality::StructuredHtml | DocumentQuality::SearchablePdf
        )
    }
}

impl fmt::Display for DocumentQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Automation viability: both legs are required
#[inline]
#[must_use]
pub fn automation_viable(permit: PermitSystem, documents: DocumentQuality) -> bool {
    permit.supports_automation() && documents.supports_automation()
}
