//! Doctrine-locked classification
//!
//! Automation class is decided by a fixed cascade over discovered URLs, and
//! the confidence ceiling by a fixed decision table. Both are evaluated top
//! to bottom; the first matching row decides.

use cca_detect::{match_vendor, DetectorError};
use cca_model::{AutomationClass, Confidence, DoctrineZoning};
use serde::{Deserialize, Serialize};

/// Result of the automation class cascade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationClassification {
    /// Decided class
    pub class: AutomationClass,
    /// First vendor platform seen among the URLs, whatever the class
    pub vendor: Option<String>,
}

fn is_api_url(url: &str) -> bool {
    let lowered = url.to_ascii_lowercase();
    lowered.contains("/api/") || lowered.contains("/rest/")
}

fn is_pdf_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".pdf")
}

/// Classify how a county's data is reachable
///
/// Cascade, first match wins:
/// 1. no URLs → `manual`
/// 2. any `/api/` or `/rest/` URL → `api`
/// 3. any vendor-pattern URL → `portal`
/// 4. any `.pdf` URL → `pdf`
/// 5. otherwise → `manual`
///
/// # Errors
/// `DetectorError::PatternTable` if the vendor table is unusable.
pub fn classify_automation(urls: &[String]) -> Result<AutomationClassification, DetectorError> {
    let mut vendor = None;
    for url in urls {
        if let Some(found) = match_vendor(url)? {
            vendor = Some(found.to_string());
            break;
        }
    }

    let class = if urls.is_empty() {
        AutomationClass::Manual
    } else if urls.iter().any(|u| is_api_url(u)) {
        AutomationClass::Api
    } else if vendor.is_some() {
        AutomationClass::Portal
    } else if urls.iter().any(|u| is_pdf_url(u)) {
        AutomationClass::Pdf
    } else {
        AutomationClass::Manual
    };

    Ok(AutomationClassification { class, vendor })
}

/// Confidence ceiling decision table
///
/// | Row | Condition | Ceiling |
/// |---|---|---|
/// | 1 | class is `manual` | low |
/// | 2 | class is `api` or `portal` and a vendor was detected | medium |
/// | 3 | class is `pdf` | low |
/// | 4 | zoning is `unknown` | low |
/// | 5 | anything else | low |
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn doctrine_ceiling(
    class: AutomationClass,
    vendor_detected: bool,
    zoning: DoctrineZoning,
) -> Confidence {
    match class {
        AutomationClass::Manual => Confidence::Low,
        AutomationClass::Api | AutomationClass::Portal if vendor_detected => Confidence::Medium,
        AutomationClass::Pdf => Confidence::Low,
        _ if zoning == DoctrineZoning::Unknown => Confidence::Low,
        _ => Confidence::Low,
    }
}
