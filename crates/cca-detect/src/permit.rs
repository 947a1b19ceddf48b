//! Permit-system detector
//!
//! Categories are evaluated in a fixed order and the first category that
//! matches decides:
//!
//! 1. vendor URL pattern → `portal_scrape` / medium
//! 2. "api" and "permit" co-occurring → `api` / low
//! 3. portal keywords → `portal_scrape` / low
//! 4. PDF keywords → `pdf_logs` / low
//! 5. manual keywords → `manual_only` / low

use crate::error::DetectorError;
use crate::input::DetectorInput;
use crate::vendor::match_vendor;
use crate::{finish_signals, Detection, Detector};
use cca_model::{Confidence, DetectorSignal, PermitSystem, SignalKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Permit access method plus the vendor that identified it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermitFinding {
    /// Access method
    pub system: PermitSystem,
    /// Vendor platform, for vendor matches
    pub vendor: Option<String>,
}

impl PermitFinding {
    /// Finding without a vendor
    #[must_use]
    pub fn of(system: PermitSystem) -> Self {
        Self {
            system,
            vendor: None,
        }
    }
}

/// Keyword categories after the vendor and API checks, in evaluation order
const KEYWORD_CATEGORIES: &[(PermitSystem, &[&str])] = &[
    (
        PermitSystem::PortalScrape,
        &[
            "citizen portal",
            "permit portal",
            "apply online",
            "online permitting",
            "customer self service",
            "self-service portal",
        ],
    ),
    (
        PermitSystem::PdfLogs,
        &[
            "permit log",
            "permit report",
            "permits issued",
            "monthly building report",
        ],
    ),
    (
        PermitSystem::ManualOnly,
        &[
            "in person",
            "paper application",
            "visit our office",
            "call our office",
            "by appointment",
            "mail the completed",
        ],
    ),
];

static API_WORD: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"\bapi\b"));

/// Permit access detector
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitDetector;

impl Detector for PermitDetector {
    type Value = PermitFinding;

    fn name(&self) -> &'static str {
        "permit_system"
    }

    fn fallback(&self) -> PermitFinding {
        PermitFinding::default()
    }

    fn detect(&self, input: &DetectorInput) -> Result<Detection<PermitFinding>, DetectorError> {
        let name = self.name();

        for url in input.all_links() {
            if let Some(vendor) = match_vendor(url)? {
                let signal = DetectorSignal::new(
                    SignalKind::Vendor,
                    format!("{vendor} permitting platform"),
                    url,
                );
                return Ok(Detection::new(
                    PermitFinding {
                        system: PermitSystem::PortalScrape,
                        vendor: Some(vendor.to_string()),
                    },
                    Confidence::Medium,
                    vec![signal],
                ));
            }
        }

        let text = input.haystack();
        let api_word = API_WORD.as_ref().map_err(|e| DetectorError::PatternTable {
            table: "api_keyword",
            message: e.to_string(),
        })?;
        if api_word.is_match(&text) && text.contains("permit") {
            let signal = DetectorSignal::new(
                SignalKind::Keyword,
                "'api' and 'permit' co-occur",
                "urls+snippet",
            );
            return Ok(Detection::new(
                PermitFinding::of(PermitSystem::Api),
                Confidence::Low,
                vec![signal],
            ));
        }

        for (system, keywords) in KEYWORD_CATEGORIES {
            if let Some(hit) = keywords.iter().find(|k| text.contains(*k)) {
                let signal = DetectorSignal::new(
                    SignalKind::Keyword,
                    format!("matched '{hit}' ({system})"),
                    "urls+snippet",
                );
                return Ok(Detection::new(
                    PermitFinding::of(*system),
                    Confidence::Low,
                    vec![signal],
                ));
            }
        }

        Ok(Detection::new(
            PermitFinding::default(),
            Confidence::Low,
            finish_signals(name, Vec::new()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(input: DetectorInput) -> Detection<PermitFinding> {
        PermitDetector.detect(&input).unwrap()
    }

    #[test]
    fn vendor_url_wins_over_keywords() {
        let input = DetectorInput::new(vec!["https://aca-prod.accela.com/MESA".into()])
            .with_snippet("Submit a paper application in person. Permit API coming soon.");
        let found = detect(input);
        assert_eq!(found.value.system, PermitSystem::PortalScrape);
        assert_eq!(found.value.vendor.as_deref(), Some("Accela"));
        assert_eq!(found.confidence, Confidence::Medium);
        assert_eq!(found.signals[0].kind, SignalKind::Vendor);
    }

    #[test]
    fn api_co_occurrence_beats_portal_keywords() {
        let input = DetectorInput::new(vec!["https://data.county.gov/api/permits".into()])
            .with_snippet("Apply online through the citizen portal.");
        let found = detect(input);
        assert_eq!(found.value.system, PermitSystem::Api);
        assert_eq!(found.confidence, Confidence::Low);
    }

    #[test]
    fn api_must_be_a_word() {
        let input = DetectorInput::default().with_snippet("Capital improvement permit fees");
        assert_eq!(detect(input).value.system, PermitSystem::Unknown);
    }

    #[test]
    fn keyword_categories_in_order() {
        let portal = DetectorInput::default().with_snippet("Apply online. Monthly permit report attached.");
        assert_eq!(detect(portal).value.system, PermitSystem::PortalScrape);

        let pdf = DetectorInput::default().with_snippet("Download the permit log. Visit our office.");
        assert_eq!(detect(pdf).value.system, PermitSystem::PdfLogs);

        let manual = DetectorInput::default().with_snippet("Applications accepted in person only.");
        assert_eq!(detect(manual).value.system, PermitSystem::ManualOnly);
    }

    #[test]
    fn nothing_matched() {
        let found = detect(DetectorInput::new(vec!["https://www.example.gov/".into()]));
        assert_eq!(found.value, PermitFinding::default());
        assert_eq!(found.signals[0].kind, SignalKind::NoSignals);
    }
}
