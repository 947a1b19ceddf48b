//! Zoning-model detector
//!
//! Indicator search in fixed priority order; the first matching tier
//! decides the value:
//!
//! 1. explicit "no zoning" phrases → `no_zoning` / medium
//! 2. municipal-only phrases → `municipal_only` / medium
//! 3. two or more overlay-district mentions → `overlay_based` / low
//! 4. countywide ordinance phrases → `countywide` / low
//!
//! Membership in [`NO_ZONING_STATES`] is recorded as a hint signal only and
//! never changes the value.

use crate::error::DetectorError;
use crate::input::DetectorInput;
use crate::{finish_signals, Detection, Detector};
use cca_model::{Confidence, DetectorSignal, SignalKind, ZoningModel};

/// States whose counties commonly lack general zoning authority
pub const NO_ZONING_STATES: &[&str] = &["TX"];

const NO_ZONING_PHRASES: &[&str] = &[
    "no zoning",
    "does not have zoning",
    "has not adopted zoning",
    "without zoning",
    "unzoned",
];

const MUNICIPAL_ONLY_PHRASES: &[&str] = &[
    "zoning is administered by the municipalities",
    "zoning within city limits only",
    "incorporated areas only",
    "municipal zoning only",
    "contact your city for zoning",
];

const OVERLAY_PHRASE: &str = "overlay district";

/// Overlay mentions needed for `overlay_based`
pub const OVERLAY_THRESHOLD: usize = 2;

const COUNTYWIDE_PHRASES: &[&str] = &[
    "county zoning ordinance",
    "countywide zoning",
    "unified development code",
    "unified development ordinance",
    "zoning ordinance",
];

/// Zoning structure detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoningDetector;

impl Detector for ZoningDetector {
    type Value = ZoningModel;

    fn name(&self) -> &'static str {
        "zoning_model"
    }

    fn fallback(&self) -> ZoningModel {
        ZoningModel::Unknown
    }

    fn detect(&self, input: &DetectorInput) -> Result<Detection<ZoningModel>, DetectorError> {
        let name = self.name();
        let text = input.haystack();
        let mut signals = Vec::new();

        if let Some(state) = input.state_code.as_deref() {
            if NO_ZONING_STATES.contains(&state) {
                signals.push(DetectorSignal::new(
                    SignalKind::Hint,
                    format!("{state} is a known no-zoning state (prioritization hint only)"),
                    name,
                ));
            }
        }

        if let Some(phrase) = first_phrase(&text, NO_ZONING_PHRASES) {
            signals.push(keyword(phrase));
            return Ok(Detection::new(ZoningModel::NoZoning, Confidence::Medium, signals));
        }

        if let Some(phrase) = first_phrase(&text, MUNICIPAL_ONLY_PHRASES) {
            signals.push(keyword(phrase));
            return Ok(Detection::new(ZoningModel::MunicipalOnly, Confidence::Medium, signals));
        }

        let overlays = text.matches(OVERLAY_PHRASE).count();
        if overlays >= OVERLAY_THRESHOLD {
            signals.push(DetectorSignal::new(
                SignalKind::Keyword,
                format!("{overlays} overlay district mentions"),
                "snippet",
            ));
            return Ok(Detection::new(ZoningModel::OverlayBased, Confidence::Low, signals));
        }

        if let Some(phrase) = first_phrase(&text, COUNTYWIDE_PHRASES) {
            signals.push(keyword(phrase));
            return Ok(Detection::new(ZoningModel::Countywide, Confidence::Low, signals));
        }

        Ok(Detection::new(
            ZoningModel::Unknown,
            Confidence::Low,
            finish_signals(name, signals),
        ))
    }
}

fn first_phrase<'a>(text: &str, phrases: &[&'a str]) -> Option<&'a str> {
    phrases.iter().copied().find(|p| text.contains(p))
}

fn keyword(phrase: &str) -> DetectorSignal {
    DetectorSignal::new(SignalKind::Keyword, format!("matched '{phrase}'"), "snippet")
}
