//! Inspection-linkage detector
//!
//! Whether inspections are tracked inside the permit system. Any
//! separate-system indicator decides `false` regardless of linked
//! indicators; otherwise two or more linked indicators give `true`/medium,
//! one gives `true`/low, none gives `null`/low.

use crate::error::DetectorError;
use crate::input::DetectorInput;
use crate::{finish_signals, Detection, Detector};
use cca_model::{Confidence, DetectorSignal, SignalKind};

const LINKED_INDICATORS: &[&str] = &[
    "schedule an inspection",
    "schedule inspection",
    "request an inspection",
    "request inspection",
    "inspection results",
    "inspection status",
    "/inspections",
];

const SEPARATE_INDICATORS: &[&str] = &[
    "separate inspection system",
    "inspection hotline",
    "inspections are scheduled by phone",
    "interactive voice response",
    "ivr system",
];

/// Inspection linkage detector
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectionDetector;

impl Detector for InspectionDetector {
    type Value = Option<bool>;

    fn name(&self) -> &'static str {
        "inspection_linkage"
    }

    fn fallback(&self) -> Option<bool> {
        None
    }

    fn detect(&self, input: &DetectorInput) -> Result<Detection<Option<bool>>, DetectorError> {
        let name = self.name();
        let text = input.haystack();

        if let Some(hit) = SEPARATE_INDICATORS.iter().find(|i| text.contains(*i)) {
            let signal = DetectorSignal::new(
                SignalKind::Keyword,
                format!("separate inspection system: '{hit}'"),
                "urls+snippet",
            );
            return Ok(Detection::new(Some(false), Confidence::Low, vec![signal]));
        }

        let signals: Vec<DetectorSignal> = LINKED_INDICATORS
            .iter()
            .filter(|i| text.contains(*i))
            .map(|hit| {
                DetectorSignal::new(
                    SignalKind::Keyword,
                    format!("linked inspection indicator: '{hit}'"),
                    "urls+snippet",
                )
            })
            .collect();

        let detection = match signals.len() {
            0 => Detection::new(None, Confidence::Low, finish_signals(name, signals)),
            1 => Detection::new(Some(true), Confidence::Low, signals),
            _ => Detection::new(Some(true), Confidence::Medium, signals),
        };
        Ok(detection)
    }
}
