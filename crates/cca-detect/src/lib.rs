//! CCA Detect - cheap capability detectors
//!
//! Four independent classifiers that turn URL and snippet signals into a
//! typed value, a confidence and an evidence list:
//!
//! | Detector | Value |
//! |---|---|
//! | [`ZoningDetector`] | [`ZoningModel`](cca_model::ZoningModel) |
//! | [`PermitDetector`] | [`PermitFinding`] |
//! | [`DocumentDetector`] | [`DocumentQuality`](cca_model::DocumentQuality) |
//! | [`InspectionDetector`] | `Option<bool>` |
//!
//! Detectors are pure: no I/O, no network, no external APIs. They see only
//! URLs and a bounded snippet, never a full document.
//!
//! # Example
//!
//! ```rust
//! use cca_detect::{Detector, DetectorInput, ZoningDetector};
//! use cca_model::{Confidence, ZoningModel};
//!
//! let input = DetectorInput::new(Vec::new()).with_snippet("The county has no zoning.");
//! let found = ZoningDetector.detect(&input).unwrap();
//! assert_eq!(found.value, ZoningModel::NoZoning);
//! assert_eq!(found.confidence, Confidence::Medium);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod input;
pub mod inspection;
pub mod permit;
pub mod vendor;
pub mod zoning;

pub use document::DocumentDetector;
pub use error::DetectorError;
pub use input::DetectorInput;
pub use inspection::InspectionDetector;
pub use permit::{PermitDetector, PermitFinding};
pub use vendor::{match_vendor, VendorPattern};
pub use zoning::{ZoningDetector, NO_ZONING_STATES};

use cca_model::{Confidence, DetectorSignal};
use serde::{Deserialize, Serialize};

/// Output of one detector run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection<V> {
    /// Classified value
    pub value: V,
    /// Confidence in the value
    pub confidence: Confidence,
    /// Evidence, in the order it was found
    pub signals: Vec<DetectorSignal>,
}

impl<V> Detection<V> {
    /// Build a detection
    pub fn new(value: V, confidence: Confidence, signals: Vec<DetectorSignal>) -> Self {
        Self {
            value,
            confidence,
            signals,
        }
    }

    /// Degraded result for a failed detector: fallback value, low
    /// confidence, one `error` signal
    pub fn failed(value: V, detector: &str, message: impl Into<String>) -> Self {
        Self {
            value,
            confidence: Confidence::Low,
            signals: vec![DetectorSignal::error(detector, message)],
        }
    }

    /// Whether any `error` signal was recorded
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.signals
            .iter()
            .any(|s| s.kind == cca_model::SignalKind::Error)
    }
}

/// Detector contract
///
/// Implementations must be pure functions of their input. A detector that
/// cannot run returns `Err`; the probe converts that into
/// [`Detection::failed`] with [`Detector::fallback`].
pub trait Detector: Send + Sync {
    /// Classified value type
    type Value: Clone + Send + 'static;

    /// Stable name used in signals and audit entries
    fn name(&self) -> &'static str;

    /// Classify the input
    ///
    /// # Errors
    /// `DetectorError` when the detector cannot evaluate at all.
    fn detect(&self, input: &DetectorInput) -> Result<Detection<Self::Value>, DetectorError>;

    /// Value substituted when detection fails
    fn fallback(&self) -> Self::Value;
}

/// Push the synthetic `no_signals` marker when nothing matched
pub(crate) fn finish_signals(detector: &str, mut signals: Vec<DetectorSignal>) -> Vec<DetectorSignal> {
    if signals.is_empty() {
        signals.push(DetectorSignal::no_signals(detector));
    }
    signals
}
