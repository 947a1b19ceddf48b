//! Detector evidence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of evidence a detector recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Phrase found in the content snippet
    Keyword,
    /// URL matched a pattern
    UrlPattern,
    /// Known vendor platform matched
    Vendor,
    /// Document link shape
    DocumentLink,
    /// Prioritization hint that never changes a value by itself
    Hint,
    /// Detector evaluated and found nothing
    NoSignals,
    /// Detector failed; value degraded to unknown
    Error,
}

impl SignalKind {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Keyword => "keyword",
            SignalKind::UrlPattern => "url_pattern",
            SignalKind::Vendor => "vendor",
            SignalKind::DocumentLink => "document_link",
            SignalKind::Hint => "hint",
            SignalKind::NoSignals => "no_signals",
            SignalKind::Error => "error",
        }
    }
}

/// One piece of raw evidence
///
/// Signals accumulate within a single probe run and survive only as the
/// record's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorSignal {
    /// Evidence kind
    #[serde(rename = "type")]
    pub kind: SignalKind,
    /// Human-readable description
    pub description: String,
    /// Where it was observed (URL, "snippet", detector name)
    pub source: String,
}

impl DetectorSignal {
    /// Create a signal
    pub fn new(kind: SignalKind, description: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            source: source.into(),
        }
    }

    /// Synthetic "evaluated, found nothing" marker
    pub fn no_signals(detector: &str) -> Self {
        Self::new(SignalKind::NoSignals, "no indicators matched", detector)
    }

    /// Failure marker carrying the error message
    pub fn error(detector: &str, message: impl Into<String>) -> Self {
        Self::new(SignalKind::Error, message, detector)
    }
}

impl fmt::Display for DetectorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.kind.as_str(), self.description, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_renamed_on_wire() {
        let signal = DetectorSignal::no_signals("zoning");
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "no_signals");
        assert_eq!(json["source"], "zoning");
    }

    #[test]
    fn display_is_note_friendly() {
        let signal = DetectorSignal::error("permit", "boom");
        assert_eq!(signal.to_string(), "[error] boom (permit)");
    }
}
