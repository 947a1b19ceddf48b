//! Detector errors

/// A detector could not evaluate its input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectorError {
    /// A pattern table failed to compile
    #[error("pattern table '{table}' failed to compile: {message}")]
    PatternTable {
        /// Table name
        table: &'static str,
        /// Compiler message
        message: String,
    },

    /// Input rejected by the detector
    #[error("invalid detector input: {0}")]
    InvalidInput(String),

    /// Detector panicked; captured by the probe
    #[error("detector '{detector}' panicked: {message}")]
    Panicked {
        /// Detector name
        detector: &'static str,
        /// Panic payload, when it was a string
        message: String,
    },
}
