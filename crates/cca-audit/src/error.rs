//! Audit errors

/// Audit sink and log failures
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Hash chain broken at an entry
    #[error("audit log integrity violation at sequence {sequence}")]
    IntegrityViolation {
        /// First entry whose link or hash failed to verify
        sequence: u64,
    },

    /// Sink rejected or could not persist an event
    #[error("audit sink unavailable: {0}")]
    SinkUnavailable(String),

    /// JSON encode/decode failure
    #[error("audit serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Export writer failure
    #[error("audit export io error: {0}")]
    Io(#[from] std::io::Error),
}
