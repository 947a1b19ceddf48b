//! Audit events and stored entries
//!
//! Components emit [`AuditEvent`]s. The log turns each one into an
//! immutable [`AuditEntry`] with a sequence number and a hash link to its
//! predecessor.

use cca_model::{Confidence, PipelineStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Who made the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSource {
    /// Pipeline code
    Automated,
    /// A human operator
    Manual,
}

impl AuditSource {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditSource::Automated => "automated",
            AuditSource::Manual => "manual",
        }
    }
}

impl fmt::Display for AuditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decision, as emitted by a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// County key
    pub county_id: String,
    /// Stage the decision belongs to
    pub stage: PipelineStage,
    /// What was checked, e.g. `throttle_check`
    pub action: String,
    /// Outcome, e.g. `allowed`, `killed`, `do_nothing`
    pub result: String,
    /// Ceiling in force when the decision was made
    pub confidence_ceiling: Option<Confidence>,
    /// Decision instant
    pub timestamp: DateTime<Utc>,
    /// Decision maker
    pub source: AuditSource,
    /// Structured context
    pub details: Option<serde_json::Value>,
    /// Error text for recovered failures
    pub error: Option<String>,
}

impl AuditEvent {
    /// Automated event stamped now
    pub fn new(
        county_id: impl Into<String>,
        stage: PipelineStage,
        action: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            county_id: county_id.into(),
            stage,
            action: action.into(),
            result: result.into(),
            confidence_ceiling: None,
            timestamp: Utc::now(),
            source: AuditSource::Automated,
            details: None,
            error: None,
        }
    }

    /// With ceiling
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: Confidence) -> Self {
        self.confidence_ceiling = Some(ceiling);
        self
    }

    /// With structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// With error text
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Mark as a manual decision
    #[must_use]
    pub fn manual(mut self) -> Self {
        self.source = AuditSource::Manual;
        self
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Stored, immutable audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique id
    pub id: Uuid,
    /// Position in the log, from 0
    pub sequence: u64,
    /// The recorded decision
    #[serde(flatten)]
    pub event: AuditEvent,
    /// Hex SHA-256 of the previous entry (zeros for the first)
    pub prev_hash: String,
    /// Hex SHA-256 of this entry
    pub hash: String,
}

/// Hash link of the first entry
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

impl AuditEntry {
    /// Seal an event onto the chain
    #[must_use]
    pub fn seal(event: AuditEvent, sequence: u64, prev_hash: &str) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4(),
            sequence,
            event,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// Recompute this entry's hash from its fields
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let e = &self.event;
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_bytes());
        hasher.update(self.sequence.to_le_bytes());
        for field in [
            e.county_id.as_str(),
            e.stage.as_str(),
            e.action.as_str(),
            e.result.as_str(),
            e.confidence_ceiling.map_or("", Confidence::as_str),
            e.source.as_str(),
            e.error.as_deref().unwrap_or(""),
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0]);
        }
        hasher.update(e.timestamp.to_rfc3339().as_bytes());
        hasher.update([0]);
        if let Some(details) = &e.details {
            hasher.update(details.to_string().as_bytes());
        }
        hasher.update([0]);
        hasher.update(self.prev_hash.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_defaults_to_automated() {
        let event = AuditEvent::new("c-1", PipelineStage::Pass0Throttle, "throttle_check", "allowed");
        assert_eq!(event.source, AuditSource::Automated);
        assert_eq!(event.confidence_ceiling, None);
        assert_eq!(event.clone().manual().source, AuditSource::Manual);
    }

    #[test]
    fn seal_is_verifiable_and_tamper_evident() {
        let event = AuditEvent::new("c-1", PipelineStage::Probe, "probe_complete", "ok")
            .with_ceiling(Confidence::Low)
            .with_details(json!({"automation_class": "manual"}));
        let mut entry = AuditEntry::seal(event, 0, GENESIS_HASH);
        assert_eq!(entry.hash, entry.compute_hash());
        assert_eq!(entry.hash.len(), 64);

        entry.event.result = "tampered".into();
        assert_ne!(entry.hash, entry.compute_hash());
    }

    #[test]
    fn entry_serializes_flat() {
        let event = AuditEvent::new("c-1", PipelineStage::Pass2Routing, "routing_check", "firecrawl");
        let entry = AuditEntry::seal(event, 3, GENESIS_HASH);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["county_id"], "c-1");
        assert_eq!(json["stage"], "pass2_routing");
        assert_eq!(json["source"], "automated");
        assert_eq!(json["sequence"], 3);
    }
}
