//! Audit sinks
//!
//! Every deciding component receives an `Arc<dyn AuditSink>` at
//! construction. [`NoopAuditSink`] discards events; [`AuditLog`] keeps an
//! append-only, hash-chained record in memory.

use crate::entry::{AuditEntry, AuditEvent, GENESIS_HASH};
use crate::error::AuditError;
use crate::query::{AuditQuery, AuditSummary};
use parking_lot::Mutex;
use std::io::Write;

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    /// Append one event
    ///
    /// # Errors
    /// `AuditError::SinkUnavailable` when the event could not be stored.
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Append one event; failures are logged, never propagated
    ///
    /// Decision functions use this so that an unavailable sink cannot turn
    /// a decision into an error.
    fn emit(&self, event: AuditEvent) {
        let county = event.county_id.clone();
        let action = event.action.clone();
        if let Err(e) = self.record(event) {
            tracing::error!(county = %county, action = %action, "audit append failed: {}", e);
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// In-memory append-only audit log
///
/// Entries are never updated or removed. Each entry's hash covers its
/// predecessor's, so [`AuditLog::verify_integrity`] detects any edit.
#[derive(Debug, Default)]
pub struct AuditLog {
    inner: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    /// Empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning the sealed entry
    pub fn append(&self, event: AuditEvent) -> AuditEntry {
        let mut guard = self.inner.lock();
        let prev_hash = guard
            .last()
            .map_or_else(|| GENESIS_HASH.to_string(), |e| e.hash.clone());
        let sequence = guard.len() as u64;
        let entry = AuditEntry::seal(event, sequence, &prev_hash);
        tracing::debug!(
            sequence,
            county = %entry.event.county_id,
            stage = %entry.event.stage,
            action = %entry.event.action,
            result = %entry.event.result,
            "audit entry appended"
        );
        guard.push(entry.clone());
        entry
    }

    /// Snapshot of all entries in append order
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().clone()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when nothing has been appended
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Entries matching a query, in append order
    #[must_use]
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        self.inner
            .lock()
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect()
    }

    /// Entries for one county
    #[must_use]
    pub fn for_county(&self, county_id: &str) -> Vec<AuditEntry> {
        self.query(&AuditQuery::new().county(county_id))
    }

    /// Counts by result, ceiling and stage for matching entries
    #[must_use]
    pub fn summarize(&self, query: &AuditQuery) -> AuditSummary {
        AuditSummary::from_entries(self.inner.lock().iter().filter(|e| query.matches(e)))
    }

    /// Walk the hash chain
    ///
    /// # Errors
    /// `AuditError::IntegrityViolation` naming the first bad entry.
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        verify_chain(&self.inner.lock())
    }

    /// Write matching entries as JSON Lines
    ///
    /// # Errors
    /// `AuditError::Serialization` or `AuditError::Io`.
    pub fn export_jsonl<W: Write>(&self, query: &AuditQuery, mut writer: W) -> Result<usize, AuditError> {
        let entries = self.query(query);
        for entry in &entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(entries.len())
    }
}

impl AuditSink for AuditLog {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.append(event);
        Ok(())
    }
}

/// Verify a sequence of entries forms an unbroken chain from genesis
///
/// # Errors
/// `AuditError::IntegrityViolation` naming the first bad entry.
pub fn verify_chain(entries: &[AuditEntry]) -> Result<(), AuditError> {
    let mut prev = GENESIS_HASH.to_string();
    for (index, entry) in entries.iter().enumerate() {
        let in_place = entry.sequence == index as u64;
        if !in_place || entry.prev_hash != prev || entry.hash != entry.compute_hash() {
            return Err(AuditError::IntegrityViolation {
                sequence: entry.sequence,
            });
        }
        prev.clone_from(&entry.hash);
    }
    Ok(())
}
