//! Compliance verification
//!
//! Checks that every expected stage transition left at least one entry and
//! that no entry lacks a timestamp or a source. Rows can come from this
//! log or from an external JSONL export, where either field may be null.

use crate::entry::{AuditEntry, AuditSource};
use crate::error::AuditError;
use crate::sink::AuditLog;
use cca_model::PipelineStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::BufRead;

/// Loosely typed audit row as found in exported or external logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditRow {
    /// County key
    pub county_id: String,
    /// Stage, when recognized
    pub stage: Option<PipelineStage>,
    /// Action
    pub action: String,
    /// Result
    pub result: String,
    /// Decision instant
    pub timestamp: Option<DateTime<Utc>>,
    /// Decision maker
    pub source: Option<AuditSource>,
}

impl From<&AuditEntry> for AuditRow {
    fn from(entry: &AuditEntry) -> Self {
        let e = &entry.event;
        Self {
            county_id: e.county_id.clone(),
            stage: Some(e.stage),
            action: e.action.clone(),
            result: e.result.clone(),
            timestamp: Some(e.timestamp),
            source: Some(e.source),
        }
    }
}

/// Parse JSON Lines into rows, skipping blank lines
///
/// # Errors
/// `AuditError::Io` on read failure, `AuditError::Serialization` on a
/// malformed line.
pub fn parse_rows<R: BufRead>(reader: R) -> Result<Vec<AuditRow>, AuditError> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

/// Outcome of a compliance check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Rows inspected
    pub total_entries: usize,
    /// Rows with a null timestamp
    pub missing_timestamp: usize,
    /// Rows with a null source
    pub missing_source: usize,
    /// Expected stages that produced no row
    pub stages_without_entries: Vec<PipelineStage>,
    /// Hash chain verified; always true for external rows
    pub integrity_ok: bool,
}

impl ComplianceReport {
    /// True when nothing was flagged
    #[must_use]
    pub fn passed(&self) -> bool {
        self.integrity_ok
            && self.missing_timestamp == 0
            && self.missing_source == 0
            && self.stages_without_entries.is_empty()
    }
}

/// Check rows against the stages that were expected to run
#[must_use]
pub fn verify_rows(rows: &[AuditRow], expected_stages: &[PipelineStage]) -> ComplianceReport {
    let seen: BTreeSet<PipelineStage> = rows.iter().filter_map(|r| r.stage).collect();
    let report = ComplianceReport {
        total_entries: rows.len(),
        missing_timestamp: rows.iter().filter(|r| r.timestamp.is_none()).count(),
        missing_source: rows.iter().filter(|r| r.source.is_none()).count(),
        stages_without_entries: expected_stages
            .iter()
            .copied()
            .filter(|s| !seen.contains(s))
            .collect(),
        integrity_ok: true,
    };
    if !report.passed() {
        tracing::warn!(
            missing_timestamp = report.missing_timestamp,
            missing_source = report.missing_source,
            missing_stages = report.stages_without_entries.len(),
            "audit compliance check flagged rows"
        );
    }
    report
}

impl AuditLog {
    /// Compliance report for one county
    #[must_use]
    pub fn compliance_report(&self, county_id: &str, expected_stages: &[PipelineStage]) -> ComplianceReport {
        let rows: Vec<AuditRow> = self.for_county(county_id).iter().map(AuditRow::from).collect();
        let mut report = verify_rows(&rows, expected_stages);
        report.integrity_ok = self.verify_integrity().is_ok();
        report
    }
}
