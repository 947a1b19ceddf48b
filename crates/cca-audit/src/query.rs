//! Audit queries and summaries

use crate::entry::AuditEntry;
use cca_model::PipelineStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conjunctive filter over audit entries; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuery {
    /// County key
    pub county_id: Option<String>,
    /// Stage
    pub stage: Option<PipelineStage>,
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub to: Option<DateTime<Utc>>,
}

impl AuditQuery {
    /// Match-all query
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one county
    #[must_use]
    pub fn county(mut self, county_id: impl Into<String>) -> Self {
        self.county_id = Some(county_id.into());
        self
    }

    /// Restrict to one stage
    #[must_use]
    pub fn stage(mut self, stage: PipelineStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Restrict to `[from, to]`
    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Whether `entry` satisfies every set filter
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        let e = &entry.event;
        self.county_id.as_deref().map_or(true, |c| e.county_id == c)
            && self.stage.map_or(true, |s| e.stage == s)
            && self.from.map_or(true, |from| e.timestamp >= from)
            && self.to.map_or(true, |to| e.timestamp <= to)
    }
}

/// Entry counts for compliance reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Matching entries
    pub total: usize,
    /// Count per result
    pub by_result: BTreeMap<String, usize>,
    /// Count per ceiling; `unset` when none was recorded
    pub by_ceiling: BTreeMap<String, usize>,
    /// Count per stage
    pub by_stage: BTreeMap<String, usize>,
    /// Entries carrying an error
    pub errors: usize,
}

impl AuditSummary {
    /// Tally entries
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            let e = &entry.event;
            summary.total += 1;
            *summary.by_result.entry(e.result.clone()).or_default() += 1;
            let ceiling = e.confidence_ceiling.map_or("unset", |c| c.as_str());
            *summary.by_ceiling.entry(ceiling.to_string()).or_default() += 1;
            *summary.by_stage.entry(e.stage.as_str().to_string()).or_default() += 1;
            if e.error.is_some() {
                summary.errors += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditEvent;
    use crate::sink::AuditLog;
    use cca_model::Confidence;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn seeded() -> AuditLog {
        let log = AuditLog::new();
        log.append(
            AuditEvent::new("c-1", PipelineStage::Pass0Throttle, "throttle_check", "capped")
                .with_ceiling(Confidence::Low)
                .at(t0()),
        );
        log.append(
            AuditEvent::new("c-1", PipelineStage::Pass2Routing, "routing_check", "firecrawl")
                .with_ceiling(Confidence::Medium)
                .at(t0() + Duration::days(1)),
        );
        log.append(
            AuditEvent::new("c-2", PipelineStage::Pass0Throttle, "throttle_check", "capped")
                .with_error("sink retry")
                .at(t0() + Duration::days(2)),
        );
        log
    }

    #[test]
    fn filter_by_county_stage_and_range() {
        let log = seeded();
        assert_eq!(log.for_county("c-1").len(), 2);
        assert_eq!(
            log.query(&AuditQuery::new().stage(PipelineStage::Pass0Throttle)).len(),
            2
        );
        let window = AuditQuery::new().between(t0() + Duration::hours(1), t0() + Duration::days(2));
        let hits = log.query(&window);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].event.result, "firecrawl");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let log = seeded();
        let exact = AuditQuery::new().between(t0(), t0());
        assert_eq!(log.query(&exact).len(), 1);
    }

    #[test]
    fn summary_counts() {
        let log = seeded();
        let summary = log.summarize(&AuditQuery::new());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_result["capped"], 2);
        assert_eq!(summary.by_result["firecrawl"], 1);
        assert_eq!(summary.by_ceiling["low"], 1);
        assert_eq!(summary.by_ceiling["medium"], 1);
        assert_eq!(summary.by_ceiling["unset"], 1);
        assert_eq!(summary.by_stage["pass0_throttle"], 2);
        assert_eq!(summary.errors, 1);
    }
}
