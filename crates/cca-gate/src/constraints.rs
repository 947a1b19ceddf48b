//! Constraint sheet for Pass 2 hydration
//!
//! Values land here from whatever route Pass 2 took. Before a sheet is
//! consumed it is sanitized: any value without a citation is forced back
//! to unknown and the violation is audited.

use cca_audit::{AuditEvent, AuditSink};
use cca_model::{CitationViolation, CitedConstraint, Confidence, PipelineStage};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Hydrated zoning constraints for one parcel or county
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSheet {
    /// Maximum building height
    pub max_height_ft: CitedConstraint<f64>,
    /// Minimum setback
    pub min_setback_ft: CitedConstraint<f64>,
    /// Maximum lot coverage
    pub max_lot_coverage_pct: CitedConstraint<f64>,
    /// Self-storage permitted by right
    pub storage_permitted_by_right: CitedConstraint<bool>,
    /// Conditional use permit required
    pub conditional_use_required: CitedConstraint<bool>,
}

impl ConstraintSheet {
    /// Field names in declaration order
    pub const FIELDS: [&'static str; 5] = [
        "max_height_ft",
        "min_setback_ft",
        "max_lot_coverage_pct",
        "storage_permitted_by_right",
        "conditional_use_required",
    ];

    /// Empty sheet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every uncited value and audit the violations
    ///
    /// Emits nothing when the sheet is clean.
    pub fn sanitize(&mut self, county_id: &str, audit: &dyn AuditSink) -> Vec<CitationViolation> {
        let [height, setback, coverage, by_right, conditional] = Self::FIELDS;
        let violations: Vec<CitationViolation> = [
            self.max_height_ft.enforce(height),
            self.min_setback_ft.enforce(setback),
            self.max_lot_coverage_pct.enforce(coverage),
            self.storage_permitted_by_right.enforce(by_right),
            self.conditional_use_required.enforce(conditional),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !violations.is_empty() {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            audit.emit(
                AuditEvent::new(
                    county_id,
                    PipelineStage::ConstraintHydration,
                    "citation_enforcement",
                    "remediated",
                )
                .with_details(json!({ "fields": fields })),
            );
        }
        violations
    }

    /// Names of constraints with no cited value
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        let known = [
            self.max_height_ft.is_known(),
            self.min_setback_ft.is_known(),
            self.max_lot_coverage_pct.is_known(),
            self.storage_permitted_by_right.is_known(),
            self.conditional_use_required.is_known(),
        ];
        Self::FIELDS
            .iter()
            .zip(known)
            .filter(|(_, known)| !known)
            .map(|(name, _)| (*name).to_string())
            .collect()
    }

    /// Clamp every value's confidence to a CCA ceiling
    #[must_use]
    pub fn capped(self, ceiling: Confidence) -> Self {
        Self {
            max_height_ft: self.max_height_ft.capped(ceiling),
            min_setback_ft: self.min_setback_ft.capped(ceiling),
            max_lot_coverage_pct: self.max_lot_coverage_pct.capped(ceiling),
            storage_permitted_by_right: self.storage_permitted_by_right.capped(ceiling),
            conditional_use_required: self.conditional_use_required.capped(ceiling),
        }
    }
}
