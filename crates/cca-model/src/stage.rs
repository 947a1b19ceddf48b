//! Pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage at which a decision was made
///
/// The first four are the gated pipeline stages in execution order; the
/// pass stages are the read-only consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Stage 1: capability probe
    Probe,
    /// Stage 2: viability scan
    ViabilityScan,
    /// Stage 3: constraint hydration
    ConstraintHydration,
    /// Stage 4: human escalation
    HumanEscalation,
    /// Pass 0 throttle check
    Pass0Throttle,
    /// Pass 2 routing decision
    Pass2Routing,
}

impl PipelineStage {
    /// Gated stages in execution order
    pub const GATED: [PipelineStage; 4] = [
        PipelineStage::Probe,
        PipelineStage::ViabilityScan,
        PipelineStage::ConstraintHydration,
        PipelineStage::HumanEscalation,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Probe => "probe",
            PipelineStage::ViabilityScan => "viability_scan",
            PipelineStage::ConstraintHydration => "constraint_hydration",
            PipelineStage::HumanEscalation => "human_escalation",
            PipelineStage::Pass0Throttle => "pass0_throttle",
            PipelineStage::Pass2Routing => "pass2_routing",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PipelineStage::Probe,
            PipelineStage::ViabilityScan,
            PipelineStage::ConstraintHydration,
            PipelineStage::HumanEscalation,
            PipelineStage::Pass0Throttle,
            PipelineStage::Pass2Routing,
        ]
        .into_iter()
        .find(|stage| stage.as_str() == s.trim())
        .ok_or_else(|| format!("unknown pipeline stage: '{s}'"))
    }
}
