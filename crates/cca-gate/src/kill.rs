//! Kill-switch registry
//!
//! Kill conditions are plain data: an id, a stage, a predicate descriptor,
//! a reason and the condition's own next action. A generic matcher walks
//! them top to bottom and returns the first match. Registry order is part
//! of the contract: probe-stage checks come before viability checks, which
//! come before hydration checks.
//!
//! Resolving what to do about a kill is a separate table
//! ([`get_kill_action`]) keyed on stage and reason text.
//!
//! Matching is pure and only traces a kill. The audit entry for a kill is
//! written by the stage gate that asked ([`StageGates`](crate::StageGates)),
//! which knows the county; callers that check the registry directly own
//! their own audit entry.

use cca_model::{AutomationClass, CcaView, PipelineStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default retry count at which the probe stage escalates
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Run-time facts the kill conditions look at besides the CCA record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillContext {
    /// Probe attempts already made for this county
    pub retry_count: u32,
    /// Site geometry could not be resolved automatically
    pub geometry_blocked: bool,
    /// Required constraint fields still unknown
    pub missing_fields: Vec<String>,
}

impl KillContext {
    /// Empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retry count
    #[inline]
    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// With geometry flag
    #[inline]
    #[must_use]
    pub fn with_geometry_blocked(mut self, blocked: bool) -> Self {
        self.geometry_blocked = blocked;
        self
    }

    /// With missing fields
    #[must_use]
    pub fn with_missing_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Remedial action for a kill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Run the capability probe
    TriggerProbe,
    /// Hand to a human
    TriggerHumanEscalation,
    /// Queue for manual research
    RouteToManualQueue,
    /// Stop; nothing automatic applies
    HaltPipeline,
}

impl NextAction {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NextAction::TriggerProbe => "trigger_probe",
            NextAction::TriggerHumanEscalation => "trigger_human_escalation",
            NextAction::RouteToManualQueue => "route_to_manual_queue",
            NextAction::HaltPipeline => "halt_pipeline",
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate descriptor; each is a pure function of (record, context)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillPredicate {
    /// No record on file
    ProfileAbsent,
    /// Record past `expires_at`
    ProfileExpired,
    /// Retry count reached the limit
    RetriesExhausted,
    /// Manual-only county lacking a cited manual verification
    ManualWithoutVerification,
    /// Geometry blocked and required fields missing
    GeometryBlockedWithMissingFields,
}

impl KillPredicate {
    /// Evaluate against a record and context
    #[must_use]
    pub fn matches(
        self,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        max_retries: u32,
        now: DateTime<Utc>,
    ) -> bool {
        match self {
            KillPredicate::ProfileAbsent => profile.is_none(),
            KillPredicate::ProfileExpired => profile.is_some_and(|p| p.is_expired(now)),
            KillPredicate::RetriesExhausted => ctx.retry_count >= max_retries,
            KillPredicate::ManualWithoutVerification => profile.is_some_and(|p| {
                p.automation_class() == Some(AutomationClass::Manual) && !p.is_manually_verified()
            }),
            KillPredicate::GeometryBlockedWithMissingFields => {
                ctx.geometry_blocked && !ctx.missing_fields.is_empty()
            }
        }
    }
}

/// One registered stop condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KillCondition {
    /// Stable id
    pub id: &'static str,
    /// Stage this condition gates
    pub stage: PipelineStage,
    /// When it fires
    pub predicate: KillPredicate,
    /// Human-readable reason
    pub reason: &'static str,
    /// The condition's declared remedy
    pub next_action: NextAction,
}

/// The registered conditions, in evaluation order
pub const KILL_CONDITIONS: &[KillCondition] = &[
    KillCondition {
        id: "K001",
        stage: PipelineStage::Probe,
        predicate: KillPredicate::ProfileAbsent,
        reason: "No capability profile on file",
        next_action: NextAction::TriggerProbe,
    },
    KillCondition {
        id: "K002",
        stage: PipelineStage::Probe,
        predicate: KillPredicate::ProfileExpired,
        reason: "Capability profile expired",
        next_action: NextAction::TriggerProbe,
    },
    KillCondition {
        id: "K003",
        stage: PipelineStage::Probe,
        predicate: KillPredicate::RetriesExhausted,
        reason: "Probe retry limit reached",
        next_action: NextAction::TriggerHumanEscalation,
    },
    KillCondition {
        id: "K101",
        stage: PipelineStage::ViabilityScan,
        predicate: KillPredicate::ManualWithoutVerification,
        reason: "Manual-only county without manual verification",
        next_action: NextAction::RouteToManualQueue,
    },
    KillCondition {
        id: "K201",
        stage: PipelineStage::ConstraintHydration,
        predicate: KillPredicate::GeometryBlockedWithMissingFields,
        reason: "Geometry blocked with required fields missing",
        next_action: NextAction::TriggerHumanEscalation,
    },
];

/// Outcome of a kill-switch check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillResult {
    /// A condition fired
    pub should_kill: bool,
    /// Reason of the firing condition
    pub kill_reason: Option<String>,
    /// Stage of the firing condition
    pub stage: Option<PipelineStage>,
    /// Id of the firing condition
    pub condition_id: Option<String>,
}

impl KillResult {
    /// Nothing fired
    #[must_use]
    pub fn proceed() -> Self {
        Self {
            should_kill: false,
            kill_reason: None,
            stage: None,
            condition_id: None,
        }
    }

    /// Result for a fired condition
    #[must_use]
    pub fn killed(condition: &KillCondition) -> Self {
        Self {
            should_kill: true,
            kill_reason: Some(condition.reason.to_string()),
            stage: Some(condition.stage),
            condition_id: Some(condition.id.to_string()),
        }
    }
}

/// Ordered kill conditions plus the retry limit they check against
#[derive(Debug, Clone)]
pub struct KillSwitchRegistry {
    conditions: Vec<KillCondition>,
    max_retries: u32,
}

impl Default for KillSwitchRegistry {
    fn default() -> Self {
        Self::standard(DEFAULT_MAX_RETRIES)
    }
}

impl KillSwitchRegistry {
    /// The registered conditions with a retry limit
    #[must_use]
    pub fn standard(max_retries: u32) -> Self {
        Self {
            conditions: KILL_CONDITIONS.to_vec(),
            max_retries,
        }
    }

    /// Conditions in evaluation order
    #[must_use]
    pub fn conditions(&self) -> &[KillCondition] {
        &self.conditions
    }

    /// Retry limit
    #[inline]
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// First matching condition across all stages
    #[must_use]
    pub fn check(&self, profile: Option<&dyn CcaView>, ctx: &KillContext, now: DateTime<Utc>) -> KillResult {
        self.first_match(self.conditions.iter(), profile, ctx, now)
    }

    /// First matching condition among one stage's conditions
    #[must_use]
    pub fn check_for_stage(
        &self,
        stage: PipelineStage,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        now: DateTime<Utc>,
    ) -> KillResult {
        self.first_match(
            self.conditions.iter().filter(|c| c.stage == stage),
            profile,
            ctx,
            now,
        )
    }

    fn first_match<'a>(
        &self,
        mut conditions: impl Iterator<Item = &'a KillCondition>,
        profile: Option<&dyn CcaView>,
        ctx: &KillContext,
        now: DateTime<Utc>,
    ) -> KillResult {
        match conditions.find(|c| c.predicate.matches(profile, ctx, self.max_retries, now)) {
            Some(condition) => {
                tracing::info!(
                    condition = condition.id,
                    stage = %condition.stage,
                    reason = condition.reason,
                    "kill switch triggered"
                );
                KillResult::killed(condition)
            }
            None => KillResult::proceed(),
        }
    }
}

/// [`KillSwitchRegistry::check`] on the default registry
///
/// Not audited; gate through [`StageGates`](crate::StageGates) to record
/// the kill.
#[must_use]
pub fn check_kill_switch(profile: Option<&dyn CcaView>, ctx: &KillContext, now: DateTime<Utc>) -> KillResult {
    KillSwitchRegistry::default().check(profile, ctx, now)
}

/// [`KillSwitchRegistry::check_for_stage`] on the default registry
///
/// Not audited, like [`check_kill_switch`].
#[must_use]
pub fn check_kill_switch_for_stage(
    stage: PipelineStage,
    profile: Option<&dyn CcaView>,
    ctx: &KillContext,
    now: DateTime<Utc>,
) -> KillResult {
    KillSwitchRegistry::default().check_for_stage(stage, profile, ctx, now)
}

/// Action resolution rows: stage, reason fragment (`None` matches any), action
const ACTION_TABLE: &[(PipelineStage, Option<&str>, NextAction)] = &[
    (PipelineStage::Probe, Some("retr"), NextAction::TriggerHumanEscalation),
    (PipelineStage::Probe, None, NextAction::TriggerProbe),
    (PipelineStage::ViabilityScan, Some("manual"), NextAction::RouteToManualQueue),
    (PipelineStage::ConstraintHydration, None, NextAction::TriggerHumanEscalation),
];

/// Resolve the remedial action for a kill
///
/// Rows are checked in order; the first row whose stage matches and whose
/// fragment (if any) occurs in the lowercased reason decides. Kills no row
/// covers halt the pipeline. Returns `None` when nothing was killed.
#[must_use]
pub fn get_kill_action(result: &KillResult) -> Option<NextAction> {
    if !result.should_kill {
        return None;
    }
    let stage = result.stage?;
    let reason = result.kill_reason.as_deref().unwrap_or_default().to_lowercase();
    let action = ACTION_TABLE
        .iter()
        .find(|(row_stage, fragment, _)| {
            *row_stage == stage && fragment.map_or(true, |f| reason.contains(f))
        })
        .map_or(NextAction::HaltPipeline, |(_, _, action)| *action);
    Some(action)
}
