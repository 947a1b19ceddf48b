//! CCA Gate - kill switches, stage gates and pass-consumption contracts
//!
//! Everything in this crate reads CCA records; nothing writes them.
//!
//! - [`KillSwitchRegistry`]: ordered stop conditions, first match wins,
//!   with a separate action table ([`get_kill_action`])
//! - [`StageGates`]: gates for probe, viability scan, constraint hydration
//!   and human escalation
//! - Pass 0 throttle and Pass 2 routing, plain ([`get_pass0_throttle`],
//!   [`get_pass2_routing`]) and audited ([`PassContracts`])
//! - [`ConstraintSheet`]: citation enforcement for hydrated constraints
//!
//! # Example
//!
//! ```rust
//! use cca_gate::{check_kill_switch, get_kill_action, KillContext, NextAction};
//!
//! let result = check_kill_switch(None, &KillContext::new(), chrono::Utc::now());
//! assert!(result.should_kill);
//! assert_eq!(get_kill_action(&result), Some(NextAction::TriggerProbe));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod constraints;
pub mod contracts;
pub mod gates;
pub mod kill;
pub mod pass0;
pub mod pass2;

pub use constraints::ConstraintSheet;
pub use contracts::PassContracts;
pub use gates::{GateResult, StageGates};
pub use kill::{
    check_kill_switch, check_kill_switch_for_stage, get_kill_action, KillCondition, KillContext,
    KillPredicate, KillResult, KillSwitchRegistry, NextAction, DEFAULT_MAX_RETRIES, KILL_CONDITIONS,
};
pub use pass0::{get_pass0_throttle, ThrottleBasis, ThrottleDecision};
pub use pass2::{get_pass2_routing, should_pass2_proceed, DoNothingReason, Route, RoutingDecision};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
