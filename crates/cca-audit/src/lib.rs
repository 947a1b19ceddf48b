//! CCA Audit - append-only decision record
//!
//! Every gate, throttle, routing and probe decision is appended here. The
//! log is hash-chained so edits are detectable, can be filtered and
//! summarized, and can be checked for compliance (every expected stage
//! produced an entry; no entry lacks a timestamp or source).
//!
//! # Example
//!
//! ```rust
//! use cca_audit::{AuditEvent, AuditLog, AuditSink};
//! use cca_model::PipelineStage;
//!
//! let log = AuditLog::new();
//! log.emit(AuditEvent::new("48453", PipelineStage::Probe, "gate_check", "proceed"));
//! assert!(log.verify_integrity().is_ok());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compliance;
pub mod entry;
pub mod error;
pub mod query;
pub mod sink;

pub use compliance::{parse_rows, verify_rows, AuditRow, ComplianceReport};
pub use entry::{AuditEntry, AuditEvent, AuditSource, GENESIS_HASH};
pub use error::AuditError;
pub use query::{AuditQuery, AuditSummary};
pub use sink::{verify_chain, AuditLog, AuditSink, NoopAuditSink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
