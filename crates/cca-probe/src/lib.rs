//! CCA Probe - the single writer of County Capability Asset records
//!
//! - [`CapabilityProbe`]: derive URLs, gather evidence, run detectors,
//!   aggregate, classify, stamp TTL, validate
//! - Retry wrapper with linear backoff on transient failures
//! - Two published shapes: [`CapabilityProbeOutput`] and
//!   [`DoctrineCcaRecord`]
//! - [`CcaRegistry`]: per-county store with single-flight probing and the
//!   cited manual verification path
//!
//! # Example
//!
//! ```rust,no_run
//! use cca_audit::NoopAuditSink;
//! use cca_model::ProbeConfig;
//! use cca_probe::CapabilityProbe;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), cca_model::IdentityError> {
//! let probe = CapabilityProbe::new(ProbeConfig::default(), Arc::new(NoopAuditSink));
//! let profile = probe.run_probe_with_retry("c-1", "48453", "Travis County", "TX").await?;
//! println!("{}", profile.automation_class);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod aggregate;
pub mod doctrine;
pub mod error;
pub mod output;
pub mod probe;
pub mod registry;
pub mod should_probe;
pub mod source;
pub mod urls;
pub mod validation;

pub use aggregate::aggregate_confidence;
pub use doctrine::{classify_automation, doctrine_ceiling, AutomationClassification};
pub use error::{ProbeError, RegistryError};
pub use output::{CapabilityProbeOutput, DoctrineCcaRecord, OutputShape};
pub use probe::{run_detector, CapabilityProbe, DetectorRun};
pub use registry::CcaRegistry;
pub use should_probe::{should_probe_county, ProbeReason};
pub use source::{NoPageSource, PageEvidence, PageSource, StaticPageSource};
pub use urls::{derive_urls, DerivedUrls};
pub use validation::validate_profile;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
