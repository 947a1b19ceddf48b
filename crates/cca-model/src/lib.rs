//! CCA Model - County Capability Asset core types
//!
//! The leaf crate of the workspace:
//! - Confidence model and ceiling application
//! - Capability classifications (automation class, zoning, permits, documents)
//! - The canonical CCA record and its read-only [`CcaView`]
//! - TTL policies, cited constraints, detector signals
//! - Configuration
//!
//! # Example
//!
//! ```rust
//! use cca_model::{apply_ceiling, Confidence};
//!
//! assert_eq!(apply_ceiling(Confidence::High, Confidence::Medium), Confidence::Medium);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cited;
pub mod classification;
pub mod confidence;
pub mod config;
pub mod county;
pub mod error;
pub mod profile;
pub mod signal;
pub mod stage;
pub mod ttl;

// Re-exports for convenience
pub use cited::{Citation, CitedConstraint};
pub use classification::{
    automation_viable, AutomationClass, DocumentQuality, DoctrineZoning, PermitSystem, ZoningModel,
};
pub use confidence::{apply_ceiling, is_upgrade_attempt, Confidence, ConfidenceCeiling};
pub use config::{CcaConfig, GateConfig, ProbeConfig, MAX_SNIPPET_CHARS};
pub use county::CountyIdentity;
pub use error::{CitationViolation, ConfigError, DoctrineViolation, IdentityError};
pub use profile::{is_absent_or_expired, CapabilityProfile, CcaView, ManualVerification};
pub use signal::{DetectorSignal, SignalKind};
pub use stage::PipelineStage;
pub use ttl::TtlPolicy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with CCA records
    pub use crate::{
        apply_ceiling, AutomationClass, CapabilityProfile, CcaView, Confidence, CountyIdentity,
        DocumentQuality, PermitSystem, PipelineStage, ZoningModel,
    };
}
