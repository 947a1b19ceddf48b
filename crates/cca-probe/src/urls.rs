//! Candidate URL derivation
//!
//! Derived URLs are a naming-convention guess, never a verified fetch.
//! They seed the detectors but are not evidence for the automation class.

use cca_model::CountyIdentity;
use serde::{Deserialize, Serialize};

/// Conventional planning and permits URLs for a county
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedUrls {
    /// Planning department guess
    pub planning: String,
    /// Permits office guess
    pub permits: String,
}

impl DerivedUrls {
    /// Both URLs, planning first
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        vec![self.planning.clone(), self.permits.clone()]
    }
}

/// Derive `https://www.{slug}county{state}.gov/{planning,permits}`
///
/// Deterministic: the same identity always yields the same URLs.
#[must_use]
pub fn derive_urls(county: &CountyIdentity) -> DerivedUrls {
    let host = format!(
        "www.{}county{}.gov",
        county.name_slug(),
        county.state_code.to_ascii_lowercase()
    );
    DerivedUrls {
        planning: format!("https://{host}/planning"),
        permits: format!("https://{host}/permits"),
    }
}
