//! Page evidence
//!
//! [`PageSource`] is the probe's only I/O seam. Fetching and scraping live
//! behind it; the probe sees discovered URLs, document links and a bounded
//! snippet.

use crate::error::ProbeError;
use crate::urls::DerivedUrls;
use cca_model::CountyIdentity;
use serde::{Deserialize, Serialize};

/// What a page source discovered for one county
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEvidence {
    /// Pages actually found
    pub urls: Vec<String>,
    /// Published document links
    pub document_links: Vec<String>,
    /// Page text; truncated before it reaches a detector
    pub snippet: Option<String>,
}

impl PageEvidence {
    /// Evidence with discovered pages
    #[must_use]
    pub fn with_urls(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::default()
        }
    }

    /// With document links
    #[must_use]
    pub fn with_document_links(mut self, links: Vec<String>) -> Self {
        self.document_links = links;
        self
    }

    /// With page text
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Discovered URLs and document links, in that order
    #[must_use]
    pub fn discovered(&self) -> Vec<String> {
        self.urls
            .iter()
            .chain(self.document_links.iter())
            .cloned()
            .collect()
    }
}

/// Supplier of page evidence
///
/// Errors whose message reads as a timeout or network failure are retried
/// by the probe's retry wrapper; anything else degrades the record.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Gather evidence for `county`, starting from the derived URLs
    async fn fetch(
        &self,
        county: &CountyIdentity,
        derived: &DerivedUrls,
    ) -> Result<PageEvidence, ProbeError>;
}

/// Source that discovers nothing
///
/// Probes run with this source classify from derived URLs alone, which
/// yields a manual, low-ceiling record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPageSource;

#[async_trait::async_trait]
impl PageSource for NoPageSource {
    async fn fetch(
        &self,
        _county: &CountyIdentity,
        _derived: &DerivedUrls,
    ) -> Result<PageEvidence, ProbeError> {
        Ok(PageEvidence::default())
    }
}

/// Source that returns the same evidence for every county
#[derive(Debug, Clone, Default)]
pub struct StaticPageSource {
    evidence: PageEvidence,
}

impl StaticPageSource {
    /// Wrap fixed evidence
    #[must_use]
    pub fn new(evidence: PageEvidence) -> Self {
        Self { evidence }
    }
}

#[async_trait::async_trait]
impl PageSource for StaticPageSource {
    async fn fetch(
        &self,
        _county: &CountyIdentity,
        _derived: &DerivedUrls,
    ) -> Result<PageEvidence, ProbeError> {
        Ok(self.evidence.clone())
    }
}
