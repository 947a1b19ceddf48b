//! Detector input
//!
//! Only URLs and a bounded snippet cross into a detector.

use cca_model::MAX_SNIPPET_CHARS;
use serde::{Deserialize, Serialize};

/// Signals available to every detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorInput {
    /// Candidate or discovered page URLs
    pub urls: Vec<String>,
    /// Links to published documents
    pub document_links: Vec<String>,
    /// Page text, at most [`MAX_SNIPPET_CHARS`] characters
    snippet: Option<String>,
    /// Two-letter state code, upper case
    pub state_code: Option<String>,
}

impl DetectorInput {
    /// Input with page URLs only
    #[must_use]
    pub fn new(urls: Vec<String>) -> Self {
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

    /// With a snippet truncated to [`MAX_SNIPPET_CHARS`]
    #[must_use]
    pub fn with_snippet(self, snippet: impl Into<String>) -> Self {
        self.with_snippet_limit(snippet, MAX_SNIPPET_CHARS)
    }

    /// With a snippet truncated to `limit` characters (never above
    /// [`MAX_SNIPPET_CHARS`])
    #[must_use]
    pub fn with_snippet_limit(mut self, snippet: impl Into<String>, limit: usize) -> Self {
        let limit = limit.min(MAX_SNIPPET_CHARS);
        let snippet: String = snippet.into();
        let bounded = match snippet.char_indices().nth(limit) {
            Some((cut, _)) => snippet[..cut].to_string(),
            None => snippet,
        };
        self.snippet = if bounded.trim().is_empty() {
            None
        } else {
            Some(bounded)
        };
        self
    }

    /// With state code
    #[must_use]
    pub fn with_state(mut self, state_code: impl Into<String>) -> Self {
        self.state_code = Some(state_code.into().to_ascii_uppercase());
        self
    }

    /// The bounded snippet
    #[must_use]
    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    /// Lowercased snippet, empty when absent
    #[must_use]
    pub fn snippet_lower(&self) -> String {
        self.snippet.as_deref().unwrap_or_default().to_lowercase()
    }

    /// Lowercased URLs, document links and snippet joined by newlines
    #[must_use]
    pub fn haystack(&self) -> String {
        let mut parts: Vec<String> = self
            .urls
            .iter()
            .chain(self.document_links.iter())
            .map(|u| u.to_lowercase())
            .collect();
        parts.push(self.snippet_lower());
        parts.join("\n")
    }

    /// All URLs and document links
    pub fn all_links(&self) -> impl Iterator<Item = &str> {
        self.urls
            .iter()
            .chain(self.document_links.iter())
            .map(String::as_str)
    }
}
