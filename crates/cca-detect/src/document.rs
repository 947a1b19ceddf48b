//! Document-quality detector
//!
//! Combines link-shape counts with snippet indicators. The detector cannot
//! tell searchable from scanned PDFs without downloading them, so it never
//! reports `scanned_pdf`.
//!
//! Evaluation order:
//! 1. any known code-library / CMS platform link → `structured_html` / medium
//! 2. HTML-shaped links outnumber PDFs → `structured_html` / medium
//! 3. PDFs outnumber HTML-shaped links → `searchable_pdf` / low
//! 4. snippet indicators (absence, then HTML, then PDF) → low

use crate::error::DetectorError;
use crate::input::DetectorInput;
use crate::{finish_signals, Detection, Detector};
use cca_model::{Confidence, DetectorSignal, DocumentQuality, SignalKind};

const CMS_FRAGMENTS: &[&str] = &[
    "municode",
    "ecode360",
    "amlegal",
    "codepublishing",
    "generalcode",
    "encodeplus",
    "codelibrary",
];

const HTML_PATH_FRAGMENTS: &[&str] = &["/code/", "/codes/", "/ordinance/", "/ordinances/"];

const SNIPPET_INDICATORS: &[(DocumentQuality, &[&str])] = &[
    (
        DocumentQuality::None,
        &["not available online", "no online version", "request a copy from the clerk"],
    ),
    (
        DocumentQuality::StructuredHtml,
        &["code of ordinances", "online code", "html version", "searchable code"],
    ),
    (
        DocumentQuality::SearchablePdf,
        &["download the pdf", "pdf version", "adobe reader"],
    ),
];

const SCANNED_HINTS: &[&str] = &["scanned", "image-only"];

/// Document formatting detector
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDetector;

#[derive(Debug, Default, PartialEq, Eq)]
struct LinkCounts {
    pdf: usize,
    html: usize,
    cms: Option<String>,
}

fn count_links<'a>(links: impl Iterator<Item = &'a str>) -> LinkCounts {
    let mut counts = LinkCounts::default();
    for link in links {
        let lower = link.to_lowercase();
        let path = lower
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        if counts.cms.is_none() {
            if let Some(fragment) = CMS_FRAGMENTS.iter().find(|f| path.contains(*f)) {
                counts.cms = Some((*fragment).to_string());
            }
        }
        if path.ends_with(".pdf") {
            counts.pdf += 1;
        } else if HTML_PATH_FRAGMENTS.iter().any(|f| path.contains(f)) {
            counts.html += 1;
        }
    }
    counts
}

impl Detector for DocumentDetector {
    type Value = DocumentQuality;

    fn name(&self) -> &'static str {
        "document_quality"
    }

    fn fallback(&self) -> DocumentQuality {
        DocumentQuality::Unknown
    }

    fn detect(&self, input: &DetectorInput) -> Result<Detection<DocumentQuality>, DetectorError> {
        let name = self.name();
        let counts = count_links(input.all_links());
        let snippet = input.snippet_lower();
        let mut signals = Vec::new();

        if SCANNED_HINTS.iter().any(|h| snippet.contains(h)) {
            signals.push(DetectorSignal::new(
                SignalKind::Hint,
                "scanned documents mentioned; not confirmable without download",
                "snippet",
            ));
        }

        if counts.pdf > 0 || counts.html > 0 {
            signals.push(DetectorSignal::new(
                SignalKind::DocumentLink,
                format!("{} pdf links, {} html code links", counts.pdf, counts.html),
                "links",
            ));
        }

        if let Some(cms) = counts.cms {
            signals.push(DetectorSignal::new(
                SignalKind::UrlPattern,
                format!("code platform '{cms}'"),
                "links",
            ));
            return Ok(Detection::new(DocumentQuality::StructuredHtml, Confidence::Medium, signals));
        }

        if counts.html > counts.pdf {
            return Ok(Detection::new(DocumentQuality::StructuredHtml, Confidence::Medium, signals));
        }

        if counts.pdf > counts.html {
            return Ok(Detection::new(DocumentQuality::SearchablePdf, Confidence::Low, signals));
        }

        for (quality, indicators) in SNIPPET_INDICATORS {
            if let Some(hit) = indicators.iter().find(|i| snippet.contains(*i)) {
                signals.push(DetectorSignal::new(
                    SignalKind::Keyword,
                    format!("matched '{hit}'"),
                    "snippet",
                ));
                return Ok(Detection::new(*quality, Confidence::Low, signals));
            }
        }

        Ok(Detection::new(
            DocumentQuality::Unknown,
            Confidence::Low,
            finish_signals(name, signals),
        ))
    }
}
