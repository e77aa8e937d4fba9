//! Section scoring and document aggregation.
//!
//! A section is one scoring unit of a source — a PDF page, a spreadsheet
//! sheet, or a whole-document blob. Each section runs the same pipeline:
//! ignore-mask, match, sum weights. Sections then roll up into a
//! per-document score whose shape depends on the source kind: paged sources
//! average across all attempted pages (dilution over the whole document),
//! multi-section sources sum.

use serde::Serialize;

use crate::mask::mask;
use crate::matcher::KeywordMatcher;

/// Result for one scored (or failed) section.
///
/// Either `matched_terms`/`score` or `error` is meaningful, never both.
/// Error-only sections keep `score` at 0.
#[derive(Debug, Clone, Serialize)]
pub struct SectionResult {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_terms: Vec<String>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SectionResult {
    /// Construct an error-only section, used when extraction or fetching of
    /// the section's text failed upstream.
    pub fn failed(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            matched_terms: Vec::new(),
            score: 0.0,
            error: Some(error.into()),
        }
    }

    /// True when the section found nothing and carries no error.
    pub fn is_quiet(&self) -> bool {
        self.matched_terms.is_empty() && self.error.is_none()
    }
}

/// How a source's sections aggregate into a document score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Page-split source: the score is averaged over every attempted page,
    /// including pages with no matches.
    Paged { page_count: usize },
    /// Sheet-split or single-blob source: section scores sum.
    MultiSection,
}

/// Aggregated result for one source.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub source_name: String,
    pub sections: Vec<SectionResult>,
    pub document_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_media_date: Option<String>,
}

impl DocumentResult {
    /// Result for a source whose extraction failed entirely.
    pub fn failed(source_name: impl Into<String>, error: impl Into<String>) -> Self {
        let source_name = source_name.into();
        Self {
            sections: vec![SectionResult::failed("document", error)],
            source_name,
            document_score: 0.0,
            social_media_date: None,
        }
    }
}

/// Score one section's text: mask, match, sum weights.
///
/// Masking happens strictly before matching, so ignored spans can never
/// contribute to the score.
pub fn score_section(
    label: impl Into<String>,
    text: &str,
    matcher: &KeywordMatcher,
    ignore_phrases: &[String],
) -> SectionResult {
    let masked = mask(text, ignore_phrases);
    let found = matcher.find(&masked);
    let score = found.iter().map(|t| t.weight).sum();
    SectionResult {
        label: label.into(),
        matched_terms: found.into_iter().map(|t| t.term).collect(),
        score,
        error: None,
    }
}

/// Roll section results into a document result.
///
/// Quiet sections (no matches, no error) are dropped from the output list —
/// they only matter through the paged denominator. Error sections are kept
/// for display but contribute nothing to the score.
pub fn aggregate(
    source_name: impl Into<String>,
    sections: Vec<SectionResult>,
    kind: DocumentKind,
) -> DocumentResult {
    let total: f64 = sections
        .iter()
        .filter(|s| s.error.is_none())
        .map(|s| s.score)
        .sum();

    let document_score = match kind {
        DocumentKind::Paged { page_count } => total / page_count.max(1) as f64,
        DocumentKind::MultiSection => total,
    };

    DocumentResult {
        source_name: source_name.into(),
        sections: sections.into_iter().filter(|s| !s.is_quiet()).collect(),
        document_score: round2(document_score),
        social_media_date: None,
    }
}

/// Round to 2 decimal places, the precision of every reported score.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
