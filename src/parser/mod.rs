//! Parser contract and format parsers.
//!
//! Each source format implements [`DocumentParser`], returning a canonical
//! tree plus a [`ParseReport`] of warnings and feature counts. Parsers are
//! stateless; a single instance can serve concurrent parses.

pub mod docx;
pub mod html;

use crate::ast::Document;
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub use docx::DocxParser;
pub use html::HtmlParser;

/// A format-specific parser producing the canonical tree.
pub trait DocumentParser: Send + Sync {
    /// Format tag this parser accepts ("docx", "html").
    fn supported_format(&self) -> &'static str;

    /// Cheap structural check without a full parse.
    fn validate(&self, input: &[u8]) -> ValidationOutcome;

    /// Parse input bytes into a document and a parse report.
    fn parse(&self, input: &[u8]) -> Result<ParseOutcome>;
}

/// Result of a cheap pre-parse validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Input looks structurally parseable.
    pub valid: bool,
    /// Reason when invalid.
    pub error: Option<String>,
}

impl ValidationOutcome {
    /// A passing outcome.
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    /// A failing outcome with a reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(reason.into()),
        }
    }
}

/// A parsed document together with its report.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The canonical tree.
    pub ast: Document,
    /// Warnings and statistics collected during parsing.
    pub report: ParseReport,
}

/// Statistics and warnings from a single parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Input size in bytes.
    pub byte_size: usize,
    /// Characters of extracted text.
    pub char_count: usize,
    /// Wall-clock parse time in milliseconds.
    pub elapsed_ms: u64,
    /// Recoverable problems, in encounter order.
    pub warnings: Vec<String>,
    /// Per-feature occurrence counts.
    pub features: FeatureCounts,
}

impl ParseReport {
    /// Create a report for an input of the given size.
    pub fn new(byte_size: usize) -> Self {
        Self {
            byte_size,
            ..Self::default()
        }
    }

    /// Record a recoverable problem. Also logged at warn level.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }

    /// True when the parse completed without warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Occurrence counts for notable source features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    /// Paragraphs (headings excluded).
    pub paragraphs: usize,
    /// Headings.
    pub headings: usize,
    /// Tables.
    pub tables: usize,
    /// Lists.
    pub lists: usize,
    /// Images.
    pub images: usize,
    /// Hyperlinks.
    pub hyperlinks: usize,
    /// Math regions.
    pub math: usize,
    /// Footnote references.
    pub footnotes: usize,
    /// Endnote references.
    pub endnotes: usize,
    /// Comment references.
    pub comments: usize,
    /// Bookmarks.
    pub bookmarks: usize,
    /// Tracked revision wrappers encountered.
    pub revisions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_outcome_constructors() {
        assert!(ValidationOutcome::ok().valid);
        let bad = ValidationOutcome::invalid("not a zip");
        assert!(!bad.valid);
        assert_eq!(bad.error.as_deref(), Some("not a zip"));
    }

    #[test]
    fn test_report_collects_warnings_in_order() {
        let mut report = ParseReport::new(10);
        assert!(report.is_clean());
        report.add_warning("first");
        report.add_warning("second");
        assert_eq!(report.warnings, vec!["first", "second"]);
        assert!(!report.is_clean());
    }
}
