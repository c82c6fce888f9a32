//! Renderer contract and output formats.

pub mod json;
pub mod markdown;
pub mod text;

use crate::ast::Document;
use crate::error::Result;
use crate::parser::ValidationOutcome;
use serde::{Deserialize, Serialize};

pub use json::JsonRenderer;
pub use markdown::MarkdownRenderer;
pub use text::TextRenderer;

/// A renderer producing one output format from the canonical tree.
pub trait DocumentRenderer: Send + Sync {
    /// Format tag this renderer produces ("markdown", "text", "json").
    fn supported_format(&self) -> &'static str;

    /// Structural check of the tree before rendering. The default
    /// delegates to the tree validator.
    fn validate(&self, doc: &Document) -> ValidationOutcome {
        match crate::ast::ensure_valid(doc) {
            Ok(()) => ValidationOutcome::ok(),
            Err(err) => ValidationOutcome::invalid(err.to_string()),
        }
    }

    /// Render the document with the given options.
    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<RenderOutcome>;
}

/// Rendering options shared across output formats. Options a format does
/// not understand are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Prepend a generated table of contents.
    pub include_toc: bool,
    /// Bullet character for unordered list items.
    pub list_marker: char,
    /// Headings deeper than this render at this level.
    pub max_heading_level: u8,
    /// Escape characters that carry syntax in the output format.
    pub escape_special_chars: bool,
    /// Render hard breaks as line breaks rather than spaces.
    pub preserve_line_breaks: bool,
    /// Pretty-print JSON output.
    pub json_pretty: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_toc: false,
            list_marker: '-',
            max_heading_level: 6,
            escape_special_chars: false,
            preserve_line_breaks: true,
            json_pretty: false,
        }
    }
}

impl RenderOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a table of contents.
    pub fn with_toc(mut self, include: bool) -> Self {
        self.include_toc = include;
        self
    }

    /// Set the unordered list marker.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Clamp rendered heading depth.
    pub fn with_max_heading_level(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Escape output-format syntax characters in text content.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Pretty-print JSON output.
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.json_pretty = pretty;
        self
    }
}

/// Rendered output together with render statistics.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// The rendered text.
    pub output: String,
    /// Statistics about the render.
    pub metadata: RenderMetadata,
}

/// Statistics from a single render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderMetadata {
    /// Nodes visited.
    pub node_count: usize,
    /// Images emitted.
    pub image_count: usize,
    /// Links emitted.
    pub link_count: usize,
    /// Wall-clock render time in milliseconds.
    pub render_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = RenderOptions::new()
            .with_toc(true)
            .with_list_marker('*')
            .with_max_heading_level(9);
        assert!(options.include_toc);
        assert_eq!(options.list_marker, '*');
        assert_eq!(options.max_heading_level, 6);
    }
}
