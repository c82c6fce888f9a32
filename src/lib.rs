//! # candoc
//!
//! Converts word-processing packages (DOCX) and HTML into a canonical
//! document tree, then renders the tree to Markdown, plain text, or
//! JSON.
//!
//! The tree is the contract: parsers only produce it, renderers only
//! consume it, and the two sides never see each other's formats. The
//! [`engine::TransformEngine`] wires registered parsers and renderers
//! together and reports metrics for the whole run.
//!
//! ## Quick start
//!
//! ```no_run
//! use candoc::Candoc;
//!
//! # fn main() -> candoc::Result<()> {
//! let markdown = Candoc::new().file_to_markdown("report.docx")?;
//! println!("{markdown}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-level access
//!
//! ```
//! use candoc::{parse_bytes, render::{MarkdownRenderer, DocumentRenderer, RenderOptions}};
//!
//! # fn main() -> candoc::Result<()> {
//! let parsed = parse_bytes(b"<h1>Hi</h1>", Some("html"))?;
//! let outcome = MarkdownRenderer::new().render(&parsed.ast, &RenderOptions::default())?;
//! assert!(outcome.output.starts_with("# Hi"));
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod detect;
pub mod engine;
pub mod error;
pub mod parser;
pub mod render;

pub use ast::Document;
pub use detect::InputFormat;
pub use engine::{EngineOptions, TransformEngine, TransformMetrics, TransformResult};
pub use error::{Error, Result};
pub use parser::{DocumentParser, ParseOutcome, ParseReport};
pub use render::{DocumentRenderer, RenderOptions};

use std::path::Path;

/// Parse bytes into the canonical tree. The format is sniffed from the
/// content unless a tag is given.
pub fn parse_bytes(input: &[u8], format: Option<&str>) -> Result<ParseOutcome> {
    TransformEngine::with_defaults().parse(input, format)
}

/// Parse a file, resolving the format from its extension first and its
/// content second.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParseOutcome> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let format = detect::detect_format_from_path(path).map(|f| f.as_str());
    TransformEngine::with_defaults().parse(&bytes, format)
}

/// Convert bytes straight to Markdown with default options.
pub fn to_markdown(input: &[u8], format: Option<&str>) -> Result<String> {
    Candoc::new().convert(input, format, "markdown")
}

/// Convert bytes straight to plain text with default options.
pub fn to_text(input: &[u8], format: Option<&str>) -> Result<String> {
    Candoc::new().convert(input, format, "text")
}

/// High-level conversion front end over the engine.
///
/// Configure once with the builder methods, then convert as many inputs
/// as needed; the instance is reusable and thread safe.
pub struct Candoc {
    engine: TransformEngine,
    render_options: RenderOptions,
}

impl Candoc {
    /// A converter with the built-in formats and default options.
    pub fn new() -> Self {
        Self {
            engine: TransformEngine::with_defaults(),
            render_options: RenderOptions::default(),
        }
    }

    /// Replace the render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Replace the engine options.
    pub fn with_engine_options(mut self, options: EngineOptions) -> Self {
        self.engine = self.engine.with_options(options);
        self
    }

    /// Convert bytes to the given output format.
    pub fn convert(
        &self,
        input: &[u8],
        input_format: Option<&str>,
        output_format: &str,
    ) -> Result<String> {
        Ok(self
            .engine
            .transform(input, input_format, output_format, &self.render_options)?
            .output)
    }

    /// Convert bytes and keep the full result: output, tree, report, and
    /// metrics.
    pub fn convert_full(
        &self,
        input: &[u8],
        input_format: Option<&str>,
        output_format: &str,
    ) -> Result<TransformResult> {
        self.engine
            .transform(input, input_format, output_format, &self.render_options)
    }

    /// Convert a file to the given output format.
    pub fn convert_file(
        &self,
        path: impl AsRef<Path>,
        output_format: &str,
    ) -> Result<String> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = detect::detect_format_from_path(path).map(|f| f.as_str());
        self.convert(&bytes, format, output_format)
    }

    /// Convert a file to Markdown.
    pub fn file_to_markdown(&self, path: impl AsRef<Path>) -> Result<String> {
        self.convert_file(path, "markdown")
    }

    /// Convert bytes to Markdown.
    pub fn to_markdown(&self, input: &[u8], format: Option<&str>) -> Result<String> {
        self.convert(input, format, "markdown")
    }

    /// Convert bytes to plain text.
    pub fn to_text(&self, input: &[u8], format: Option<&str>) -> Result<String> {
        self.convert(input, format, "text")
    }

    /// Convert bytes to the canonical JSON encoding.
    pub fn to_json(&self, input: &[u8], format: Option<&str>) -> Result<String> {
        self.convert(input, format, "json")
    }

    /// Access the underlying engine.
    pub fn engine_ref(&self) -> &TransformEngine {
        &self.engine
    }

    /// Access the underlying engine mutably, for registering custom
    /// formats.
    pub fn engine_mut(&mut self) -> &mut TransformEngine {
        &mut self.engine
    }
}

impl Default for Candoc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convenience_markdown() {
        let output = to_markdown(b"<h1>Hello</h1>", Some("html")).unwrap();
        assert_eq!(output, "# Hello\n");
    }

    #[test]
    fn test_sniffed_format() {
        let output = to_text(b"<p>plain</p>", None).unwrap();
        assert_eq!(output, "plain\n");
    }

    #[test]
    fn test_builder_options_apply() {
        let converter = Candoc::new()
            .with_render_options(RenderOptions::default().with_list_marker('*'));
        let output = converter
            .to_markdown(b"<ul><li>item</li></ul>", Some("html"))
            .unwrap();
        assert!(output.contains("* item"));
    }
}
