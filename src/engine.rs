//! Transformation engine.
//!
//! Wires parsers to renderers: resolve formats, parse, optionally
//! validate, render, and report metrics for the whole run. The output
//! renderer is resolved before any parsing happens so an unsupported
//! output format fails without doing work.

use crate::ast::{ensure_valid, Document};
use crate::detect::{sniff_format, InputFormat};
use crate::error::{Error, Result};
use crate::parser::{DocumentParser, DocxParser, HtmlParser, ParseOutcome, ParseReport};
use crate::render::{
    DocumentRenderer, JsonRenderer, MarkdownRenderer, RenderMetadata,
    RenderOptions, TextRenderer,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Engine behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Format assumed when neither a tag nor sniffing resolves the input.
    pub default_format: Option<String>,
    /// Run the parser's cheap validation before parsing.
    pub validate_input: bool,
    /// Run structural validation on the parsed tree.
    pub validate_ast: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_format: None,
            validate_input: true,
            validate_ast: false,
        }
    }
}

impl EngineOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback input format.
    pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = Some(format.into());
        self
    }

    /// Toggle pre-parse input validation.
    pub fn with_input_validation(mut self, validate: bool) -> Self {
        self.validate_input = validate;
        self
    }

    /// Toggle post-parse tree validation.
    pub fn with_ast_validation(mut self, validate: bool) -> Self {
        self.validate_ast = validate;
        self
    }
}

/// Timing and size metrics for one transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformMetrics {
    /// Parse stage time in milliseconds.
    pub parse_ms: u64,
    /// Render stage time in milliseconds.
    pub render_ms: u64,
    /// End-to-end time in milliseconds.
    pub total_ms: u64,
    /// Input size in bytes.
    pub input_bytes: usize,
    /// Output size in bytes.
    pub output_bytes: usize,
    /// Nodes visited during rendering.
    pub node_count: usize,
    /// Warnings collected during parsing.
    pub warnings: usize,
}

/// Result of one transformation.
#[derive(Debug)]
pub struct TransformResult {
    /// Rendered output.
    pub output: String,
    /// The parsed tree, available for further processing.
    pub ast: Document,
    /// Parse warnings and statistics.
    pub report: ParseReport,
    /// Render statistics.
    pub render_metadata: RenderMetadata,
    /// Whole-run metrics.
    pub metrics: TransformMetrics,
}

/// The conversion pipeline: registered parsers and renderers plus
/// resolution policy.
pub struct TransformEngine {
    parsers: HashMap<String, Arc<dyn DocumentParser>>,
    renderers: HashMap<String, Arc<dyn DocumentRenderer>>,
    options: EngineOptions,
}

impl TransformEngine {
    /// An empty engine with no registered formats.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            parsers: HashMap::new(),
            renderers: HashMap::new(),
            options,
        }
    }

    /// An engine with the built-in parsers and renderers registered.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new(EngineOptions::default());
        engine.register_parser(Arc::new(DocxParser::new()));
        engine.register_parser(Arc::new(HtmlParser::new()));
        engine.register_renderer(Arc::new(MarkdownRenderer::new()));
        engine.register_renderer(Arc::new(TextRenderer::new()));
        engine.register_renderer(Arc::new(JsonRenderer::new()));
        engine
    }

    /// Replace the engine options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a parser under its format tag. A second registration for
    /// the same tag replaces the first.
    pub fn register_parser(&mut self, parser: Arc<dyn DocumentParser>) {
        self.parsers
            .insert(parser.supported_format().to_string(), parser);
    }

    /// Register a renderer under its format tag.
    pub fn register_renderer(&mut self, renderer: Arc<dyn DocumentRenderer>) {
        self.renderers
            .insert(renderer.supported_format().to_string(), renderer);
    }

    /// Format tags with a registered parser.
    pub fn input_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Format tags with a registered renderer.
    pub fn output_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Parse input into the canonical tree. `input_format` overrides
    /// content sniffing when given.
    pub fn parse(&self, input: &[u8], input_format: Option<&str>) -> Result<ParseOutcome> {
        let parser = self.resolve_parser(input, input_format)?;
        if self.options.validate_input {
            let outcome = parser.validate(input);
            if !outcome.valid {
                return Err(Error::Validation(
                    outcome
                        .error
                        .unwrap_or_else(|| "input failed validation".to_string()),
                )
                .in_stage("validate"));
            }
        }
        let parsed = parser.parse(input).map_err(|e| e.in_stage("parse"))?;
        if self.options.validate_ast {
            ensure_valid(&parsed.ast).map_err(|e| e.in_stage("validate"))?;
        }
        Ok(parsed)
    }

    /// Full pipeline: parse the input and render it to `output_format`.
    pub fn transform(
        &self,
        input: &[u8],
        input_format: Option<&str>,
        output_format: &str,
        render_options: &RenderOptions,
    ) -> Result<TransformResult> {
        let started = Instant::now();
        let renderer = self.resolve_renderer(output_format)?;

        let parsed = self.parse(input, input_format)?;
        let parse_ms = started.elapsed().as_millis() as u64;

        let render_started = Instant::now();
        let rendered = renderer
            .render(&parsed.ast, render_options)
            .map_err(|e| e.in_stage("render"))?;
        let render_ms = render_started.elapsed().as_millis() as u64;

        let metrics = TransformMetrics {
            parse_ms,
            render_ms,
            total_ms: started.elapsed().as_millis() as u64,
            input_bytes: input.len(),
            output_bytes: rendered.output.len(),
            node_count: rendered.metadata.node_count,
            warnings: parsed.report.warnings.len(),
        };
        log::debug!(
            "transform: {} -> {} bytes in {} ms ({} warnings)",
            metrics.input_bytes,
            metrics.output_bytes,
            metrics.total_ms,
            metrics.warnings
        );

        Ok(TransformResult {
            output: rendered.output,
            ast: parsed.ast,
            report: parsed.report,
            render_metadata: rendered.metadata,
            metrics,
        })
    }

    /// Render an already-parsed tree.
    pub fn render(
        &self,
        doc: &Document,
        output_format: &str,
        render_options: &RenderOptions,
    ) -> Result<String> {
        let renderer = self.resolve_renderer(output_format)?;
        if self.options.validate_ast {
            let outcome = renderer.validate(doc);
            if !outcome.valid {
                return Err(Error::Validation(
                    outcome
                        .error
                        .unwrap_or_else(|| "tree failed validation".to_string()),
                )
                .in_stage("validate"));
            }
        }
        Ok(renderer
            .render(doc, render_options)
            .map_err(|e| e.in_stage("render"))?
            .output)
    }

    fn resolve_parser(
        &self,
        input: &[u8],
        input_format: Option<&str>,
    ) -> Result<&Arc<dyn DocumentParser>> {
        if let Some(tag) = input_format {
            let tag = InputFormat::from_tag(tag)
                .map(|f| f.as_str().to_string())
                .unwrap_or_else(|| tag.to_ascii_lowercase());
            return self.parsers.get(&tag).ok_or_else(|| {
                Error::UnsupportedFormat(format!("no parser registered for {tag}"))
            });
        }
        if let Some(sniffed) = sniff_format(input) {
            if let Some(parser) = self.parsers.get(sniffed.as_str()) {
                return Ok(parser);
            }
        }
        if let Some(fallback) = &self.options.default_format {
            if let Some(parser) = self.parsers.get(fallback) {
                return Ok(parser);
            }
        }
        Err(Error::UnknownFormat)
    }

    fn resolve_renderer(&self, output_format: &str) -> Result<&Arc<dyn DocumentRenderer>> {
        let tag = output_format.to_ascii_lowercase();
        let tag = match tag.as_str() {
            "md" => "markdown".to_string(),
            "txt" => "text".to_string(),
            other => other.to_string(),
        };
        self.renderers.get(&tag).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no renderer registered for {output_format}"))
        })
    }
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_output_fails_before_parsing() {
        let engine = TransformEngine::with_defaults();
        let err = engine
            .transform(b"<p>x</p>", Some("html"), "pdf", &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_html_to_markdown() {
        let engine = TransformEngine::with_defaults();
        let result = engine
            .transform(
                b"<h2>Intro</h2><p>Hello</p>",
                None,
                "markdown",
                &RenderOptions::default(),
            )
            .unwrap();
        assert!(result.output.starts_with("## Intro"));
        assert_eq!(result.metrics.input_bytes, 26);
        assert!(result.metrics.output_bytes > 0);
    }

    #[test]
    fn test_unknown_input_format() {
        let mut engine = TransformEngine::new(EngineOptions::default());
        engine.register_renderer(Arc::new(MarkdownRenderer::new()));
        let err = engine
            .transform(&[0u8, 1, 2], None, "markdown", &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }

    #[test]
    fn test_renderer_alias() {
        let engine = TransformEngine::with_defaults();
        assert!(engine
            .transform(b"<p>x</p>", Some("html"), "md", &RenderOptions::default())
            .is_ok());
    }

    #[test]
    fn test_registered_formats_listed() {
        let engine = TransformEngine::with_defaults();
        assert_eq!(engine.input_formats(), vec!["docx", "html"]);
        assert_eq!(engine.output_formats(), vec!["json", "markdown", "text"]);
    }
}
