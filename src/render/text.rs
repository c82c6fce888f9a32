//! Plain-text renderer.
//!
//! Drops all formatting and emits readable text: blocks separated by
//! blank lines, table cells joined by tabs, list items prefixed with
//! their marker.

use super::{DocumentRenderer, RenderMetadata, RenderOptions, RenderOutcome};
use crate::ast::{inline_text, Block, Document, Inline, ListKind};
use crate::error::Result;
use std::time::Instant;

/// Renderer producing plain text.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    /// Create a renderer instance.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for TextRenderer {
    fn supported_format(&self) -> &'static str {
        "text"
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<RenderOutcome> {
        let started = Instant::now();
        let mut metadata = RenderMetadata::default();
        let mut parts = Vec::new();
        for section in &doc.sections {
            for block in &section.blocks {
                let text = render_block(block, options, &mut metadata);
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
        }
        let mut output = parts.join("\n\n");
        if !output.is_empty() {
            output.push('\n');
        }
        metadata.render_time_ms = started.elapsed().as_millis() as u64;
        Ok(RenderOutcome { output, metadata })
    }
}

fn render_block(block: &Block, options: &RenderOptions, metadata: &mut RenderMetadata) -> String {
    metadata.node_count += 1;
    match block {
        Block::Paragraph(p) => render_inlines(&p.children, metadata),
        Block::Heading(h) => render_inlines(&h.children, metadata),
        Block::List(l) => {
            let start = l.start.unwrap_or(1) as usize;
            l.items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let marker = match l.kind {
                        ListKind::Ordered => format!("{}. ", start + index),
                        ListKind::Unordered => format!("{} ", options.list_marker),
                        ListKind::Description => String::new(),
                    };
                    let body = item
                        .blocks
                        .iter()
                        .map(|b| render_block(b, options, metadata))
                        .collect::<Vec<_>>()
                        .join("\n");
                    let term = item
                        .term
                        .as_ref()
                        .map(|t| format!("{}: ", inline_text(t)))
                        .unwrap_or_default();
                    format!("{marker}{term}{body}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Block::Table(t) => t
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| {
                        cell.blocks
                            .iter()
                            .map(|b| render_block(b, options, metadata))
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Figure(f) => {
            if f.image.is_some() {
                metadata.image_count += 1;
            }
            f.caption.as_deref().map(inline_text).unwrap_or_default()
        }
        Block::CodeBlock(c) => c.code.clone(),
        Block::Blockquote(q) => q
            .blocks
            .iter()
            .map(|b| render_block(b, options, metadata))
            .collect::<Vec<_>>()
            .join("\n"),
        Block::ThematicBreak(_) => String::new(),
        Block::Custom(c) => c
            .blocks
            .iter()
            .map(|b| render_block(b, options, metadata))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_inlines(inlines: &[Inline], metadata: &mut RenderMetadata) -> String {
    for inline in inlines {
        match inline {
            Inline::Hyperlink(_) => metadata.link_count += 1,
            Inline::Image(_) => metadata.image_count += 1,
            _ => {}
        }
    }
    inline_text(inlines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Heading, Paragraph, Section, Table, TableCell, TableRow};

    #[test]
    fn test_plain_output() {
        let mut doc = Document::new("test");
        doc.add_section(Section::new(vec![
            Block::Heading(Heading::with_text(1, "Title")),
            Block::Paragraph(Paragraph::with_text("Body text.")),
            Block::Table(Table::new(vec![TableRow::new(vec![
                TableCell::with_text("A"),
                TableCell::with_text("B"),
            ])])),
        ]));
        let outcome = TextRenderer::new()
            .render(&doc, &RenderOptions::default())
            .unwrap();
        assert_eq!(outcome.output, "Title\n\nBody text.\n\nA\tB\n");
    }
}
