//! Markdown renderer.
//!
//! Emits CommonMark-flavored output with pipe tables. The first table row
//! always renders as the header row. Footnote and endnote bodies referenced
//! from the text are appended as trailing definition sections; the optional table
//! of contents is generated from the rendered headings in a second pass
//! over the collected entries.

use super::{DocumentRenderer, RenderMetadata, RenderOptions, RenderOutcome};
use crate::ast::{
    inline_text, Block, Document, Inline, ListKind, Mark, NoteContent,
    OrderedMap, TableRow,
};
use crate::error::Result;
use std::time::Instant;

/// Renderer producing Markdown text.
#[derive(Debug, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a renderer instance.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn supported_format(&self) -> &'static str {
        "markdown"
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<RenderOutcome> {
        let started = Instant::now();
        let mut ctx = Context {
            options,
            metadata: RenderMetadata::default(),
            headings: Vec::new(),
            footnotes_used: Vec::new(),
            endnotes_used: Vec::new(),
        };

        let mut body = String::new();
        for section in &doc.sections {
            for block in &section.blocks {
                ctx.render_block(block, &mut body, 0);
            }
        }

        if let Some(notes) = doc.auxiliary.as_ref().and_then(|a| a.footnotes.as_ref()) {
            let used = std::mem::take(&mut ctx.footnotes_used);
            ctx.render_note_section(notes, used, "", &mut body);
        }
        // Endnote ids carry the `en-` prefix to stay disjoint from
        // footnote ids in the shared reference namespace.
        if let Some(notes) = doc.auxiliary.as_ref().and_then(|a| a.endnotes.as_ref()) {
            let used = std::mem::take(&mut ctx.endnotes_used);
            ctx.render_note_section(notes, used, "en-", &mut body);
        }

        let mut output = String::new();
        if ctx.options.include_toc && !ctx.headings.is_empty() {
            ctx.render_toc(&mut output);
        }
        output.push_str(&body);
        let output = normalize_trailing(&output);

        let mut metadata = ctx.metadata;
        metadata.render_time_ms = started.elapsed().as_millis() as u64;
        Ok(RenderOutcome { output, metadata })
    }
}

struct Context<'a> {
    options: &'a RenderOptions,
    metadata: RenderMetadata,
    headings: Vec<(u8, String)>,
    footnotes_used: Vec<String>,
    endnotes_used: Vec<String>,
}

impl Context<'_> {
    fn render_block(&mut self, block: &Block, out: &mut String, indent: usize) {
        self.metadata.node_count += 1;
        match block {
            Block::Paragraph(p) => {
                let text = self.render_inlines(&p.children);
                if !text.trim().is_empty() {
                    push_indented(out, &text, indent);
                    out.push_str("\n\n");
                }
            }
            Block::Heading(h) => {
                let level = h.level.min(self.options.max_heading_level).max(1);
                let text = self.render_inlines(&h.children);
                self.headings.push((level, inline_text(&h.children)));
                out.push_str(&"#".repeat(level as usize));
                out.push(' ');
                out.push_str(&text);
                out.push_str("\n\n");
            }
            Block::List(l) => {
                self.render_list(l, out, indent);
                if indent == 0 {
                    out.push('\n');
                }
            }
            Block::Table(t) => {
                self.render_table(&t.rows, out);
                out.push('\n');
            }
            Block::Figure(f) => {
                if let Some(image) = &f.image {
                    self.metadata.image_count += 1;
                    out.push_str(&format!(
                        "![{}]({})",
                        image.alt.as_deref().unwrap_or(""),
                        image.src
                    ));
                    out.push('\n');
                }
                if let Some(caption) = &f.caption {
                    let text = self.render_inlines(caption);
                    if !text.is_empty() {
                        out.push('*');
                        out.push_str(&text);
                        out.push('*');
                        out.push('\n');
                    }
                }
                out.push('\n');
            }
            Block::CodeBlock(c) => {
                out.push_str("```");
                if let Some(language) = &c.language {
                    out.push_str(language);
                }
                out.push('\n');
                out.push_str(&c.code);
                if !c.code.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("```\n\n");
            }
            Block::Blockquote(q) => {
                let mut inner = String::new();
                for block in &q.blocks {
                    self.render_block(block, &mut inner, 0);
                }
                for line in normalize_trailing(&inner).lines() {
                    if line.is_empty() {
                        out.push_str(">\n");
                    } else {
                        out.push_str("> ");
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                out.push('\n');
            }
            Block::ThematicBreak(_) => out.push_str("---\n\n"),
            Block::Custom(c) => {
                for block in &c.blocks {
                    self.render_block(block, out, indent);
                }
            }
        }
    }

    fn render_list(&mut self, list: &crate::ast::List, out: &mut String, indent: usize) {
        let start = list.start.unwrap_or(1) as usize;
        for (index, item) in list.items.iter().enumerate() {
            self.metadata.node_count += 1;
            let marker = match list.kind {
                ListKind::Ordered => format!("{}. ", start + index),
                ListKind::Unordered => format!("{} ", self.options.list_marker),
                ListKind::Description => String::new(),
            };

            if let Some(term) = &item.term {
                let text = self.render_inlines(term);
                push_indented(out, &format!("**{text}**"), indent);
                out.push('\n');
            }

            let mut first = true;
            for block in &item.blocks {
                match block {
                    Block::List(nested) => {
                        self.render_list(nested, out, indent + 1);
                    }
                    other => {
                        let mut inner = String::new();
                        self.render_block(other, &mut inner, 0);
                        let inner = normalize_trailing(&inner);
                        for (line_index, line) in inner.lines().enumerate() {
                            let prefix = if first && line_index == 0 && !marker.is_empty() {
                                marker.clone()
                            } else if marker.is_empty() {
                                String::new()
                            } else {
                                " ".repeat(marker.len())
                            };
                            push_indented(out, &format!("{prefix}{line}"), indent);
                            out.push('\n');
                        }
                        first = false;
                    }
                }
            }
            if item.blocks.is_empty() && !marker.is_empty() {
                push_indented(out, marker.trim_end(), indent);
                out.push('\n');
            }
        }
    }

    /// Pipe table. The first row is always the header row; cell content
    /// flattens to one line.
    fn render_table(&mut self, rows: &[TableRow], out: &mut String) {
        let Some(first) = rows.first() else {
            return;
        };
        let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        if columns == 0 {
            return;
        }

        let render_row = |ctx: &mut Self, row: &TableRow| -> String {
            let mut line = String::from("|");
            for index in 0..columns {
                line.push(' ');
                let content = row
                    .cells
                    .get(index)
                    .map(|cell| ctx.render_cell(cell))
                    .unwrap_or_default();
                line.push_str(&content);
                line.push_str(" |");
            }
            line
        };

        out.push_str(&render_row(self, first));
        out.push('\n');
        out.push('|');
        for _ in 0..columns {
            out.push_str(" --- |");
        }
        out.push('\n');
        for row in &rows[1..] {
            self.metadata.node_count += 1;
            out.push_str(&render_row(self, row));
            out.push('\n');
        }
    }

    fn render_cell(&mut self, cell: &crate::ast::TableCell) -> String {
        self.metadata.node_count += 1;
        let mut parts = Vec::new();
        for block in &cell.blocks {
            let mut inner = String::new();
            self.render_block(block, &mut inner, 0);
            let flat = normalize_trailing(&inner).replace('\n', " ");
            if !flat.trim().is_empty() {
                parts.push(flat.trim().to_string());
            }
        }
        parts.join(" ").replace('|', "\\|")
    }

    fn render_inlines(&mut self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            self.metadata.node_count += 1;
            match inline {
                Inline::Text(run) => {
                    let marks = run.marks.as_deref().unwrap_or(&[]);
                    if marks.contains(&Mark::Hidden) {
                        continue;
                    }
                    out.push_str(&self.wrap_marks(&run.text, marks));
                }
                Inline::HardBreak(_) => {
                    if self.options.preserve_line_breaks {
                        out.push_str("  \n");
                    } else {
                        out.push(' ');
                    }
                }
                Inline::SoftBreak(_) => out.push(' '),
                Inline::Hyperlink(link) => {
                    self.metadata.link_count += 1;
                    let text = self.render_inlines(&link.children);
                    out.push_str(&format!("[{text}]({})", link.href));
                }
                Inline::Image(image) => {
                    self.metadata.image_count += 1;
                    out.push_str(&format!(
                        "![{}]({})",
                        image.alt.as_deref().unwrap_or(""),
                        image.src
                    ));
                }
                Inline::Math(math) => {
                    out.push('$');
                    out.push_str(&math.source);
                    out.push('$');
                }
                Inline::FootnoteRef(note_ref) => {
                    if !self.footnotes_used.contains(&note_ref.note_id) {
                        self.footnotes_used.push(note_ref.note_id.clone());
                    }
                    out.push_str(&format!("[^{}]", note_ref.note_id));
                }
                Inline::EndnoteRef(note_ref) => {
                    if !self.endnotes_used.contains(&note_ref.note_id) {
                        self.endnotes_used.push(note_ref.note_id.clone());
                    }
                    out.push_str(&format!("[^en-{}]", note_ref.note_id));
                }
                Inline::Bookmark(bookmark) => {
                    out.push_str(&format!("<a id=\"{}\"></a>", bookmark.name));
                }
                Inline::Embed(embed) => {
                    self.metadata.link_count += 1;
                    out.push_str(&format!("[embedded]({})", embed.src));
                }
                Inline::CommentRef(_) | Inline::Custom(_) => {}
            }
        }
        out
    }

    fn wrap_marks(&self, text: &str, marks: &[Mark]) -> String {
        let mut content = if self.options.escape_special_chars && !marks.contains(&Mark::Code) {
            escape_markdown(text)
        } else {
            text.to_string()
        };
        for mark in marks.iter().rev() {
            content = match mark {
                Mark::Bold => format!("**{content}**"),
                Mark::Italic => format!("*{content}*"),
                Mark::Underline => format!("_{content}_"),
                Mark::Strikethrough => format!("~~{content}~~"),
                Mark::Code => format!("`{content}`"),
                Mark::Subscript => format!("<sub>{content}</sub>"),
                Mark::Superscript => format!("<sup>{content}</sup>"),
                Mark::Highlight => format!("=={content}=="),
                // No Markdown rendering; the text stays plain.
                Mark::SmallCaps => content,
                Mark::Hidden => content,
            };
        }
        content
    }

    fn render_note_section(
        &mut self,
        notes: &OrderedMap<NoteContent>,
        used: Vec<String>,
        prefix: &str,
        out: &mut String,
    ) {
        if used.is_empty() {
            return;
        }
        out.push('\n');
        for note_id in used {
            let Some(note) = notes.get(&note_id) else {
                continue;
            };
            let mut body = String::new();
            for block in &note.blocks {
                self.render_block(block, &mut body, 0);
            }
            let body = normalize_trailing(&body).replace('\n', " ");
            out.push_str(&format!("[^{prefix}{note_id}]: {}\n", body.trim()));
        }
        out.push('\n');
    }

    fn render_toc(&self, out: &mut String) {
        out.push_str("## Contents\n\n");
        for (level, text) in &self.headings {
            let indent = "  ".repeat(level.saturating_sub(1) as usize);
            out.push_str(&format!("{indent}- [{text}](#{})\n", slugify(text)));
        }
        out.push('\n');
    }
}

fn push_indented(out: &mut String, text: &str, indent: usize) {
    for (index, line) in text.lines().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&"  ".repeat(indent));
        out.push_str(line);
    }
}

/// Collapse runs of blank lines and trailing whitespace into at most one
/// trailing newline.
fn normalize_trailing(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut blank_run = 0;
    for line in input.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    while out.ends_with('\n') {
        out.pop();
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// GitHub-style anchor slug for a heading.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Escape characters Markdown would otherwise interpret.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '#' | '|') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        AuxiliaryContent, EndnoteRef, FootnoteRef, Heading, Paragraph, Section,
        Table, TableCell, TableRow, TextRun,
    };

    fn render(doc: &Document) -> String {
        MarkdownRenderer::new()
            .render(doc, &RenderOptions::default())
            .unwrap()
            .output
    }

    fn doc_with(blocks: Vec<Block>) -> Document {
        let mut doc = Document::new("test");
        doc.add_section(Section::new(blocks));
        doc
    }

    #[test]
    fn test_heading_and_paragraph() {
        let doc = doc_with(vec![
            Block::Heading(Heading::with_text(2, "Intro")),
            Block::Paragraph(Paragraph::with_text("Body.")),
        ]);
        assert_eq!(render(&doc), "## Intro\n\nBody.\n");
    }

    #[test]
    fn test_marks_nest_in_order() {
        let run = TextRun::with_marks("both", vec![Mark::Bold, Mark::Italic]);
        let doc = doc_with(vec![Block::Paragraph(Paragraph::new(vec![Inline::Text(
            run,
        )]))]);
        assert_eq!(render(&doc), "***both***\n");
    }

    #[test]
    fn test_hidden_text_omitted() {
        let doc = doc_with(vec![Block::Paragraph(Paragraph::new(vec![
            Inline::Text(TextRun::new("shown ")),
            Inline::Text(TextRun::with_marks("secret", vec![Mark::Hidden])),
            Inline::Text(TextRun::new("after")),
        ]))]);
        let output = render(&doc);
        assert!(!output.contains("secret"));
        assert!(output.contains("shown after"));
    }

    #[test]
    fn test_first_table_row_is_header() {
        let doc = doc_with(vec![Block::Table(Table::new(vec![
            TableRow::new(vec![TableCell::with_text("A"), TableCell::with_text("B")]),
            TableRow::new(vec![TableCell::with_text("1"), TableCell::with_text("2")]),
        ]))]);
        let output = render(&doc);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "| A | B |");
        assert_eq!(lines[1], "| --- | --- |");
        assert_eq!(lines[2], "| 1 | 2 |");
    }

    #[test]
    fn test_pipe_in_cell_escaped() {
        let doc = doc_with(vec![Block::Table(Table::new(vec![TableRow::new(vec![
            TableCell::with_text("a|b"),
        ])]))]);
        assert!(render(&doc).contains("a\\|b"));
    }

    #[test]
    fn test_footnote_definitions_appended() {
        let mut doc = doc_with(vec![Block::Paragraph(Paragraph::new(vec![
            Inline::Text(TextRun::new("claim")),
            Inline::FootnoteRef(FootnoteRef::new("1")),
        ]))]);
        let mut notes = OrderedMap::new();
        notes.insert(
            "1".to_string(),
            NoteContent {
                id: crate::ast::fresh_id(),
                blocks: vec![Block::Paragraph(Paragraph::with_text("the source"))],
            },
        );
        doc.auxiliary = Some(AuxiliaryContent {
            footnotes: Some(notes),
            ..Default::default()
        });
        let output = render(&doc);
        assert!(output.contains("claim[^1]"));
        assert!(output.contains("[^1]: the source"));
    }

    #[test]
    fn test_endnote_definitions_appended() {
        let mut doc = doc_with(vec![Block::Paragraph(Paragraph::new(vec![
            Inline::Text(TextRun::new("Claim")),
            Inline::EndnoteRef(EndnoteRef::new("1")),
        ]))]);
        let mut notes = OrderedMap::new();
        notes.insert(
            "1".to_string(),
            NoteContent {
                id: crate::ast::fresh_id(),
                blocks: vec![Block::Paragraph(Paragraph::with_text("closing remark"))],
            },
        );
        doc.auxiliary = Some(AuxiliaryContent {
            endnotes: Some(notes),
            ..Default::default()
        });
        let output = render(&doc);
        assert!(output.contains("Claim[^en-1]"));
        assert!(output.contains("[^en-1]: closing remark"));
    }

    #[test]
    fn test_toc_links_rendered_headings() {
        let doc = doc_with(vec![
            Block::Heading(Heading::with_text(1, "First Part")),
            Block::Heading(Heading::with_text(2, "Sub Part")),
        ]);
        let output = MarkdownRenderer::new()
            .render(&doc, &RenderOptions::default().with_toc(true))
            .unwrap()
            .output;
        assert!(output.starts_with("## Contents"));
        assert!(output.contains("- [First Part](#first-part)"));
        assert!(output.contains("  - [Sub Part](#sub-part)"));
    }

    #[test]
    fn test_escaping_opt_in() {
        let doc = doc_with(vec![Block::Paragraph(Paragraph::with_text("a*b_c"))]);
        assert_eq!(render(&doc), "a*b_c\n");
        let escaped = MarkdownRenderer::new()
            .render(&doc, &RenderOptions::default().with_escaping(true))
            .unwrap()
            .output;
        assert_eq!(escaped, "a\\*b\\_c\n");
    }

    #[test]
    fn test_ordered_list_with_start() {
        let mut list = crate::ast::List::new(
            ListKind::Ordered,
            vec![
                crate::ast::ListItem::new(vec![Block::Paragraph(Paragraph::with_text("one"))]),
                crate::ast::ListItem::new(vec![Block::Paragraph(Paragraph::with_text("two"))]),
            ],
        );
        list.start = Some(3);
        let output = render(&doc_with(vec![Block::List(list)]));
        assert!(output.contains("3. one"));
        assert!(output.contains("4. two"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("First Part"), "first-part");
        assert_eq!(slugify("What? Now!"), "what-now");
    }
}
