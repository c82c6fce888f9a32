//! HTML parser.
//!
//! Maps a lenient DOM onto the canonical tree. Container elements with no
//! block meaning pass their children through, unknown elements degrade to
//! paragraphs with a warning, and inline formatting elements push marks
//! onto a stack that applies to every text run beneath them.

pub mod dom;

use crate::ast::{
    Block, Blockquote, CodeBlock, CustomInline, Document, Figure, HardBreak,
    Heading, Hyperlink, Image, Inline, List, ListItem, ListKind, Mark,
    OrderedMap, Paragraph, Section, Table, TableCell, TableRow, TextRun,
    ThematicBreak,
};
use crate::detect::is_html_bytes;
use crate::error::Result;
use crate::parser::{DocumentParser, ParseOutcome, ParseReport, ValidationOutcome};
use dom::{parse_html, HtmlElement, HtmlNode};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Instant;

/// Parser for HTML documents and fragments.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a parser instance.
    pub fn new() -> Self {
        Self
    }
}

struct HtmlContext {
    report: ParseReport,
    base_url: Option<String>,
    unknown_tags: HashSet<String>,
}

impl DocumentParser for HtmlParser {
    fn supported_format(&self) -> &'static str {
        "html"
    }

    fn validate(&self, input: &[u8]) -> ValidationOutcome {
        if is_html_bytes(input) {
            ValidationOutcome::ok()
        } else {
            ValidationOutcome::invalid("input does not start with markup")
        }
    }

    fn parse(&self, input: &[u8]) -> Result<ParseOutcome> {
        let started = Instant::now();
        let root = parse_html(input)?;

        let mut ctx = HtmlContext {
            report: ParseReport::new(input.len()),
            base_url: find_base_url(&root),
            unknown_tags: HashSet::new(),
        };

        let content = root
            .children
            .iter()
            .find_map(|n| match n {
                HtmlNode::Element(e) if e.name == "html" => Some(e),
                _ => None,
            })
            .unwrap_or(&root);
        let body_nodes: &[HtmlNode] = match find_child(content, "body") {
            Some(body) => &body.children,
            None => &content.children,
        };

        let mut blocks = convert_blocks(body_nodes, &mut ctx);
        if blocks.is_empty() {
            let text = strip_tags(&String::from_utf8_lossy(input));
            if !text.trim().is_empty() {
                ctx.report.add_warning(
                    "no recognizable structure, content recovered as plain text".to_string(),
                );
                ctx.report.features.paragraphs += 1;
                blocks.push(Block::Paragraph(Paragraph::with_text(
                    collapse_whitespace(&text).trim().to_string(),
                )));
            }
        }

        let mut doc = Document::new("html");
        if let Some(title) = find_child(&root, "title").map(|t| t.text()) {
            let title = title.trim();
            if !title.is_empty() {
                doc.properties = Some(crate::ast::DocumentProperties {
                    title: Some(title.to_string()),
                    ..Default::default()
                });
            }
        }
        doc.add_section(Section::new(blocks));

        let mut report = ctx.report;
        report.char_count = doc.plain_text().chars().count();
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(ParseOutcome { ast: doc, report })
    }
}

fn find_child<'a>(element: &'a HtmlElement, name: &str) -> Option<&'a HtmlElement> {
    for child in &element.children {
        if let HtmlNode::Element(e) = child {
            if e.name == name {
                return Some(e);
            }
            if let Some(found) = find_child(e, name) {
                return Some(found);
            }
        }
    }
    None
}

fn find_base_url(root: &HtmlElement) -> Option<String> {
    find_child(root, "base")
        .and_then(|base| base.attr("href"))
        .map(str::to_string)
}

fn strip_tags(input: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    re.replace_all(input, " ").into_owned()
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Elements whose children are treated as block content in place.
const TRANSPARENT_BLOCKS: &[&str] = &[
    "div", "section", "article", "main", "aside", "header", "footer", "nav",
    "body", "html", "form", "center", "details", "summary",
];

/// Elements skipped entirely.
const SKIPPED: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "base", "noscript",
    "template", "iframe", "object",
];

fn convert_blocks(nodes: &[HtmlNode], ctx: &mut HtmlContext) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<Inline> = Vec::new();

    for node in nodes {
        match node {
            HtmlNode::Text(text) => {
                push_text_inline(text, &[], &mut pending);
            }
            HtmlNode::Element(e) => {
                if SKIPPED.contains(&e.name.as_str()) {
                    continue;
                }
                if let Some(block) = convert_block_element(e, ctx) {
                    flush_pending(&mut pending, &mut blocks, ctx);
                    blocks.push(block);
                } else if TRANSPARENT_BLOCKS.contains(&e.name.as_str()) {
                    flush_pending(&mut pending, &mut blocks, ctx);
                    blocks.extend(convert_blocks(&e.children, ctx));
                } else {
                    // Inline content between blocks collects into an
                    // implicit paragraph.
                    convert_inline_node(node, &[], ctx, &mut pending);
                }
            }
        }
    }
    flush_pending(&mut pending, &mut blocks, ctx);
    blocks
}

fn flush_pending(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>, ctx: &mut HtmlContext) {
    let inlines = merge_adjacent_runs(std::mem::take(pending));
    if inlines_have_content(&inlines) {
        ctx.report.features.paragraphs += 1;
        blocks.push(Block::Paragraph(Paragraph::new(trim_inlines(inlines))));
    }
}

fn inlines_have_content(inlines: &[Inline]) -> bool {
    inlines.iter().any(|inline| match inline {
        Inline::Text(run) => !run.text.trim().is_empty(),
        Inline::HardBreak(_) | Inline::SoftBreak(_) => false,
        _ => true,
    })
}

/// Drop leading and trailing whitespace inside a paragraph's runs.
fn trim_inlines(mut inlines: Vec<Inline>) -> Vec<Inline> {
    if let Some(Inline::Text(run)) = inlines.first_mut() {
        run.text = run.text.trim_start().to_string();
    }
    if let Some(Inline::Text(run)) = inlines.last_mut() {
        run.text = run.text.trim_end().to_string();
    }
    inlines.retain(|inline| match inline {
        Inline::Text(run) => !run.text.is_empty(),
        _ => true,
    });
    inlines
}

fn convert_block_element(e: &HtmlElement, ctx: &mut HtmlContext) -> Option<Block> {
    match e.name.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            ctx.report.features.headings += 1;
            let level: u8 = e.name[1..].parse().unwrap_or(1);
            Some(Block::Heading(Heading::new(
                level,
                paragraph_inlines(&e.children, ctx),
            )))
        }
        "p" => {
            ctx.report.features.paragraphs += 1;
            Some(Block::Paragraph(Paragraph::new(paragraph_inlines(
                &e.children,
                ctx,
            ))))
        }
        "ul" => Some(self::list(e, ListKind::Unordered, ctx)),
        "ol" => Some(self::list(e, ListKind::Ordered, ctx)),
        "dl" => Some(description_list(e, ctx)),
        "table" => {
            ctx.report.features.tables += 1;
            Some(Block::Table(table(e, ctx)))
        }
        "blockquote" => Some(Block::Blockquote(Blockquote::new(convert_blocks(
            &e.children,
            ctx,
        )))),
        "pre" => Some(code_block(e)),
        "figure" => Some(figure(e, ctx)),
        "hr" => Some(Block::ThematicBreak(ThematicBreak::new())),
        _ => None,
    }
}

/// Inline content of a paragraph-like element, whitespace collapsed and
/// adjacent equal-marked runs merged.
fn paragraph_inlines(nodes: &[HtmlNode], ctx: &mut HtmlContext) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for node in nodes {
        convert_inline_node(node, &[], ctx, &mut inlines);
    }
    trim_inlines(merge_adjacent_runs(inlines))
}

fn convert_inline_node(
    node: &HtmlNode,
    marks: &[Mark],
    ctx: &mut HtmlContext,
    out: &mut Vec<Inline>,
) {
    match node {
        HtmlNode::Text(text) => push_text_inline(text, marks, out),
        HtmlNode::Element(e) => convert_inline_element(e, marks, ctx, out),
    }
}

fn push_text_inline(text: &str, marks: &[Mark], out: &mut Vec<Inline>) {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return;
    }
    out.push(Inline::Text(TextRun::with_marks(collapsed, marks.to_vec())));
}

fn convert_inline_element(
    e: &HtmlElement,
    marks: &[Mark],
    ctx: &mut HtmlContext,
    out: &mut Vec<Inline>,
) {
    let added = match e.name.as_str() {
        "strong" | "b" => Some(Mark::Bold),
        "em" | "i" => Some(Mark::Italic),
        "u" | "ins" => Some(Mark::Underline),
        "s" | "del" | "strike" => Some(Mark::Strikethrough),
        "code" | "tt" | "kbd" | "samp" => Some(Mark::Code),
        "sub" => Some(Mark::Subscript),
        "sup" => Some(Mark::Superscript),
        "mark" => Some(Mark::Highlight),
        _ => None,
    };
    if let Some(mark) = added {
        let mut stacked = marks.to_vec();
        // The stack is positional; a repeated element repeats the mark
        // and run construction dedupes nothing here.
        stacked.push(mark);
        for child in &e.children {
            convert_inline_node(child, &stacked, ctx, out);
        }
        return;
    }

    match e.name.as_str() {
        "a" => {
            let mut children = Vec::new();
            for child in &e.children {
                convert_inline_node(child, marks, ctx, &mut children);
            }
            let children = merge_adjacent_runs(children);
            match e.attr("href") {
                Some(href) if !href.is_empty() => {
                    ctx.report.features.hyperlinks += 1;
                    if let Some(fragment) = href.strip_prefix('#') {
                        out.push(Inline::Hyperlink(Hyperlink::to_anchor(fragment, children)));
                    } else {
                        out.push(Inline::Hyperlink(Hyperlink::new(
                            join_url(ctx.base_url.as_deref(), href),
                            children,
                        )));
                    }
                }
                _ => out.extend(children),
            }
        }
        "img" => {
            if let Some(image) = image_from(e) {
                ctx.report.features.images += 1;
                out.push(Inline::Image(image));
            }
        }
        "br" => out.push(Inline::HardBreak(HardBreak::new())),
        "span" => {
            let data: Vec<(String, serde_json::Value)> = e
                .attrs
                .iter()
                .filter(|(k, _)| k.starts_with("data-"))
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            if data.is_empty() {
                for child in &e.children {
                    convert_inline_node(child, marks, ctx, out);
                }
            } else {
                let mut map = OrderedMap::new();
                for (k, v) in data {
                    map.insert(k, v);
                }
                if !e.text().trim().is_empty() {
                    map.insert(
                        "text".to_string(),
                        serde_json::Value::String(e.text()),
                    );
                }
                out.push(Inline::Custom(CustomInline::new("annotated_span", map)));
            }
        }
        name if SKIPPED.contains(&name) => {}
        _ => {
            if ctx.unknown_tags.insert(e.name.clone()) {
                ctx.report
                    .add_warning(format!("unknown element <{}> flattened to text", e.name));
            }
            for child in &e.children {
                convert_inline_node(child, marks, ctx, out);
            }
        }
    }
}

fn join_url(base: Option<&str>, href: &str) -> String {
    let Some(base) = base else {
        return href.to_string();
    };
    if href.contains("://") || href.starts_with("//") || href.starts_with("mailto:") {
        return href.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

fn image_from(e: &HtmlElement) -> Option<Image> {
    let src = e.attr("src")?;
    if src.is_empty() {
        return None;
    }
    let mut image = Image::new(src);
    image.alt = e.attr("alt").filter(|a| !a.is_empty()).map(str::to_string);
    image.width = e.attr("width").and_then(|w| w.parse().ok());
    image.height = e.attr("height").and_then(|h| h.parse().ok());
    Some(image)
}

fn list(e: &HtmlElement, kind: ListKind, ctx: &mut HtmlContext) -> Block {
    ctx.report.features.lists += 1;
    let mut items = Vec::new();
    for child in &e.children {
        if let HtmlNode::Element(li) = child {
            if li.name == "li" {
                items.push(ListItem::new(item_blocks(&li.children, ctx)));
            }
        }
    }
    let mut list = List::new(kind, items);
    if kind == ListKind::Ordered {
        list.start = e.attr("start").and_then(|s| s.parse().ok());
    }
    Block::List(list)
}

fn description_list(e: &HtmlElement, ctx: &mut HtmlContext) -> Block {
    ctx.report.features.lists += 1;
    let mut items: Vec<ListItem> = Vec::new();
    for child in &e.children {
        let HtmlNode::Element(el) = child else {
            continue;
        };
        match el.name.as_str() {
            "dt" => {
                let mut item = ListItem::new(Vec::new());
                item.term = Some(paragraph_inlines(&el.children, ctx));
                items.push(item);
            }
            "dd" => {
                let blocks = item_blocks(&el.children, ctx);
                match items.last_mut() {
                    Some(item) => item.blocks.extend(blocks),
                    None => items.push(ListItem::new(blocks)),
                }
            }
            _ => {}
        }
    }
    Block::List(List::new(ListKind::Description, items))
}

/// List-item content: block children convert directly, bare inline
/// content wraps in one paragraph.
fn item_blocks(nodes: &[HtmlNode], ctx: &mut HtmlContext) -> Vec<Block> {
    let has_block_child = nodes.iter().any(|n| {
        matches!(n, HtmlNode::Element(e)
            if TRANSPARENT_BLOCKS.contains(&e.name.as_str())
                || matches!(e.name.as_str(),
                    "p" | "ul" | "ol" | "dl" | "table" | "blockquote" | "pre"
                    | "figure" | "hr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
    });
    if has_block_child {
        convert_blocks(nodes, ctx)
    } else {
        let inlines = paragraph_inlines(nodes, ctx);
        if inlines.is_empty() {
            Vec::new()
        } else {
            vec![Block::Paragraph(Paragraph::new(inlines))]
        }
    }
}

fn table(e: &HtmlElement, ctx: &mut HtmlContext) -> Table {
    let mut rows = Vec::new();
    collect_rows(e, ctx, &mut rows, false);
    Table::new(rows)
}

fn collect_rows(
    e: &HtmlElement,
    ctx: &mut HtmlContext,
    rows: &mut Vec<TableRow>,
    in_head: bool,
) {
    for child in &e.children {
        let HtmlNode::Element(el) = child else {
            continue;
        };
        match el.name.as_str() {
            "thead" => collect_rows(el, ctx, rows, true),
            "tbody" | "tfoot" => collect_rows(el, ctx, rows, false),
            "tr" => rows.push(table_row(el, ctx, in_head)),
            _ => {}
        }
    }
}

fn table_row(tr: &HtmlElement, ctx: &mut HtmlContext, in_head: bool) -> TableRow {
    let mut cells = Vec::new();
    let mut all_header = true;
    for child in &tr.children {
        let HtmlNode::Element(el) = child else {
            continue;
        };
        if el.name != "td" && el.name != "th" {
            continue;
        }
        all_header &= el.name == "th";
        let mut cell = TableCell::new(item_blocks(&el.children, ctx));
        cell.colspan = el.attr("colspan").and_then(|v| v.parse().ok()).filter(|v| *v > 1);
        cell.rowspan = el.attr("rowspan").and_then(|v| v.parse().ok()).filter(|v| *v > 1);
        cells.push(cell);
    }
    let header = in_head || (all_header && !cells.is_empty());
    let mut row = TableRow::new(cells);
    row.header = header;
    row
}

fn code_block(pre: &HtmlElement) -> Block {
    // <pre><code class="language-..."> carries the language hint.
    let code_el = pre.children.iter().find_map(|n| match n {
        HtmlNode::Element(e) if e.name == "code" => Some(e),
        _ => None,
    });
    let (source, language) = match code_el {
        Some(code) => {
            let language = code
                .classes()
                .iter()
                .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
                .map(str::to_string);
            (code.text(), language)
        }
        None => (pre.text(), None),
    };
    // Preformatted text keeps its whitespace; only a leading newline from
    // the markup layout is dropped.
    let source = source.strip_prefix('\n').unwrap_or(&source).to_string();
    let source = source.trim_end_matches('\n').to_string();
    Block::CodeBlock(CodeBlock::new(source, language))
}

fn figure(e: &HtmlElement, ctx: &mut HtmlContext) -> Block {
    let mut image = None;
    let mut caption = None;
    for child in &e.children {
        let HtmlNode::Element(el) = child else {
            continue;
        };
        match el.name.as_str() {
            "img" => {
                if image.is_none() {
                    image = image_from(el);
                    if image.is_some() {
                        ctx.report.features.images += 1;
                    }
                }
            }
            "figcaption" => caption = Some(paragraph_inlines(&el.children, ctx)),
            _ => {}
        }
    }
    Block::Figure(Figure::new(image, caption))
}

/// Merge adjacent text runs whose mark lists are equal element for
/// element. Non-text inlines break a run.
fn merge_adjacent_runs(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        if let Inline::Text(run) = &inline {
            if let Some(Inline::Text(prev)) = out.last_mut() {
                if prev.marks == run.marks {
                    prev.text.push_str(&run.text);
                    continue;
                }
            }
        }
        out.push(inline);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Document {
        HtmlParser::new().parse(html.as_bytes()).unwrap().ast
    }

    fn blocks(html: &str) -> Vec<Block> {
        parse(html).sections.remove(0).blocks
    }

    #[test]
    fn test_marked_runs() {
        let blocks = blocks("<p>Hello <strong>World</strong></p>");
        let Block::Paragraph(p) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.children.len(), 2);
        let Inline::Text(first) = &p.children[0] else {
            panic!();
        };
        assert_eq!(first.text, "Hello ");
        assert_eq!(first.marks, None);
        let Inline::Text(second) = &p.children[1] else {
            panic!();
        };
        assert_eq!(second.text, "World");
        assert!(second.has_mark(Mark::Bold));
    }

    #[test]
    fn test_adjacent_equal_runs_merge() {
        let blocks = blocks("<p><b>one</b><strong> two</strong></p>");
        let Block::Paragraph(p) = &blocks[0] else {
            panic!();
        };
        assert_eq!(p.children.len(), 1);
        let Inline::Text(run) = &p.children[0] else {
            panic!();
        };
        assert_eq!(run.text, "one two");
    }

    #[test]
    fn test_nested_list() {
        let blocks = blocks("<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>");
        let Block::List(list) = &blocks[0] else {
            panic!();
        };
        assert_eq!(list.kind, ListKind::Unordered);
        assert_eq!(list.items.len(), 2);
        assert!(list.items[0]
            .blocks
            .iter()
            .any(|b| matches!(b, Block::List(_))));
    }

    #[test]
    fn test_table_header_from_th() {
        let blocks =
            blocks("<table><tr><th>H</th></tr><tr><td>d</td></tr></table>");
        let Block::Table(table) = &blocks[0] else {
            panic!();
        };
        assert!(table.rows[0].header);
        assert!(!table.rows[1].header);
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        let blocks = blocks("<pre><code class=\"language-rust\">fn main() {\n    body\n}</code></pre>");
        let Block::CodeBlock(code) = &blocks[0] else {
            panic!();
        };
        assert_eq!(code.language.as_deref(), Some("rust"));
        assert!(code.code.contains("    body"));
    }

    #[test]
    fn test_anchor_link() {
        let blocks = blocks("<p><a href=\"#intro\">go</a></p>");
        let Block::Paragraph(p) = &blocks[0] else {
            panic!();
        };
        let Inline::Hyperlink(link) = &p.children[0] else {
            panic!();
        };
        assert_eq!(link.href, "#intro");
        assert_eq!(link.anchor.as_deref(), Some("intro"));
    }

    #[test]
    fn test_base_url_join() {
        let html = "<head><base href=\"https://example.com/docs/\"></head><body><p><a href=\"page.html\">p</a></p></body>";
        let blocks = blocks(html);
        let Block::Paragraph(p) = &blocks[0] else {
            panic!();
        };
        let Inline::Hyperlink(link) = &p.children[0] else {
            panic!();
        };
        assert_eq!(link.href, "https://example.com/docs/page.html");
    }

    #[test]
    fn test_unknown_element_degrades_with_warning() {
        let outcome = HtmlParser::new()
            .parse(b"<p><blink>old</blink></p>")
            .unwrap();
        assert_eq!(outcome.ast.plain_text(), "old");
        assert_eq!(outcome.report.warnings.len(), 1);
    }

    #[test]
    fn test_loose_inline_content_becomes_paragraph() {
        let blocks = blocks("just text, no tags around it");
        assert!(matches!(&blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn test_script_and_style_skipped() {
        let doc = parse("<body><script>alert(1)</script><p>kept</p><style>p{}</style></body>");
        assert_eq!(doc.plain_text(), "kept");
    }
}
