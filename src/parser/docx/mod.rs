//! Word-processing package parser.
//!
//! The main document part drives the parse; styles, numbering, document
//! properties, and note parts enrich the result when present and degrade
//! to warnings when they cannot be read. Only a corrupt container or
//! malformed main document part fails the parse.

mod drawing;
mod math;
pub mod package;
mod paragraph;
mod table;
pub mod units;
pub mod xml;

use crate::ast::{
    AuxiliaryContent, Block, CommentContent, Document, DocumentProperties,
    HeaderFooter, Heading, List, ListItem, ListKind, NoteContent, NumberingDefinition,
    NumberingLevel, OrderedMap, PageSetup, Paragraph, Resource, Section,
    StyleDefinition,
};
use crate::detect::is_docx_bytes;
use crate::error::Result;
use crate::parser::{DocumentParser, ParseOutcome, ParseReport, ValidationOutcome};
use package::Package;
use paragraph::{parse_paragraph, NumberingRef, ParsedParagraph};
use regex::Regex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;
use std::time::Instant;
use units::twips_to_points;
use xml::XmlElement;

fn heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^heading\s*([1-9])$").unwrap())
}

/// Shared state for one parse.
pub(crate) struct DocxContext<'a> {
    pub package: &'a Package,
    pub heading_levels: HashMap<String, u8>,
    pub list_kinds: HashMap<u32, ListKind>,
    pub report: ParseReport,
    pub resources: Vec<Resource>,
}

/// Parser for OOXML word-processing packages.
#[derive(Debug, Default)]
pub struct DocxParser;

impl DocxParser {
    /// Create a parser instance.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for DocxParser {
    fn supported_format(&self) -> &'static str {
        "docx"
    }

    fn validate(&self, input: &[u8]) -> ValidationOutcome {
        if !is_docx_bytes(input) {
            return ValidationOutcome::invalid("input is not a zip archive");
        }
        match zip::ZipArchive::new(Cursor::new(input)) {
            Ok(archive) => {
                if archive
                    .file_names()
                    .any(|name| name == package::DOCUMENT_PART)
                {
                    ValidationOutcome::ok()
                } else {
                    ValidationOutcome::invalid(format!(
                        "archive has no {} part",
                        package::DOCUMENT_PART
                    ))
                }
            }
            Err(e) => ValidationOutcome::invalid(format!("unreadable archive: {e}")),
        }
    }

    fn parse(&self, input: &[u8]) -> Result<ParseOutcome> {
        let started = Instant::now();
        let package = Package::open(input)?;
        let document_xml = package.document()?;

        let mut ctx = DocxContext {
            package: &package,
            heading_levels: HashMap::new(),
            list_kinds: HashMap::new(),
            report: ParseReport::new(input.len()),
            resources: Vec::new(),
        };

        let mut doc = Document::new("docx");
        doc.styles = parse_styles(&mut ctx);
        doc.numbering = parse_numbering(&mut ctx);

        if let Some(body) = document_xml.child("body") {
            let mut page_setup = None;
            let blocks = parse_body(body, &mut ctx, &mut page_setup);
            doc.add_section(Section::new(blocks));
            if page_setup.is_some() || has_core_properties(&package) {
                let mut properties = core_properties(&package).unwrap_or_default();
                properties.page_setup = page_setup;
                doc.properties = Some(properties);
            }
        } else {
            ctx.report
                .add_warning("document part has no body element".to_string());
            doc.add_section(Section::new(Vec::new()));
        }

        let auxiliary = parse_auxiliary(&mut ctx);
        if !auxiliary.is_empty() {
            doc.auxiliary = Some(auxiliary);
        }

        for resource in ctx.resources {
            doc.add_resource(resource);
        }

        let mut report = ctx.report;
        report.char_count = doc.plain_text().chars().count();
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        log::debug!(
            "parsed docx: {} bytes, {} paragraphs, {} warnings",
            report.byte_size,
            report.features.paragraphs,
            report.warnings.len()
        );
        Ok(ParseOutcome { ast: doc, report })
    }
}

/// Classify a parsed paragraph as a heading or plain paragraph.
pub(crate) fn classify_paragraph(parsed: ParsedParagraph, ctx: &mut DocxContext<'_>) -> Block {
    if let Some(level) = heading_level(parsed.style_id.as_deref(), &ctx.heading_levels) {
        ctx.report.features.headings += 1;
        let mut heading = Heading::new(level, parsed.inlines);
        heading.props = parsed.props;
        return Block::Heading(heading);
    }
    ctx.report.features.paragraphs += 1;
    let mut para = Paragraph::new(parsed.inlines);
    para.props = parsed.props;
    Block::Paragraph(para)
}

fn heading_level(style_id: Option<&str>, levels: &HashMap<String, u8>) -> Option<u8> {
    let style_id = style_id?;
    if let Some(level) = levels.get(style_id) {
        return Some(*level);
    }
    // Styles part missing or style undeclared; the id itself may still
    // carry the level.
    heading_pattern()
        .captures(style_id)
        .and_then(|c| c[1].parse::<u8>().ok())
        .map(|l| l.min(6))
}

fn parse_body(
    body: &XmlElement,
    ctx: &mut DocxContext<'_>,
    page_setup: &mut Option<PageSetup>,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending_list: Vec<(NumberingRef, Paragraph)> = Vec::new();

    for child in body.child_elements() {
        match child.name.as_str() {
            "p" => {
                let parsed = parse_paragraph(child, ctx);
                match parsed.numbering {
                    Some(numbering) if parsed.style_id.as_deref().map_or(true, |s| {
                        heading_level(Some(s), &ctx.heading_levels).is_none()
                    }) =>
                    {
                        let mut para = Paragraph::new(parsed.inlines);
                        para.props = parsed.props;
                        pending_list.push((numbering, para));
                    }
                    _ => {
                        flush_list(&mut pending_list, ctx, &mut blocks);
                        blocks.push(classify_paragraph(parsed, ctx));
                    }
                }
            }
            "tbl" => {
                flush_list(&mut pending_list, ctx, &mut blocks);
                ctx.report.features.tables += 1;
                blocks.push(Block::Table(table::parse_table(child, ctx)));
            }
            "sectPr" => *page_setup = parse_sect_pr(child),
            _ => {}
        }
    }
    flush_list(&mut pending_list, ctx, &mut blocks);
    blocks
}

/// Turn buffered numbered paragraphs into list blocks, one list per run
/// of equal numbering ids, nested by indent level.
fn flush_list(
    pending: &mut Vec<(NumberingRef, Paragraph)>,
    ctx: &mut DocxContext<'_>,
    blocks: &mut Vec<Block>,
) {
    if pending.is_empty() {
        return;
    }
    let items = std::mem::take(pending);
    let mut start = 0;
    while start < items.len() {
        let num_id = items[start].0.num_id;
        let mut end = start + 1;
        while end < items.len() && items[end].0.num_id == num_id {
            end += 1;
        }
        let kind = *ctx
            .list_kinds
            .get(&num_id)
            .unwrap_or(&ListKind::Unordered);
        ctx.report.features.lists += 1;
        let run = &items[start..end];
        let base_level = run.iter().map(|(n, _)| n.level).min().unwrap_or(0);
        let mut cursor = 0;
        let list = build_list(run, &mut cursor, base_level, kind);
        blocks.push(Block::List(list));
        start = end;
    }
}

fn build_list(
    items: &[(NumberingRef, Paragraph)],
    cursor: &mut usize,
    level: u32,
    kind: ListKind,
) -> List {
    let mut list_items: Vec<ListItem> = Vec::new();
    while *cursor < items.len() {
        let item_level = items[*cursor].0.level;
        if item_level < level {
            break;
        }
        if item_level > level {
            // Deeper run nests inside the previous item.
            let nested = build_list(items, cursor, item_level, kind);
            if let Some(prev) = list_items.last_mut() {
                prev.blocks.push(Block::List(nested));
            } else {
                list_items.push(ListItem::new(vec![Block::List(nested)]));
            }
            continue;
        }
        let para = items[*cursor].1.clone();
        *cursor += 1;
        list_items.push(ListItem::new(vec![Block::Paragraph(para)]));
    }
    List::new(kind, list_items)
}

fn parse_sect_pr(sect_pr: &XmlElement) -> Option<PageSetup> {
    let mut setup = PageSetup::default();
    let mut any = false;
    if let Some(pg_sz) = sect_pr.child("pgSz") {
        setup.width_pt = attr_twips(pg_sz, "w");
        setup.height_pt = attr_twips(pg_sz, "h");
        any |= setup.width_pt.is_some() || setup.height_pt.is_some();
    }
    if let Some(pg_mar) = sect_pr.child("pgMar") {
        setup.margin_top_pt = attr_twips(pg_mar, "top");
        setup.margin_bottom_pt = attr_twips(pg_mar, "bottom");
        setup.margin_left_pt = attr_twips(pg_mar, "left");
        setup.margin_right_pt = attr_twips(pg_mar, "right");
        any = true;
    }
    any.then_some(setup)
}

fn attr_twips(element: &XmlElement, name: &str) -> Option<f64> {
    element
        .attr(name)
        .and_then(|v| v.parse::<i64>().ok())
        .map(twips_to_points)
}

/// Parse the styles part, recording heading levels by style id. A broken
/// styles part degrades to a warning.
fn parse_styles(ctx: &mut DocxContext<'_>) -> Option<OrderedMap<StyleDefinition>> {
    let root = match ctx.package.part_xml("word/styles.xml")? {
        Ok(root) => root,
        Err(e) => {
            ctx.report
                .add_warning(format!("styles part unreadable, styles skipped: {e}"));
            return None;
        }
    };
    let mut styles = OrderedMap::new();
    for style in root.children_named("style") {
        let Some(id) = style.attr("styleId") else {
            continue;
        };
        let name = style
            .child("name")
            .and_then(|n| n.attr("val"))
            .map(str::to_string);
        for candidate in [Some(id), name.as_deref()].into_iter().flatten() {
            if let Some(caps) = heading_pattern().captures(candidate) {
                if let Ok(level) = caps[1].parse::<u8>() {
                    ctx.heading_levels.insert(id.to_string(), level.min(6));
                    break;
                }
            }
        }
        styles.insert(
            id.to_string(),
            StyleDefinition {
                id: id.to_string(),
                name,
                based_on: style
                    .child("basedOn")
                    .and_then(|b| b.attr("val"))
                    .map(str::to_string),
                style_type: style.attr("type").map(str::to_string),
            },
        );
    }
    (!styles.is_empty()).then_some(styles)
}

/// Parse the numbering part, resolving concrete ids through their
/// abstract definitions. A broken part degrades to a warning.
fn parse_numbering(ctx: &mut DocxContext<'_>) -> Option<OrderedMap<NumberingDefinition>> {
    let root = match ctx.package.part_xml("word/numbering.xml")? {
        Ok(root) => root,
        Err(e) => {
            ctx.report
                .add_warning(format!("numbering part unreadable, numbering skipped: {e}"));
            return None;
        }
    };

    let mut abstract_levels: HashMap<&str, Vec<NumberingLevel>> = HashMap::new();
    for abstract_num in root.children_named("abstractNum") {
        let Some(id) = abstract_num.attr("abstractNumId") else {
            continue;
        };
        let mut levels = Vec::new();
        for lvl in abstract_num.children_named("lvl") {
            let level = lvl
                .attr("ilvl")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let format = lvl
                .child("numFmt")
                .and_then(|f| f.attr("val"))
                .unwrap_or("decimal")
                .to_string();
            let text = lvl
                .child("lvlText")
                .and_then(|t| t.attr("val"))
                .map(str::to_string);
            levels.push(NumberingLevel {
                level,
                format,
                text,
            });
        }
        abstract_levels.insert(id, levels);
    }

    let mut numbering = OrderedMap::new();
    for num in root.children_named("num") {
        let Some(id) = num.attr("numId") else {
            continue;
        };
        let levels = num
            .child("abstractNumId")
            .and_then(|a| a.attr("val"))
            .and_then(|abs_id| abstract_levels.get(abs_id))
            .cloned()
            .unwrap_or_default();
        if let Ok(num_id) = id.parse::<u32>() {
            let kind = match levels.first().map(|l| l.format.as_str()) {
                Some("bullet") => ListKind::Unordered,
                Some(_) => ListKind::Ordered,
                None => ListKind::Unordered,
            };
            ctx.list_kinds.insert(num_id, kind);
        }
        numbering.insert(
            id.to_string(),
            NumberingDefinition {
                id: id.to_string(),
                levels,
            },
        );
    }
    (!numbering.is_empty()).then_some(numbering)
}

fn has_core_properties(package: &Package) -> bool {
    package.part("docProps/core.xml").is_some()
}

fn core_properties(package: &Package) -> Option<DocumentProperties> {
    let root = package.part_xml("docProps/core.xml")?.ok()?;
    let text_of = |name: &str| {
        root.child(name)
            .map(|e| e.text())
            .filter(|t| !t.trim().is_empty())
    };
    Some(DocumentProperties {
        title: text_of("title"),
        author: text_of("creator"),
        page_setup: None,
    })
}

/// Parse footnote, endnote, comment, header, and footer parts into
/// auxiliary content. Separator pseudo-notes are skipped.
fn parse_auxiliary(ctx: &mut DocxContext<'_>) -> AuxiliaryContent {
    let mut aux = AuxiliaryContent::default();
    aux.footnotes = parse_note_part(ctx, "word/footnotes.xml", "footnote");
    aux.endnotes = parse_note_part(ctx, "word/endnotes.xml", "endnote");
    aux.comments = parse_comments(ctx);
    aux.headers = parse_header_footer_parts(ctx, "word/header");
    aux.footers = parse_header_footer_parts(ctx, "word/footer");
    aux
}

/// Parse every `word/headerN.xml` or `word/footerN.xml` part, keyed by
/// part file stem ("header1").
fn parse_header_footer_parts(
    ctx: &mut DocxContext<'_>,
    prefix: &str,
) -> Option<OrderedMap<HeaderFooter>> {
    let names: Vec<String> = ctx
        .package
        .parts_with_prefix(prefix)
        .into_iter()
        .filter(|name| name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    let mut bodies = OrderedMap::new();
    for name in names {
        let root = match ctx.package.part_xml(&name) {
            Some(Ok(root)) => root,
            Some(Err(e)) => {
                ctx.report
                    .add_warning(format!("{name} unreadable, part skipped: {e}"));
                continue;
            }
            None => continue,
        };
        let blocks = note_blocks(&root, ctx);
        let key = name
            .trim_start_matches("word/")
            .trim_end_matches(".xml")
            .to_string();
        bodies.insert(
            key,
            HeaderFooter {
                id: crate::ast::fresh_id(),
                blocks,
            },
        );
    }
    (!bodies.is_empty()).then_some(bodies)
}

fn parse_note_part(
    ctx: &mut DocxContext<'_>,
    part: &str,
    element_name: &str,
) -> Option<OrderedMap<NoteContent>> {
    let root = match ctx.package.part_xml(part)? {
        Ok(root) => root,
        Err(e) => {
            ctx.report
                .add_warning(format!("{part} unreadable, notes skipped: {e}"));
            return None;
        }
    };
    let mut notes = OrderedMap::new();
    for note in root.children_named(element_name) {
        if note.attr("type").is_some() {
            continue;
        }
        let Some(id) = note.attr("id").map(str::to_string) else {
            continue;
        };
        let blocks = note_blocks(note, ctx);
        notes.insert(
            id,
            NoteContent {
                id: crate::ast::fresh_id(),
                blocks,
            },
        );
    }
    (!notes.is_empty()).then_some(notes)
}

fn parse_comments(ctx: &mut DocxContext<'_>) -> Option<OrderedMap<CommentContent>> {
    let root = match ctx.package.part_xml("word/comments.xml")? {
        Ok(root) => root,
        Err(e) => {
            ctx.report
                .add_warning(format!("comments part unreadable, comments skipped: {e}"));
            return None;
        }
    };
    let mut comments = OrderedMap::new();
    for comment in root.children_named("comment") {
        let Some(id) = comment.attr("id").map(str::to_string) else {
            continue;
        };
        let author = comment.attr("author").map(str::to_string);
        let date = comment.attr("date").map(str::to_string);
        let blocks = note_blocks(comment, ctx);
        comments.insert(
            id,
            CommentContent {
                id: crate::ast::fresh_id(),
                author,
                date,
                blocks,
            },
        );
    }
    (!comments.is_empty()).then_some(comments)
}

fn note_blocks(container: &XmlElement, ctx: &mut DocxContext<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    for child in container.child_elements() {
        match child.name.as_str() {
            "p" => {
                let parsed = parse_paragraph(child, ctx);
                blocks.push(classify_paragraph(parsed, ctx));
            }
            "tbl" => {
                ctx.report.features.tables += 1;
                blocks.push(Block::Table(table::parse_table(child, ctx)));
            }
            _ => {}
        }
    }
    blocks
}
