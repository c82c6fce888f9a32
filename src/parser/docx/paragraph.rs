//! Paragraph and run parsing.
//!
//! A `w:p` yields inline content plus enough property context for the
//! caller to decide whether it becomes a paragraph, a heading, or a list
//! item. Tracked-change wrappers (`ins`, `del`) are unwrapped so the
//! accepted text flows through; their attribution is counted but not
//! kept.

use super::drawing::parse_drawing;
use super::math::linearize;
use super::DocxContext;
use super::units::twips_to_points;
use super::xml::XmlElement;
use crate::ast::{
    Alignment, Bookmark, CommentRef, EndnoteRef, FootnoteRef, HardBreak,
    Hyperlink, Inline, Mark, Math, ParagraphProps, TextRun,
};

/// Numbering reference on a paragraph (`numPr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    /// Numbering definition id.
    pub num_id: u32,
    /// Indent level, 0-based.
    pub level: u32,
}

/// A parsed paragraph before block classification.
#[derive(Debug)]
pub struct ParsedParagraph {
    /// Inline content in order.
    pub inlines: Vec<Inline>,
    /// Layout properties, `None` when all defaults.
    pub props: Option<ParagraphProps>,
    /// Paragraph style id when set.
    pub style_id: Option<String>,
    /// Numbering reference when the paragraph belongs to a list.
    pub numbering: Option<NumberingRef>,
}

/// Parse one `w:p` element.
pub fn parse_paragraph(p: &XmlElement, ctx: &mut DocxContext<'_>) -> ParsedParagraph {
    let mut style_id = None;
    let mut numbering = None;
    let mut props = None;

    if let Some(ppr) = p.child("pPr") {
        style_id = ppr
            .child("pStyle")
            .and_then(|s| s.attr("val"))
            .map(str::to_string);
        numbering = parse_numbering_ref(ppr);
        let parsed = parse_paragraph_props(ppr);
        if !parsed.is_default() {
            props = Some(parsed);
        }
    }

    let inlines = parse_inline_children(p, ctx, &[]);
    ParsedParagraph {
        inlines,
        props,
        style_id,
        numbering,
    }
}

fn parse_numbering_ref(ppr: &XmlElement) -> Option<NumberingRef> {
    let num_pr = ppr.child("numPr")?;
    let num_id = num_pr.child("numId")?.attr("val")?.parse().ok()?;
    let level = num_pr
        .child("ilvl")
        .and_then(|l| l.attr("val"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    Some(NumberingRef { num_id, level })
}

fn parse_paragraph_props(ppr: &XmlElement) -> ParagraphProps {
    let mut props = ParagraphProps::default();

    if let Some(jc) = ppr.child("jc").and_then(|j| j.attr("val")) {
        props.alignment = match jc {
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            "left" | "start" => Some(Alignment::Left),
            _ => None,
        };
    }

    if let Some(ind) = ppr.child("ind") {
        props.indent_pt = attr_twips(ind, "left").or_else(|| attr_twips(ind, "start"));
        props.first_line_indent_pt = attr_twips(ind, "firstLine");
    }

    if let Some(spacing) = ppr.child("spacing") {
        props.spacing_before_pt = attr_twips(spacing, "before");
        props.spacing_after_pt = attr_twips(spacing, "after");
        // Line spacing in 240ths of a line when lineRule is auto.
        if let Some(line) = spacing.attr("line").and_then(|v| v.parse::<f64>().ok()) {
            let auto = spacing
                .attr("lineRule")
                .map_or(true, |rule| rule == "auto");
            if auto && line > 0.0 {
                props.line_spacing = Some(line / 240.0);
            }
        }
    }

    props.page_break_before = flag_element(ppr, "pageBreakBefore");
    props.keep_with_next = flag_element(ppr, "keepNext");
    props.keep_lines_together = flag_element(ppr, "keepLines");
    if let Some(widow) = ppr.child("widowControl") {
        props.widow_control = Some(!matches!(widow.attr("val"), Some("0") | Some("false")));
    }

    props
}

fn attr_twips(element: &XmlElement, name: &str) -> Option<f64> {
    element
        .attr(name)
        .and_then(|v| v.parse::<i64>().ok())
        .map(twips_to_points)
}

/// An on/off property element is true unless its `val` says otherwise.
fn flag_element(parent: &XmlElement, name: &str) -> bool {
    parent
        .child(name)
        .is_some_and(|e| !matches!(e.attr("val"), Some("0") | Some("false")))
}

/// Parse the inline-bearing children of a paragraph or wrapper element.
/// `extra_marks` is applied on top of each run's own formatting.
pub fn parse_inline_children(
    parent: &XmlElement,
    ctx: &mut DocxContext<'_>,
    extra_marks: &[Mark],
) -> Vec<Inline> {
    let mut inlines = Vec::new();
    for child in parent.child_elements() {
        match child.name.as_str() {
            "r" => parse_run(child, ctx, extra_marks, &mut inlines),
            "hyperlink" => parse_hyperlink(child, ctx, extra_marks, &mut inlines),
            "ins" | "del" => {
                // Tracked change: keep the accepted content, drop the
                // attribution.
                ctx.report.features.revisions += 1;
                inlines.extend(parse_inline_children(child, ctx, extra_marks));
            }
            "oMath" | "oMathPara" => {
                ctx.report.features.math += 1;
                inlines.push(Inline::Math(Math::new(linearize(child), "omml")));
            }
            "bookmarkStart" => {
                if let Some(name) = child.attr("name") {
                    if name != "_GoBack" {
                        ctx.report.features.bookmarks += 1;
                        inlines.push(Inline::Bookmark(Bookmark::new(name)));
                    }
                }
            }
            "smartTag" | "sdt" | "sdtContent" => {
                // Transparent wrappers.
                inlines.extend(parse_inline_children(child, ctx, extra_marks));
            }
            _ => {}
        }
    }
    inlines
}

fn parse_run(
    r: &XmlElement,
    ctx: &mut DocxContext<'_>,
    extra_marks: &[Mark],
    out: &mut Vec<Inline>,
) {
    let mut marks = extra_marks.to_vec();
    if let Some(rpr) = r.child("rPr") {
        for mark in run_marks(rpr) {
            if !marks.contains(&mark) {
                marks.push(mark);
            }
        }
    }

    for child in r.child_elements() {
        match child.name.as_str() {
            "t" | "delText" => {
                let text = child.text();
                if !text.is_empty() {
                    out.push(Inline::Text(TextRun::with_marks(text, marks.clone())));
                }
            }
            "tab" => out.push(Inline::Text(TextRun::with_marks("\t", marks.clone()))),
            "br" | "cr" => out.push(Inline::HardBreak(HardBreak::new())),
            "drawing" => {
                if let Some((image, resource)) = parse_drawing(child, ctx.package, &mut ctx.report)
                {
                    ctx.report.features.images += 1;
                    ctx.resources.push(resource);
                    out.push(Inline::Image(image));
                }
            }
            "footnoteReference" => {
                if let Some(id) = child.attr("id") {
                    ctx.report.features.footnotes += 1;
                    out.push(Inline::FootnoteRef(FootnoteRef::new(id)));
                }
            }
            "endnoteReference" => {
                if let Some(id) = child.attr("id") {
                    ctx.report.features.endnotes += 1;
                    out.push(Inline::EndnoteRef(EndnoteRef::new(id)));
                }
            }
            "commentReference" => {
                if let Some(id) = child.attr("id") {
                    ctx.report.features.comments += 1;
                    out.push(Inline::CommentRef(CommentRef::new(id)));
                }
            }
            _ => {}
        }
    }
}

/// Marks implied by run properties.
fn run_marks(rpr: &XmlElement) -> Vec<Mark> {
    let mut marks = Vec::new();
    if flag_element(rpr, "b") {
        marks.push(Mark::Bold);
    }
    if flag_element(rpr, "i") {
        marks.push(Mark::Italic);
    }
    if rpr
        .child("u")
        .is_some_and(|u| !matches!(u.attr("val"), Some("none")))
    {
        marks.push(Mark::Underline);
    }
    if flag_element(rpr, "strike") || flag_element(rpr, "dstrike") {
        marks.push(Mark::Strikethrough);
    }
    match rpr.child("vertAlign").and_then(|v| v.attr("val")) {
        Some("subscript") => marks.push(Mark::Subscript),
        Some("superscript") => marks.push(Mark::Superscript),
        _ => {}
    }
    if rpr
        .child("highlight")
        .is_some_and(|h| !matches!(h.attr("val"), Some("none")))
    {
        marks.push(Mark::Highlight);
    }
    if flag_element(rpr, "smallCaps") {
        marks.push(Mark::SmallCaps);
    }
    if flag_element(rpr, "vanish") {
        marks.push(Mark::Hidden);
    }
    marks
}

fn parse_hyperlink(
    link: &XmlElement,
    ctx: &mut DocxContext<'_>,
    extra_marks: &[Mark],
    out: &mut Vec<Inline>,
) {
    let children = parse_inline_children(link, ctx, extra_marks);

    if let Some(anchor) = link.attr("anchor") {
        ctx.report.features.hyperlinks += 1;
        out.push(Inline::Hyperlink(Hyperlink::to_anchor(anchor, children)));
        return;
    }

    if let Some(rid) = link.attr("id") {
        match ctx.package.relationship(rid) {
            Some(rel) => {
                ctx.report.features.hyperlinks += 1;
                out.push(Inline::Hyperlink(Hyperlink::new(
                    rel.target.clone(),
                    children,
                )));
                return;
            }
            None => {
                // Unresolvable target: keep the text, drop the link.
                ctx.report
                    .add_warning(format!("hyperlink references unknown relationship {rid}"));
            }
        }
    }

    out.extend(children);
}
