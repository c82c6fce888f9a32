//! Table parsing.
//!
//! Horizontal merges map to `colspan` via `gridSpan`. Vertical merges are
//! carried partially: a `vMerge` restart cell gets `rowspan` 1 and the
//! continuation cells are skipped, so column counts stay consistent even
//! though the merged extent is not recomputed.

use super::xml::XmlElement;
use super::DocxContext;
use crate::ast::{Alignment, Block, Table, TableCell, TableRow};

/// Parse one `w:tbl` element.
pub fn parse_table(tbl: &XmlElement, ctx: &mut DocxContext<'_>) -> Table {
    let mut rows = Vec::new();
    for (index, tr) in tbl.children_named("tr").enumerate() {
        rows.push(parse_row(tr, index == 0, ctx));
    }
    Table::new(rows)
}

fn parse_row(tr: &XmlElement, first: bool, ctx: &mut DocxContext<'_>) -> TableRow {
    let mut cells = Vec::new();
    for tc in tr.children_named("tc") {
        if let Some(cell) = parse_cell(tc, ctx) {
            cells.push(cell);
        }
    }
    let mut row = TableRow::new(cells);
    row.header = first || is_header_row(tr);
    row
}

fn is_header_row(tr: &XmlElement) -> bool {
    tr.child("trPr").is_some_and(|pr| pr.child("tblHeader").is_some())
}

/// Parse one cell. Returns `None` for vertical-merge continuation cells.
fn parse_cell(tc: &XmlElement, ctx: &mut DocxContext<'_>) -> Option<TableCell> {
    let mut colspan = None;
    let mut rowspan = None;
    let mut alignment = None;

    if let Some(tc_pr) = tc.child("tcPr") {
        if let Some(span) = tc_pr
            .child("gridSpan")
            .and_then(|g| g.attr("val"))
            .and_then(|v| v.parse::<u32>().ok())
        {
            if span > 1 {
                colspan = Some(span);
            }
        }
        if let Some(v_merge) = tc_pr.child("vMerge") {
            match v_merge.attr("val") {
                Some("restart") => rowspan = Some(1),
                // Absent val means continue.
                _ => {
                    log::debug!("skipping vertical-merge continuation cell");
                    return None;
                }
            }
        }
        alignment = match tc_pr.child("vAlign").and_then(|a| a.attr("val")) {
            Some("center") => Some(Alignment::Center),
            _ => None,
        };
    }

    let mut blocks = Vec::new();
    for child in tc.child_elements() {
        match child.name.as_str() {
            "p" => {
                let parsed = super::paragraph::parse_paragraph(child, ctx);
                blocks.push(super::classify_paragraph(parsed, ctx));
            }
            "tbl" => {
                ctx.report.features.tables += 1;
                blocks.push(Block::Table(parse_table(child, ctx)));
            }
            _ => {}
        }
    }

    let mut cell = TableCell::new(blocks);
    cell.colspan = colspan;
    cell.rowspan = rowspan;
    cell.alignment = alignment;
    Some(cell)
}
