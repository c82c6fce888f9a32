//! Depth-first traversal over the document tree.
//!
//! The visitor receives each node together with its parent and the path of
//! field steps from the root, and steers the walk with a [`Walk`] signal.

use super::node::{
    Block, Document, Inline, ListItem, Section, TableCell, TableRow,
};

/// Borrowed reference to any node in the tree.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// The document root.
    Document(&'a Document),
    /// A section.
    Section(&'a Section),
    /// A block node.
    Block(&'a Block),
    /// An inline node.
    Inline(&'a Inline),
    /// A list item.
    ListItem(&'a ListItem),
    /// A table row.
    TableRow(&'a TableRow),
    /// A table cell.
    TableCell(&'a TableCell),
}

impl<'a> NodeRef<'a> {
    /// Node id of the referenced node.
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Document(n) => &n.id,
            NodeRef::Section(n) => &n.id,
            NodeRef::Block(n) => n.id(),
            NodeRef::Inline(n) => n.id(),
            NodeRef::ListItem(n) => &n.id,
            NodeRef::TableRow(n) => &n.id,
            NodeRef::TableCell(n) => &n.id,
        }
    }

    /// Snake_case type tag of the referenced node, matching the
    /// serialized `type` field for blocks and inlines.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeRef::Document(_) => "document",
            NodeRef::Section(_) => "section",
            NodeRef::Block(b) => match b {
                Block::Paragraph(_) => "paragraph",
                Block::Heading(_) => "heading",
                Block::List(_) => "list",
                Block::Table(_) => "table",
                Block::Figure(_) => "figure",
                Block::CodeBlock(_) => "code_block",
                Block::Blockquote(_) => "blockquote",
                Block::ThematicBreak(_) => "thematic_break",
                Block::Custom(_) => "custom",
            },
            NodeRef::Inline(i) => match i {
                Inline::Text(_) => "text",
                Inline::HardBreak(_) => "hard_break",
                Inline::SoftBreak(_) => "soft_break",
                Inline::Hyperlink(_) => "hyperlink",
                Inline::Image(_) => "image",
                Inline::Math(_) => "math",
                Inline::FootnoteRef(_) => "footnote_ref",
                Inline::EndnoteRef(_) => "endnote_ref",
                Inline::CommentRef(_) => "comment_ref",
                Inline::Bookmark(_) => "bookmark",
                Inline::Embed(_) => "embed",
                Inline::Custom(_) => "custom",
            },
            NodeRef::ListItem(_) => "list_item",
            NodeRef::TableRow(_) => "table_row",
            NodeRef::TableCell(_) => "table_cell",
        }
    }
}

/// One step on the path from the root to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    /// Field name on the parent ("sections", "blocks", "children", ...).
    pub key: &'static str,
    /// Index within that field.
    pub index: usize,
}

/// Visitor signal steering the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into the node's children.
    Continue,
    /// Skip the node's children, continue with its siblings.
    Prune,
}

/// Visit every node depth-first, parents before children, siblings in
/// order. The visitor gets the node, its parent (None at the root), and
/// the path of field steps from the root.
pub fn walk<'a, F>(doc: &'a Document, visit: &mut F)
where
    F: FnMut(NodeRef<'a>, Option<NodeRef<'a>>, &[PathStep]) -> Walk,
{
    let root = NodeRef::Document(doc);
    if visit(root, None, &[]) == Walk::Prune {
        return;
    }
    let mut path = Vec::new();
    for (i, section) in doc.sections.iter().enumerate() {
        path.push(PathStep {
            key: "sections",
            index: i,
        });
        let node = NodeRef::Section(section);
        if visit(node, Some(root), &path) == Walk::Continue {
            walk_blocks(&section.blocks, node, &mut path, visit);
        }
        path.pop();
    }
    if let Some(aux) = &doc.auxiliary {
        walk_note_maps(aux, root, &mut path, visit);
    }
}

fn walk_note_maps<'a, F>(
    aux: &'a super::node::AuxiliaryContent,
    parent: NodeRef<'a>,
    path: &mut Vec<PathStep>,
    visit: &mut F,
) where
    F: FnMut(NodeRef<'a>, Option<NodeRef<'a>>, &[PathStep]) -> Walk,
{
    let note_sets: [(&'static str, Vec<&'a Vec<Block>>); 4] = [
        (
            "footnotes",
            aux.footnotes
                .iter()
                .flat_map(|m| m.values())
                .map(|n| &n.blocks)
                .collect(),
        ),
        (
            "endnotes",
            aux.endnotes
                .iter()
                .flat_map(|m| m.values())
                .map(|n| &n.blocks)
                .collect(),
        ),
        (
            "comments",
            aux.comments
                .iter()
                .flat_map(|m| m.values())
                .map(|c| &c.blocks)
                .collect(),
        ),
        (
            "headers",
            aux.headers
                .iter()
                .flat_map(|m| m.values())
                .map(|h| &h.blocks)
                .collect(),
        ),
    ];
    for (key, bodies) in note_sets {
        for (i, blocks) in bodies.into_iter().enumerate() {
            path.push(PathStep { key, index: i });
            walk_blocks(blocks, parent, path, visit);
            path.pop();
        }
    }
    for (i, footer) in aux
        .footers
        .iter()
        .flat_map(|m| m.values())
        .enumerate()
    {
        path.push(PathStep {
            key: "footers",
            index: i,
        });
        walk_blocks(&footer.blocks, parent, path, visit);
        path.pop();
    }
}

fn walk_blocks<'a, F>(
    blocks: &'a [Block],
    parent: NodeRef<'a>,
    path: &mut Vec<PathStep>,
    visit: &mut F,
) where
    F: FnMut(NodeRef<'a>, Option<NodeRef<'a>>, &[PathStep]) -> Walk,
{
    for (i, block) in blocks.iter().enumerate() {
        path.push(PathStep {
            key: "blocks",
            index: i,
        });
        walk_block(block, parent, path, visit);
        path.pop();
    }
}

fn walk_block<'a, F>(
    block: &'a Block,
    parent: NodeRef<'a>,
    path: &mut Vec<PathStep>,
    visit: &mut F,
) where
    F: FnMut(NodeRef<'a>, Option<NodeRef<'a>>, &[PathStep]) -> Walk,
{
    let node = NodeRef::Block(block);
    if visit(node, Some(parent), path) == Walk::Prune {
        return;
    }
    match block {
        Block::Paragraph(p) => walk_inlines(&p.children, node, path, visit),
        Block::Heading(h) => walk_inlines(&h.children, node, path, visit),
        Block::List(l) => {
            for (i, item) in l.items.iter().enumerate() {
                path.push(PathStep {
                    key: "items",
                    index: i,
                });
                let item_ref = NodeRef::ListItem(item);
                if visit(item_ref, Some(node), path) == Walk::Continue {
                    if let Some(term) = &item.term {
                        walk_inlines(term, item_ref, path, visit);
                    }
                    walk_blocks(&item.blocks, item_ref, path, visit);
                }
                path.pop();
            }
        }
        Block::Table(t) => {
            for (i, row) in t.rows.iter().enumerate() {
                path.push(PathStep {
                    key: "rows",
                    index: i,
                });
                let row_ref = NodeRef::TableRow(row);
                if visit(row_ref, Some(node), path) == Walk::Continue {
                    for (j, cell) in row.cells.iter().enumerate() {
                        path.push(PathStep {
                            key: "cells",
                            index: j,
                        });
                        let cell_ref = NodeRef::TableCell(cell);
                        if visit(cell_ref, Some(row_ref), path) == Walk::Continue {
                            walk_blocks(&cell.blocks, cell_ref, path, visit);
                        }
                        path.pop();
                    }
                }
                path.pop();
            }
        }
        Block::Figure(f) => {
            if let Some(caption) = &f.caption {
                walk_inlines(caption, node, path, visit);
            }
        }
        Block::Blockquote(q) => walk_blocks(&q.blocks, node, path, visit),
        Block::Custom(c) => walk_blocks(&c.blocks, node, path, visit),
        Block::CodeBlock(_) | Block::ThematicBreak(_) => {}
    }
}

fn walk_inlines<'a, F>(
    inlines: &'a [Inline],
    parent: NodeRef<'a>,
    path: &mut Vec<PathStep>,
    visit: &mut F,
) where
    F: FnMut(NodeRef<'a>, Option<NodeRef<'a>>, &[PathStep]) -> Walk,
{
    for (i, inline) in inlines.iter().enumerate() {
        path.push(PathStep {
            key: "children",
            index: i,
        });
        let node = NodeRef::Inline(inline);
        if visit(node, Some(parent), path) == Walk::Continue {
            if let Inline::Hyperlink(link) = inline {
                walk_inlines(&link.children, node, path, visit);
            }
        }
        path.pop();
    }
}

/// Walk the tree until a node with the given id is found; returns its
/// type tag when present.
pub fn find_by_id<'a>(doc: &'a Document, id: &str) -> Option<NodeRef<'a>> {
    let mut found = None;
    walk(doc, &mut |node, _, _| {
        if found.is_some() {
            return Walk::Prune;
        }
        if node.id() == id {
            found = Some(node);
            return Walk::Prune;
        }
        Walk::Continue
    });
    found
}

/// Collect every node whose type tag matches, in document order.
pub fn find_by_type<'a>(doc: &'a Document, type_name: &str) -> Vec<NodeRef<'a>> {
    let mut found = Vec::new();
    walk(doc, &mut |node, _, _| {
        if node.type_name() == type_name {
            found.push(node);
        }
        Walk::Continue
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::{Heading, Paragraph, Table, TableCell, TableRow};

    fn sample() -> Document {
        let mut doc = Document::new("test");
        doc.add_section(Section::new(vec![
            Block::Heading(Heading::with_text(1, "Title")),
            Block::Paragraph(Paragraph::with_text("Body")),
            Block::Table(Table::new(vec![TableRow::new(vec![
                TableCell::with_text("A"),
                TableCell::with_text("B"),
            ])])),
        ]));
        doc
    }

    #[test]
    fn test_walk_visits_parents_before_children() {
        let doc = sample();
        let mut types = Vec::new();
        walk(&doc, &mut |node, _, _| {
            types.push(node.type_name());
            Walk::Continue
        });
        assert_eq!(types[0], "document");
        assert_eq!(types[1], "section");
        assert_eq!(types[2], "heading");
        assert!(types.contains(&"table_cell"));
    }

    #[test]
    fn test_prune_skips_children() {
        let doc = sample();
        let mut saw_cell = false;
        walk(&doc, &mut |node, _, _| {
            if node.type_name() == "table_cell" {
                saw_cell = true;
            }
            if node.type_name() == "table" {
                Walk::Prune
            } else {
                Walk::Continue
            }
        });
        assert!(!saw_cell);
    }

    #[test]
    fn test_path_reflects_position() {
        let doc = sample();
        let mut para_path = Vec::new();
        walk(&doc, &mut |node, _, path| {
            if node.type_name() == "paragraph" && para_path.is_empty() {
                para_path = path.to_vec();
            }
            Walk::Continue
        });
        assert_eq!(para_path.len(), 2);
        assert_eq!(para_path[0].key, "sections");
        assert_eq!(para_path[1], PathStep { key: "blocks", index: 1 });
    }

    #[test]
    fn test_find_by_id_and_type() {
        let doc = sample();
        let headings = find_by_type(&doc, "heading");
        assert_eq!(headings.len(), 1);
        let id = headings[0].id().to_string();
        let again = find_by_id(&doc, &id).unwrap();
        assert_eq!(again.type_name(), "heading");
        assert!(find_by_id(&doc, "no-such-id").is_none());
    }
}
