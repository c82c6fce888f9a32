//! Whole-tree operations: id-refreshing clone and content checksums.

use super::id::fresh_id;
use super::node::{
    AuxiliaryContent, Block, Document, Inline, ListItem, TableCell, TableRow,
};
use crate::error::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deep-copy a document with every node id replaced by a fresh one.
/// Content, order, and structure are untouched; resource and note keys
/// keep their original ids because body references point at them.
pub fn clone_with_new_ids(doc: &Document) -> Document {
    let mut copy = doc.clone();
    copy.id = fresh_id();
    for section in &mut copy.sections {
        section.id = fresh_id();
        refresh_blocks(&mut section.blocks);
    }
    if let Some(aux) = &mut copy.auxiliary {
        refresh_auxiliary(aux);
    }
    copy
}

fn refresh_auxiliary(aux: &mut AuxiliaryContent) {
    if let Some(notes) = &mut aux.footnotes {
        for note in notes.values_mut() {
            note.id = fresh_id();
            refresh_blocks(&mut note.blocks);
        }
    }
    if let Some(notes) = &mut aux.endnotes {
        for note in notes.values_mut() {
            note.id = fresh_id();
            refresh_blocks(&mut note.blocks);
        }
    }
    if let Some(comments) = &mut aux.comments {
        for comment in comments.values_mut() {
            comment.id = fresh_id();
            refresh_blocks(&mut comment.blocks);
        }
    }
    if let Some(revisions) = &mut aux.revisions {
        for revision in revisions.values_mut() {
            revision.id = fresh_id();
            refresh_inlines(&mut revision.content);
        }
    }
    if let Some(headers) = &mut aux.headers {
        for header in headers.values_mut() {
            header.id = fresh_id();
            refresh_blocks(&mut header.blocks);
        }
    }
    if let Some(footers) = &mut aux.footers {
        for footer in footers.values_mut() {
            footer.id = fresh_id();
            refresh_blocks(&mut footer.blocks);
        }
    }
}

fn refresh_blocks(blocks: &mut [Block]) {
    for block in blocks {
        refresh_block(block);
    }
}

fn refresh_block(block: &mut Block) {
    match block {
        Block::Paragraph(p) => {
            p.id = fresh_id();
            refresh_inlines(&mut p.children);
        }
        Block::Heading(h) => {
            h.id = fresh_id();
            refresh_inlines(&mut h.children);
        }
        Block::List(l) => {
            l.id = fresh_id();
            for item in &mut l.items {
                refresh_list_item(item);
            }
        }
        Block::Table(t) => {
            t.id = fresh_id();
            for row in &mut t.rows {
                refresh_row(row);
            }
        }
        Block::Figure(f) => {
            f.id = fresh_id();
            if let Some(image) = &mut f.image {
                image.id = fresh_id();
            }
            if let Some(caption) = &mut f.caption {
                refresh_inlines(caption);
            }
        }
        Block::CodeBlock(c) => c.id = fresh_id(),
        Block::Blockquote(q) => {
            q.id = fresh_id();
            refresh_blocks(&mut q.blocks);
        }
        Block::ThematicBreak(t) => t.id = fresh_id(),
        Block::Custom(c) => {
            c.id = fresh_id();
            refresh_blocks(&mut c.blocks);
        }
    }
}

fn refresh_list_item(item: &mut ListItem) {
    item.id = fresh_id();
    if let Some(term) = &mut item.term {
        refresh_inlines(term);
    }
    refresh_blocks(&mut item.blocks);
}

fn refresh_row(row: &mut TableRow) {
    row.id = fresh_id();
    for cell in &mut row.cells {
        refresh_cell(cell);
    }
}

fn refresh_cell(cell: &mut TableCell) {
    cell.id = fresh_id();
    refresh_blocks(&mut cell.blocks);
}

fn refresh_inlines(inlines: &mut [Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(n) => n.id = fresh_id(),
            Inline::HardBreak(n) => n.id = fresh_id(),
            Inline::SoftBreak(n) => n.id = fresh_id(),
            Inline::Hyperlink(n) => {
                n.id = fresh_id();
                refresh_inlines(&mut n.children);
            }
            Inline::Image(n) => n.id = fresh_id(),
            Inline::Math(n) => n.id = fresh_id(),
            Inline::FootnoteRef(n) => n.id = fresh_id(),
            Inline::EndnoteRef(n) => n.id = fresh_id(),
            Inline::CommentRef(n) => n.id = fresh_id(),
            Inline::Bookmark(n) => n.id = fresh_id(),
            Inline::Embed(n) => n.id = fresh_id(),
            Inline::Custom(n) => n.id = fresh_id(),
        }
    }
}

/// SHA-256 content checksum over a canonical serialization of the tree.
///
/// Node ids and the top-level metadata object are stripped before
/// hashing, so two documents with equal content but different ids or
/// creation times produce equal checksums.
pub fn checksum(doc: &Document) -> Result<String> {
    let mut value = serde_json::to_value(doc)?;
    if let Value::Object(map) = &mut value {
        map.remove("metadata");
    }
    strip_ids(&mut value);
    let canonical = value.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn strip_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("id");
            for v in map.values_mut() {
                strip_ids(v);
            }
        }
        Value::Array(items) => {
            for v in items {
                strip_ids(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::{Heading, Paragraph, Section};
    use crate::ast::walk::{walk, Walk};
    use std::collections::HashSet;

    fn sample() -> Document {
        let mut doc = Document::new("test");
        doc.add_section(Section::new(vec![
            Block::Heading(Heading::with_text(1, "Title")),
            Block::Paragraph(Paragraph::with_text("Body text")),
        ]));
        doc
    }

    fn all_ids(doc: &Document) -> HashSet<String> {
        let mut ids = HashSet::new();
        walk(doc, &mut |node, _, _| {
            ids.insert(node.id().to_string());
            Walk::Continue
        });
        ids
    }

    #[test]
    fn test_clone_with_new_ids_disjoint() {
        let doc = sample();
        let copy = clone_with_new_ids(&doc);
        let original_ids = all_ids(&doc);
        let copy_ids = all_ids(&copy);
        assert!(original_ids.is_disjoint(&copy_ids));

        // Two successive copies must also not share ids with each other.
        let second = clone_with_new_ids(&doc);
        assert!(copy_ids.is_disjoint(&all_ids(&second)));
    }

    #[test]
    fn test_clone_preserves_content() {
        let doc = sample();
        let copy = clone_with_new_ids(&doc);
        assert_eq!(doc.plain_text(), copy.plain_text());
        assert_eq!(doc.sections.len(), copy.sections.len());
    }

    #[test]
    fn test_checksum_ignores_ids_and_metadata() {
        let doc = sample();
        let copy = clone_with_new_ids(&doc);
        assert_eq!(checksum(&doc).unwrap(), checksum(&copy).unwrap());

        let mut stamped = doc.clone();
        stamped.metadata.checksum = Some("deadbeef".to_string());
        assert_eq!(checksum(&doc).unwrap(), checksum(&stamped).unwrap());
    }

    #[test]
    fn test_checksum_changes_with_content() {
        let doc = sample();
        let mut edited = doc.clone();
        if let Block::Paragraph(p) = &mut edited.sections[0].blocks[1] {
            p.children = vec![Inline::Text(crate::ast::node::TextRun::new("Changed"))];
        }
        assert_ne!(checksum(&doc).unwrap(), checksum(&edited).unwrap());
    }
}
