//! Document tree behavior: serialization stability, id-refreshing
//! clones, checksums, and structural validation.

use candoc::ast::{
    checksum, clone_with_new_ids, ensure_valid, find_by_type, from_json,
    to_json, walk, AuxiliaryContent, Block, Document, FootnoteRef, Heading,
    Inline, Mark, NoteContent, OrderedMap, Paragraph, Section, Table,
    TableCell, TableRow, TextRun, Walk,
};
use std::collections::HashSet;

fn sample_document() -> Document {
    let mut doc = Document::new("test");
    doc.add_section(Section::new(vec![
        Block::Heading(Heading::with_text(1, "Report")),
        Block::Paragraph(Paragraph::new(vec![
            Inline::Text(TextRun::new("Numbers are ")),
            Inline::Text(TextRun::with_marks("important", vec![Mark::Bold])),
            Inline::FootnoteRef(FootnoteRef::new("1")),
        ])),
        Block::Table(Table::new(vec![
            TableRow::new(vec![TableCell::with_text("Year"), TableCell::with_text("Value")]),
            TableRow::new(vec![TableCell::with_text("2024"), TableCell::with_text("10")]),
        ])),
    ]));
    let mut footnotes = OrderedMap::new();
    footnotes.insert(
        "1".to_string(),
        NoteContent {
            id: candoc::ast::fresh_id(),
            blocks: vec![Block::Paragraph(Paragraph::with_text("source"))],
        },
    );
    doc.auxiliary = Some(AuxiliaryContent {
        footnotes: Some(footnotes),
        ..Default::default()
    });
    doc
}

#[test]
fn serialization_roundtrip_is_structurally_equal() {
    let doc = sample_document();
    let json = to_json(&doc).unwrap();
    let restored = from_json(&json).unwrap();
    assert_eq!(restored, doc);

    // A second encode of the restoration matches byte for byte.
    assert_eq!(to_json(&restored).unwrap(), json);
}

#[test]
fn ordered_map_wrapper_shape_on_the_wire() {
    let doc = sample_document();
    let value: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
    let footnotes = &value["auxiliary"]["footnotes"];
    assert_eq!(footnotes["__type"], "Map");
    assert!(footnotes["data"].is_array());
    assert_eq!(footnotes["data"][0][0], "1");
}

#[test]
fn clone_with_new_ids_never_collides() {
    let doc = sample_document();
    let first = clone_with_new_ids(&doc);
    let second = clone_with_new_ids(&doc);

    let ids = |d: &Document| {
        let mut set = HashSet::new();
        walk(d, &mut |node, _, _| {
            set.insert(node.id().to_string());
            Walk::Continue
        });
        set
    };
    let original = ids(&doc);
    let first_ids = ids(&first);
    let second_ids = ids(&second);

    assert!(original.is_disjoint(&first_ids));
    assert!(original.is_disjoint(&second_ids));
    assert!(first_ids.is_disjoint(&second_ids));
    assert_eq!(doc.plain_text(), first.plain_text());
}

#[test]
fn checksum_stable_under_id_and_metadata_changes() {
    let doc = sample_document();
    let base = checksum(&doc).unwrap();

    let refreshed = clone_with_new_ids(&doc);
    assert_eq!(checksum(&refreshed).unwrap(), base);

    let mut stamped = doc.clone();
    stamped.metadata.checksum = Some(base.clone());
    stamped.metadata.source_format = "other".to_string();
    assert_eq!(checksum(&stamped).unwrap(), base);

    let mut edited = doc.clone();
    if let Block::Heading(h) = &mut edited.sections[0].blocks[0] {
        h.children = vec![Inline::Text(TextRun::new("Changed"))];
    }
    assert_ne!(checksum(&edited).unwrap(), base);
}

#[test]
fn walk_finds_typed_nodes_in_order() {
    let doc = sample_document();
    let cells = find_by_type(&doc, "table_cell");
    assert_eq!(cells.len(), 4);
    let texts = find_by_type(&doc, "text");
    assert!(texts.len() >= 2);
}

#[test]
fn mark_helpers_keep_absent_list_absent() {
    let mut run = TextRun::new("x");
    run.add_mark(Mark::Bold);
    run.add_mark(Mark::Bold);
    assert_eq!(run.marks.as_ref().map(Vec::len), Some(1));
    run.remove_mark(Mark::Bold);
    assert_eq!(run.marks, None);
    let json = serde_json::to_value(&run).unwrap();
    assert!(json.get("marks").is_none());
}

#[test]
fn parser_built_trees_validate_clean() {
    assert!(ensure_valid(&sample_document()).is_ok());
}
