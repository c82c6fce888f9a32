//! HTML parsing against markup fragments and full documents.

use candoc::ast::{Block, Inline, ListKind, Mark};
use candoc::parser::{DocumentParser, HtmlParser};

fn parse_blocks(html: &str) -> Vec<Block> {
    let mut doc = HtmlParser::new().parse(html.as_bytes()).unwrap().ast;
    doc.sections.remove(0).blocks
}

#[test]
fn paragraph_with_bold_run() {
    let blocks = parse_blocks("<p>Hello <strong>World</strong></p>");
    let Block::Paragraph(p) = &blocks[0] else {
        panic!("expected paragraph, got {blocks:?}");
    };
    assert_eq!(p.children.len(), 2);
    let Inline::Text(plain) = &p.children[0] else {
        panic!();
    };
    assert_eq!(plain.text, "Hello ");
    assert_eq!(plain.marks, None);
    let Inline::Text(bold) = &p.children[1] else {
        panic!();
    };
    assert_eq!(bold.text, "World");
    assert!(bold.has_mark(Mark::Bold));
}

#[test]
fn headings_map_levels_directly() {
    let blocks = parse_blocks("<h1>a</h1><h3>b</h3><h6>c</h6>");
    let levels: Vec<u8> = blocks
        .iter()
        .map(|b| match b {
            Block::Heading(h) => h.level,
            other => panic!("expected heading, got {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![1, 3, 6]);
}

#[test]
fn full_document_uses_body_and_title() {
    let html = r#"<!DOCTYPE html><html><head><title>Doc Title</title>
        <style>p { color: red }</style></head>
        <body><p>content</p></body></html>"#;
    let outcome = HtmlParser::new().parse(html.as_bytes()).unwrap();
    assert_eq!(outcome.ast.plain_text(), "content");
    assert_eq!(
        outcome.ast.properties.and_then(|p| p.title).as_deref(),
        Some("Doc Title")
    );
}

#[test]
fn whitespace_collapses_outside_pre() {
    let blocks = parse_blocks("<p>a\n   b\t\tc</p>");
    let Block::Paragraph(p) = &blocks[0] else {
        panic!();
    };
    let Inline::Text(run) = &p.children[0] else {
        panic!();
    };
    assert_eq!(run.text, "a b c");
}

#[test]
fn pre_block_keeps_indentation() {
    let blocks = parse_blocks("<pre><code class=\"language-rust\">fn x() {\n    1\n}</code></pre>");
    let Block::CodeBlock(code) = &blocks[0] else {
        panic!();
    };
    assert_eq!(code.language.as_deref(), Some("rust"));
    assert!(code.code.contains("    1"));
}

#[test]
fn ordered_list_with_start_attribute() {
    let blocks = parse_blocks("<ol start=\"4\"><li>x</li><li>y</li></ol>");
    let Block::List(list) = &blocks[0] else {
        panic!();
    };
    assert_eq!(list.kind, ListKind::Ordered);
    assert_eq!(list.start, Some(4));
    assert_eq!(list.items.len(), 2);
}

#[test]
fn description_list_pairs_terms_with_bodies() {
    let blocks = parse_blocks("<dl><dt>term</dt><dd>meaning</dd></dl>");
    let Block::List(list) = &blocks[0] else {
        panic!();
    };
    assert_eq!(list.kind, ListKind::Description);
    assert_eq!(list.items.len(), 1);
    assert!(list.items[0].term.is_some());
    assert_eq!(list.items[0].blocks[0].plain_text(), "meaning");
}

#[test]
fn thead_marks_header_rows() {
    let html = "<table><thead><tr><td>H</td></tr></thead><tbody><tr><td>d</td></tr></tbody></table>";
    let blocks = parse_blocks(html);
    let Block::Table(table) = &blocks[0] else {
        panic!();
    };
    assert!(table.rows[0].header);
    assert!(!table.rows[1].header);
}

#[test]
fn cell_spans_carried_when_above_one() {
    let html = "<table><tr><td colspan=\"2\">wide</td><td rowspan=\"1\">one</td></tr></table>";
    let blocks = parse_blocks(html);
    let Block::Table(table) = &blocks[0] else {
        panic!();
    };
    assert_eq!(table.rows[0].cells[0].colspan, Some(2));
    // A span of 1 is the default and is not recorded.
    assert_eq!(table.rows[0].cells[1].rowspan, None);
}

#[test]
fn unclosed_markup_still_parses() {
    let blocks = parse_blocks("<div><p>one<p>two");
    assert!(blocks.len() >= 2);
    assert_eq!(blocks[0].plain_text(), "one");
}

#[test]
fn unknown_element_degrades_with_single_warning() {
    let outcome = HtmlParser::new()
        .parse(b"<p><blink>a</blink> and <blink>b</blink></p>")
        .unwrap();
    assert_eq!(outcome.ast.plain_text(), "a and b");
    // One warning per unknown tag name, not per occurrence.
    assert_eq!(outcome.report.warnings.len(), 1);
}

#[test]
fn tag_free_input_recovered_as_text() {
    let outcome = HtmlParser::new().parse(b"just some words").unwrap();
    assert_eq!(outcome.ast.plain_text(), "just some words");
}

#[test]
fn entities_decode_in_text() {
    let blocks = parse_blocks("<p>fish &amp; chips &ndash; daily</p>");
    assert_eq!(blocks[0].plain_text(), "fish & chips \u{2013} daily");
}

#[test]
fn data_attributes_survive_as_custom_inline() {
    let blocks = parse_blocks(r#"<p><span data-ref="x12">keyed</span></p>"#);
    let Block::Paragraph(p) = &blocks[0] else {
        panic!();
    };
    let Inline::Custom(custom) = &p.children[0] else {
        panic!("expected custom inline, got {:?}", p.children);
    };
    assert_eq!(custom.tag, "annotated_span");
    assert_eq!(
        custom.data.get("data-ref"),
        Some(&serde_json::Value::String("x12".to_string()))
    );
}

#[test]
fn feature_counts_track_structure() {
    let html = "<h1>t</h1><p><a href=\"https://e.com\">l</a></p><ul><li>i</li></ul>";
    let outcome = HtmlParser::new().parse(html.as_bytes()).unwrap();
    let features = outcome.report.features;
    assert_eq!(features.headings, 1);
    assert_eq!(features.hyperlinks, 1);
    assert_eq!(features.lists, 1);
}
