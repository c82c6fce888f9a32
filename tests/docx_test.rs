//! DOCX parsing against in-memory packages.

use candoc::ast::{Block, Inline, ListKind, Mark, PositionMode};
use candoc::parser::{DocumentParser, DocxParser};
use candoc::Error;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

const DOCUMENT_PART: &str = "word/document.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";

fn build_package(parts: &[(&str, String)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn document_with_body(body: &str) -> String {
    format!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

fn simple_package(body: &str) -> Vec<u8> {
    build_package(&[(DOCUMENT_PART, document_with_body(body))])
}

#[test]
fn heading_style_maps_to_heading_block() {
    let body = r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    let blocks = &outcome.ast.sections[0].blocks;
    let Block::Heading(h) = &blocks[0] else {
        panic!("expected heading, got {blocks:?}");
    };
    assert_eq!(h.level, 1);
    let Inline::Text(run) = &h.children[0] else {
        panic!("expected text run");
    };
    assert_eq!(run.text, "Title");
    assert_eq!(outcome.report.features.headings, 1);
}

#[test]
fn entity_references_in_run_text_preserved() {
    let body =
        r#"<w:p><w:r><w:t>AT&amp;T &lt;tag&gt; &#x2013; &quot;q&quot;</w:t></w:r></w:p>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    assert_eq!(outcome.ast.plain_text(), "AT&T <tag> \u{2013} \"q\"");
}

#[test]
fn run_formatting_becomes_marks() {
    let body = r#"<w:p><w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>both</w:t></w:r></w:p>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    let Block::Paragraph(p) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    let Inline::Text(run) = &p.children[0] else {
        panic!();
    };
    assert!(run.has_mark(Mark::Bold));
    assert!(run.has_mark(Mark::Italic));
}

#[test]
fn two_row_table_first_row_is_header() {
    let body = r#"<w:tbl>
        <w:tr><w:tc><w:p><w:r><w:t>Row 1</w:t></w:r></w:p></w:tc></w:tr>
        <w:tr><w:tc><w:p><w:r><w:t>Row 2</w:t></w:r></w:p></w:tc></w:tr>
    </w:tbl>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    let Block::Table(table) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    assert_eq!(table.rows.len(), 2);
    assert!(table.rows[0].header);
    assert!(!table.rows[1].header);
    assert_eq!(table.rows[0].cells[0].plain_text(), "Row 1");
}

#[test]
fn vertical_merge_keeps_restart_and_skips_continuation() {
    let body = r#"<w:tbl>
        <w:tr>
          <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>merged</w:t></w:r></w:p></w:tc>
          <w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>
        </w:tr>
        <w:tr>
          <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
          <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>
        </w:tr>
    </w:tbl>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    let Block::Table(table) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    assert_eq!(table.rows[0].cells.len(), 2);
    assert_eq!(table.rows[0].cells[0].rowspan, Some(1));
    // The continuation cell is dropped from the second row.
    assert_eq!(table.rows[1].cells.len(), 1);
    assert_eq!(table.rows[1].cells[0].plain_text(), "b");
}

#[test]
fn drawing_extent_converts_emu_to_pixels() {
    let body = r#"<w:p><w:r><w:drawing>
        <wp:inline xmlns:wp="wpns">
          <wp:extent cx="914400" cy="457200"/>
          <wp:docPr id="1" name="Picture 1" descr="a chart"/>
          <a:graphic xmlns:a="ans"><a:graphicData><pic:pic xmlns:pic="pns">
            <pic:blipFill><a:blip r:embed="rId1" xmlns:r="rns"/></pic:blipFill>
          </pic:pic></a:graphicData></a:graphic>
        </wp:inline>
    </w:drawing></w:r></w:p>"#;
    let rels = r#"<Relationships xmlns="ns">
        <Relationship Id="rId1" Type="t/image" Target="media/image1.png"/>
    </Relationships>"#;
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body(body)),
        (RELS_PART, rels.to_string()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    let Block::Paragraph(p) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    let Inline::Image(image) = &p.children[0] else {
        panic!("expected image, got {:?}", p.children);
    };
    assert_eq!(image.src, "word/media/image1.png");
    assert_eq!(image.width, Some(96.0));
    assert_eq!(image.height, Some(48.0));
    assert_eq!(image.alt.as_deref(), Some("a chart"));
    assert_eq!(
        image.position.as_ref().map(|p| p.mode),
        Some(PositionMode::Inline)
    );

    let resources = outcome.ast.resources.unwrap();
    assert_eq!(resources.get("rId1").unwrap().path, "word/media/image1.png");
}

#[test]
fn unresolved_hyperlink_keeps_text_with_one_warning() {
    let body = r#"<w:p><w:hyperlink r:id="rId9" xmlns:r="rns"><w:r><w:t>click me</w:t></w:r></w:hyperlink></w:p>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    let Block::Paragraph(p) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    assert!(p
        .children
        .iter()
        .all(|inline| !matches!(inline, Inline::Hyperlink(_))));
    assert_eq!(outcome.ast.plain_text(), "click me");
    assert_eq!(outcome.report.warnings.len(), 1);
    assert!(outcome.report.warnings[0].contains("rId9"));
}

#[test]
fn resolved_hyperlink_uses_relationship_target() {
    let body = r#"<w:p><w:hyperlink r:id="rId2" xmlns:r="rns"><w:r><w:t>site</w:t></w:r></w:hyperlink></w:p>"#;
    let rels = r#"<Relationships xmlns="ns">
        <Relationship Id="rId2" Type="t/hyperlink" Target="https://example.com/" TargetMode="External"/>
    </Relationships>"#;
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body(body)),
        (RELS_PART, rels.to_string()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    let Block::Paragraph(p) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    let Inline::Hyperlink(link) = &p.children[0] else {
        panic!();
    };
    assert_eq!(link.href, "https://example.com/");
    assert!(outcome.report.is_clean());
}

#[test]
fn tracked_changes_unwrap_to_accepted_text() {
    let body = r#"<w:p>
        <w:ins w:id="1" w:author="R"><w:r><w:t>added </w:t></w:r></w:ins>
        <w:r><w:t>kept</w:t></w:r>
    </w:p>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    assert_eq!(outcome.ast.plain_text(), "added kept");
    assert_eq!(outcome.report.features.revisions, 1);
}

#[test]
fn omml_math_is_linearized() {
    let body = r#"<w:p><m:oMath xmlns:m="mns">
        <m:f><m:num><m:r><m:t>x</m:t></m:r></m:num><m:den><m:r><m:t>2</m:t></m:r></m:den></m:f>
    </m:oMath></w:p>"#;
    let outcome = DocxParser::new().parse(&simple_package(body)).unwrap();
    let Block::Paragraph(p) = &outcome.ast.sections[0].blocks[0] else {
        panic!();
    };
    let Inline::Math(math) = &p.children[0] else {
        panic!("expected math, got {:?}", p.children);
    };
    assert_eq!(math.source, "(x)/(2)");
    assert_eq!(math.format, "omml");
}

#[test]
fn numbered_paragraphs_group_into_lists() {
    let body = r#"
        <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>first</w:t></w:r></w:p>
        <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>second</w:t></w:r></w:p>
        <w:p><w:r><w:t>after</w:t></w:r></w:p>
    "#;
    let numbering = r#"<w:numbering xmlns:w="wns">
        <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
        <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
    </w:numbering>"#;
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body(body)),
        ("word/numbering.xml", numbering.to_string()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    let blocks = &outcome.ast.sections[0].blocks;
    let Block::List(list) = &blocks[0] else {
        panic!("expected list, got {blocks:?}");
    };
    assert_eq!(list.kind, ListKind::Ordered);
    assert_eq!(list.items.len(), 2);
    assert!(matches!(&blocks[1], Block::Paragraph(_)));
}

#[test]
fn footnotes_parsed_into_auxiliary_content() {
    let body = r#"<w:p><w:r><w:t>claim</w:t></w:r><w:r><w:footnoteReference w:id="2"/></w:r></w:p>"#;
    let footnotes = r#"<w:footnotes xmlns:w="wns">
        <w:footnote w:type="separator" w:id="0"><w:p/></w:footnote>
        <w:footnote w:id="2"><w:p><w:r><w:t>the source</w:t></w:r></w:p></w:footnote>
    </w:footnotes>"#;
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body(body)),
        ("word/footnotes.xml", footnotes.to_string()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    let aux = outcome.ast.auxiliary.unwrap();
    let notes = aux.footnotes.unwrap();
    assert!(notes.contains_key("2"));
    // Separator pseudo-notes are not carried.
    assert!(!notes.contains_key("0"));
    assert_eq!(outcome.report.features.footnotes, 1);
}

#[test]
fn header_and_footer_parts_parsed_into_auxiliary_content() {
    let header = r#"<w:hdr xmlns:w="ns"><w:p><w:r><w:t>Top</w:t></w:r></w:p></w:hdr>"#;
    let footer = r#"<w:ftr xmlns:w="ns"><w:p><w:r><w:t>Bottom</w:t></w:r></w:p></w:ftr>"#;
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body("<w:p/>")),
        ("word/header1.xml", header.to_string()),
        ("word/footer1.xml", footer.to_string()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    let aux = outcome.ast.auxiliary.as_ref().unwrap();

    let headers = aux.headers.as_ref().unwrap();
    let body = headers.get("header1").unwrap();
    assert!(matches!(body.blocks[0], Block::Paragraph(_)));
    assert_eq!(body.blocks[0].plain_text(), "Top");

    let footers = aux.footers.as_ref().unwrap();
    assert_eq!(footers.get("footer1").unwrap().blocks.len(), 1);
}

#[test]
fn core_properties_populate_title_and_author() {
    let core = r#"<cp:coreProperties xmlns:cp="cpns" xmlns:dc="dcns">
        <dc:title>Quarterly Report</dc:title>
        <dc:creator>A. Writer</dc:creator>
    </cp:coreProperties>"#;
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body("<w:p/>")),
        ("docProps/core.xml", core.to_string()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    let properties = outcome.ast.properties.unwrap();
    assert_eq!(properties.title.as_deref(), Some("Quarterly Report"));
    assert_eq!(properties.author.as_deref(), Some("A. Writer"));
}

#[test]
fn missing_document_part_is_fatal_container_error() {
    let bytes = build_package(&[("word/styles.xml", "<styles/>".to_string())]);
    let err = DocxParser::new().parse(&bytes).unwrap_err();
    assert!(matches!(err, Error::Container(_)));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("word/document.xml"));
}

#[test]
fn malformed_document_part_is_fatal_markup_error() {
    let bytes = build_package(&[(DOCUMENT_PART, String::new())]);
    let err = DocxParser::new().parse(&bytes).unwrap_err();
    assert!(matches!(err, Error::Markup(_)));
    assert!(err.is_fatal());
}

#[test]
fn broken_styles_part_degrades_to_warning() {
    let bytes = build_package(&[
        (DOCUMENT_PART, document_with_body("<w:p><w:r><w:t>ok</w:t></w:r></w:p>")),
        ("word/styles.xml", String::new()),
    ]);
    let outcome = DocxParser::new().parse(&bytes).unwrap();
    assert_eq!(outcome.ast.plain_text(), "ok");
    assert!(outcome
        .report
        .warnings
        .iter()
        .any(|w| w.contains("styles")));
}

#[test]
fn validate_checks_container_shape() {
    let parser = DocxParser::new();
    assert!(!parser.validate(b"not a zip").valid);
    let bytes = build_package(&[(DOCUMENT_PART, document_with_body(""))]);
    assert!(parser.validate(&bytes).valid);
}
