//! Canonical document tree node types.
//!
//! The tree is a closed set of variants: a [`Document`] holds [`Section`]s,
//! sections hold [`Block`]s, and blocks hold [`Inline`] content. No node can
//! claim a type outside the enumerated set once parsing completes; malformed
//! or unknown input degrades to a paragraph instead.
//!
//! Nodes are values. A `Document` is constructed once per parse and owned by
//! the caller; renderers treat it as read-only.

use super::id::fresh_id;
use super::map::OrderedMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version stamped into every new document's metadata.
pub const SCHEMA_VERSION: &str = "1.0";

fn is_false(v: &bool) -> bool {
    !*v
}

/// Root of the canonical document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Node id, unique within the document.
    pub id: String,

    /// Volatile metadata (schema version, creation time, source format).
    pub metadata: Metadata,

    /// Document properties (title, author, page setup).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub properties: Option<DocumentProperties>,

    /// Style definitions keyed by style id, insertion order preserved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub styles: Option<OrderedMap<StyleDefinition>>,

    /// Numbering definitions keyed by id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub numbering: Option<OrderedMap<NumberingDefinition>>,

    /// Ordered sections of block content.
    pub sections: Vec<Section>,

    /// Embedded resources (images, fonts, files) keyed by id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resources: Option<OrderedMap<Resource>>,

    /// Auxiliary content: footnotes, endnotes, comments, revisions,
    /// headers and footers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auxiliary: Option<AuxiliaryContent>,
}

impl Document {
    /// Create an empty document tagged with its source format.
    pub fn new(source_format: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            metadata: Metadata::new(source_format),
            properties: None,
            styles: None,
            numbering: None,
            sections: Vec::new(),
            resources: None,
            auxiliary: None,
        }
    }

    /// Append a section.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Register a resource, creating the resource table on first use.
    pub fn add_resource(&mut self, resource: Resource) {
        self.resources
            .get_or_insert_with(OrderedMap::new)
            .insert(resource.id.clone(), resource);
    }

    /// True when the document holds no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Plain text of the whole document, sections joined by blank lines.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Volatile document metadata, excluded from content checksums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Schema version of the tree encoding.
    pub schema_version: String,

    /// Creation time of this tree (not of the source document).
    pub created: DateTime<Utc>,

    /// Source format tag ("docx", "html", ...).
    pub source_format: String,

    /// Optional content checksum stamped by callers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub checksum: Option<String>,
}

impl Metadata {
    /// Create metadata stamped with the current time.
    pub fn new(source_format: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created: Utc::now(),
            source_format: source_format.into(),
            checksum: None,
        }
    }
}

/// Document-level properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,

    /// Document author.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,

    /// Page geometry in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page_setup: Option<PageSetup>,
}

/// Page geometry, converted from source twips to points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    /// Page width in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width_pt: Option<f64>,
    /// Page height in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height_pt: Option<f64>,
    /// Top margin in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub margin_top_pt: Option<f64>,
    /// Bottom margin in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub margin_bottom_pt: Option<f64>,
    /// Left margin in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub margin_left_pt: Option<f64>,
    /// Right margin in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub margin_right_pt: Option<f64>,
}

/// A named style definition carried over from the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    /// Style id as given by the source.
    pub id: String,
    /// Human-readable style name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Parent style id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub based_on: Option<String>,
    /// Style type tag ("paragraph", "character", "table").
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub style_type: Option<String>,
}

/// A numbering (list) definition carried over from the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingDefinition {
    /// Numbering id as given by the source.
    pub id: String,
    /// Per-level formats.
    pub levels: Vec<NumberingLevel>,
}

/// One level of a numbering definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingLevel {
    /// Nesting level, 0-based.
    pub level: u32,
    /// Number format ("decimal", "bullet", "lowerRoman", ...).
    pub format: String,
    /// Level text template when present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
}

/// An embedded resource referenced from the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource id (relationship id for DOCX sources).
    pub id: String,
    /// Path within the source container or external URL.
    pub path: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// MIME content type when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_type: Option<String>,
}

/// Kind of an embedded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Raster or vector image.
    Image,
    /// Embedded font.
    Font,
    /// Other embedded file.
    File,
}

/// Auxiliary content referenced from the body by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryContent {
    /// Footnote bodies keyed by footnote id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub footnotes: Option<OrderedMap<NoteContent>>,
    /// Endnote bodies keyed by endnote id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub endnotes: Option<OrderedMap<NoteContent>>,
    /// Comment bodies keyed by comment id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comments: Option<OrderedMap<CommentContent>>,
    /// Tracked revisions keyed by revision id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub revisions: Option<OrderedMap<Revision>>,
    /// Header bodies keyed by id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub headers: Option<OrderedMap<HeaderFooter>>,
    /// Footer bodies keyed by id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub footers: Option<OrderedMap<HeaderFooter>>,
}

impl AuxiliaryContent {
    /// True when no auxiliary collections are present.
    pub fn is_empty(&self) -> bool {
        self.footnotes.is_none()
            && self.endnotes.is_none()
            && self.comments.is_none()
            && self.revisions.is_none()
            && self.headers.is_none()
            && self.footers.is_none()
    }
}

/// Body of a footnote or endnote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteContent {
    /// Node id.
    pub id: String,
    /// Note body blocks.
    pub blocks: Vec<Block>,
}

/// Body of a comment with its attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentContent {
    /// Node id.
    pub id: String,
    /// Comment author.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,
    /// Comment date as given by the source.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<String>,
    /// Comment body blocks.
    pub blocks: Vec<Block>,
}

/// A tracked revision. The DOCX parser currently unwraps revision markers
/// and discards this metadata; the type stays in the model so the behavior
/// can be completed without a schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Node id.
    pub id: String,
    /// Insert or delete.
    pub kind: RevisionKind,
    /// Revision author.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,
    /// Revision date as given by the source.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<String>,
    /// Revised inline content.
    pub content: Vec<Inline>,
}

/// Kind of a tracked revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    /// Inserted content.
    Insert,
    /// Deleted content.
    Delete,
}

/// Header or footer body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderFooter {
    /// Node id.
    pub id: String,
    /// Body blocks.
    pub blocks: Vec<Block>,
}

/// An ordered run of block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Node id.
    pub id: String,
    /// Block children in document order.
    pub blocks: Vec<Block>,
}

impl Section {
    /// Create a section from blocks.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            id: fresh_id(),
            blocks,
        }
    }

    /// Plain text of the section, blocks joined by blank lines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.plain_text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Block-level content. Closed variant set; unknown source constructs
/// degrade to `Paragraph` during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Ordinary paragraph.
    Paragraph(Paragraph),
    /// Heading, level 1-6.
    Heading(Heading),
    /// Ordered, unordered, or description list.
    List(List),
    /// Table of rows and cells.
    Table(Table),
    /// Figure with optional image and caption.
    Figure(Figure),
    /// Preformatted code.
    CodeBlock(CodeBlock),
    /// Quoted block content.
    Blockquote(Blockquote),
    /// Thematic break / horizontal divider.
    ThematicBreak(ThematicBreak),
    /// Extension escape hatch: opaque type tag plus data map.
    Custom(CustomBlock),
}

impl Block {
    /// Node id of this block.
    pub fn id(&self) -> &str {
        match self {
            Block::Paragraph(n) => &n.id,
            Block::Heading(n) => &n.id,
            Block::List(n) => &n.id,
            Block::Table(n) => &n.id,
            Block::Figure(n) => &n.id,
            Block::CodeBlock(n) => &n.id,
            Block::Blockquote(n) => &n.id,
            Block::ThematicBreak(n) => &n.id,
            Block::Custom(n) => &n.id,
        }
    }

    /// Plain text of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => inline_text(&p.children),
            Block::Heading(h) => inline_text(&h.children),
            Block::List(l) => l
                .items
                .iter()
                .map(|item| {
                    item.blocks
                        .iter()
                        .map(|b| b.plain_text())
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Table(t) => t
                .rows
                .iter()
                .map(|row| {
                    row.cells
                        .iter()
                        .map(|c| c.plain_text())
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Figure(f) => f.caption.as_deref().map(inline_text).unwrap_or_default(),
            Block::CodeBlock(c) => c.code.clone(),
            Block::Blockquote(q) => q
                .blocks
                .iter()
                .map(|b| b.plain_text())
                .collect::<Vec<_>>()
                .join("\n"),
            Block::ThematicBreak(_) => String::new(),
            Block::Custom(c) => c
                .blocks
                .iter()
                .map(|b| b.plain_text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Plain text of a run of inline content.
pub fn inline_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(run) => out.push_str(&run.text),
            Inline::HardBreak(_) | Inline::SoftBreak(_) => out.push('\n'),
            Inline::Hyperlink(link) => out.push_str(&inline_text(&link.children)),
            Inline::Image(img) => {
                if let Some(alt) = &img.alt {
                    out.push_str(alt);
                }
            }
            Inline::Math(m) => out.push_str(&m.source),
            Inline::FootnoteRef(_)
            | Inline::EndnoteRef(_)
            | Inline::CommentRef(_)
            | Inline::Bookmark(_)
            | Inline::Embed(_)
            | Inline::Custom(_) => {}
        }
    }
    out
}

/// Paragraph of inline content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Node id.
    pub id: String,
    /// Inline children.
    pub children: Vec<Inline>,
    /// Paragraph-level properties.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub props: Option<ParagraphProps>,
}

impl Paragraph {
    /// Create a paragraph from inline children.
    pub fn new(children: Vec<Inline>) -> Self {
        Self {
            id: fresh_id(),
            children,
            props: None,
        }
    }

    /// Create a paragraph holding a single unstyled text run.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![Inline::Text(TextRun::new(text))])
    }

    /// True when the paragraph has no non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() || inline_text(&self.children).trim().is_empty()
    }
}

/// Heading with a clamped level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Node id.
    pub id: String,
    /// Heading level, always within 1..=6.
    pub level: u8,
    /// Inline children.
    pub children: Vec<Inline>,
    /// Paragraph-level properties.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub props: Option<ParagraphProps>,
}

impl Heading {
    /// Create a heading; the level is clamped into 1..=6.
    pub fn new(level: u8, children: Vec<Inline>) -> Self {
        Self {
            id: fresh_id(),
            level: level.clamp(1, 6),
            children,
            props: None,
        }
    }

    /// Create a heading holding a single text run.
    pub fn with_text(level: u8, text: impl Into<String>) -> Self {
        Self::new(level, vec![Inline::Text(TextRun::new(text))])
    }
}

/// Paragraph-level layout properties, lengths in points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphProps {
    /// Text alignment.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alignment: Option<Alignment>,
    /// Left indent in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub indent_pt: Option<f64>,
    /// First-line indent in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub first_line_indent_pt: Option<f64>,
    /// Space before the paragraph in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spacing_before_pt: Option<f64>,
    /// Space after the paragraph in points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spacing_after_pt: Option<f64>,
    /// Line spacing multiplier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_spacing: Option<f64>,
    /// Force a page break before this paragraph.
    #[serde(skip_serializing_if = "is_false", default)]
    pub page_break_before: bool,
    /// Keep on the same page as the next paragraph.
    #[serde(skip_serializing_if = "is_false", default)]
    pub keep_with_next: bool,
    /// Keep all lines on one page.
    #[serde(skip_serializing_if = "is_false", default)]
    pub keep_lines_together: bool,
    /// Widow/orphan control.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub widow_control: Option<bool>,
}

impl ParagraphProps {
    /// True when no property deviates from the default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default).
    #[default]
    Left,
    /// Center alignment.
    Center,
    /// Right alignment.
    Right,
    /// Justified alignment.
    Justify,
}

/// A list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Node id.
    pub id: String,
    /// List kind.
    pub kind: ListKind,
    /// Items in order.
    pub items: Vec<ListItem>,
    /// Starting number for ordered lists.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start: Option<u32>,
}

impl List {
    /// Create a list.
    pub fn new(kind: ListKind, items: Vec<ListItem>) -> Self {
        Self {
            id: fresh_id(),
            kind,
            items,
            start: None,
        }
    }
}

/// List kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Numbered list.
    Ordered,
    /// Bulleted list.
    Unordered,
    /// Term/description pairs.
    Description,
}

/// One list item: block children, plus a term for description lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Node id.
    pub id: String,
    /// Term content (description lists only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub term: Option<Vec<Inline>>,
    /// Item body blocks.
    pub blocks: Vec<Block>,
}

impl ListItem {
    /// Create a list item from blocks.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            id: fresh_id(),
            term: None,
            blocks,
        }
    }
}

/// A table of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Node id.
    pub id: String,
    /// Rows in order.
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a table from rows.
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            id: fresh_id(),
            rows,
        }
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column count of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Node id.
    pub id: String,
    /// Cells in order.
    pub cells: Vec<TableCell>,
    /// Marked as a header row by the source.
    #[serde(skip_serializing_if = "is_false", default)]
    pub header: bool,
}

impl TableRow {
    /// Create a row from cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            id: fresh_id(),
            cells,
            header: false,
        }
    }
}

/// One table cell holding block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Node id.
    pub id: String,
    /// Cell content blocks.
    pub blocks: Vec<Block>,
    /// Horizontal span, >= 1 when present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub colspan: Option<u32>,
    /// Vertical span, >= 1 when present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rowspan: Option<u32>,
    /// Cell alignment.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alignment: Option<Alignment>,
}

impl TableCell {
    /// Create a cell from blocks.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            id: fresh_id(),
            blocks,
            colspan: None,
            rowspan: None,
            alignment: None,
        }
    }

    /// Create a cell holding one paragraph of text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![Block::Paragraph(Paragraph::with_text(text))])
    }

    /// Plain text of the cell content.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.plain_text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A figure wrapping an image with an optional caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Node id.
    pub id: String,
    /// The figure image when present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<Image>,
    /// Caption inline content.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub caption: Option<Vec<Inline>>,
}

impl Figure {
    /// Create a figure.
    pub fn new(image: Option<Image>, caption: Option<Vec<Inline>>) -> Self {
        Self {
            id: fresh_id(),
            image,
            caption,
        }
    }
}

/// Preformatted code content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Node id.
    pub id: String,
    /// Verbatim code text.
    pub code: String,
    /// Language hint when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,
}

impl CodeBlock {
    /// Create a code block.
    pub fn new(code: impl Into<String>, language: Option<String>) -> Self {
        Self {
            id: fresh_id(),
            code: code.into(),
            language,
        }
    }
}

/// Quoted block content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blockquote {
    /// Node id.
    pub id: String,
    /// Quoted blocks.
    pub blocks: Vec<Block>,
}

impl Blockquote {
    /// Create a blockquote.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            id: fresh_id(),
            blocks,
        }
    }
}

/// Thematic break / horizontal divider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThematicBreak {
    /// Node id.
    pub id: String,
}

impl ThematicBreak {
    /// Create a thematic break.
    pub fn new() -> Self {
        Self { id: fresh_id() }
    }
}

impl Default for ThematicBreak {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension block: opaque type tag plus data map plus optional children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomBlock {
    /// Node id.
    pub id: String,
    /// Opaque extension type tag.
    pub tag: String,
    /// Extension data, insertion order preserved.
    pub data: OrderedMap<serde_json::Value>,
    /// Optional block children.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub blocks: Vec<Block>,
}

impl CustomBlock {
    /// Create a custom block.
    pub fn new(tag: impl Into<String>, data: OrderedMap<serde_json::Value>) -> Self {
        Self {
            id: fresh_id(),
            tag: tag.into(),
            data,
            blocks: Vec::new(),
        }
    }
}

/// Inline-level content. Closed variant set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// Text run with stackable marks.
    Text(TextRun),
    /// Explicit line break.
    HardBreak(HardBreak),
    /// Soft wrap opportunity.
    SoftBreak(SoftBreak),
    /// Hyperlink wrapping inline children.
    Hyperlink(Hyperlink),
    /// Inline image.
    Image(Image),
    /// Math with linearized source text.
    Math(Math),
    /// Reference to a footnote body.
    FootnoteRef(FootnoteRef),
    /// Reference to an endnote body.
    EndnoteRef(EndnoteRef),
    /// Reference to a comment body.
    CommentRef(CommentRef),
    /// Named bookmark anchor.
    Bookmark(Bookmark),
    /// Embedded external object.
    Embed(Embed),
    /// Extension escape hatch.
    Custom(CustomInline),
}

impl Inline {
    /// Node id of this inline.
    pub fn id(&self) -> &str {
        match self {
            Inline::Text(n) => &n.id,
            Inline::HardBreak(n) => &n.id,
            Inline::SoftBreak(n) => &n.id,
            Inline::Hyperlink(n) => &n.id,
            Inline::Image(n) => &n.id,
            Inline::Math(n) => &n.id,
            Inline::FootnoteRef(n) => &n.id,
            Inline::EndnoteRef(n) => &n.id,
            Inline::CommentRef(n) => &n.id,
            Inline::Bookmark(n) => &n.id,
            Inline::Embed(n) => &n.id,
            Inline::Custom(n) => &n.id,
        }
    }
}

/// A run of text with an ordered list of stackable marks.
///
/// An absent mark list and an empty one are deliberately distinct on the
/// wire; helpers keep the list absent rather than empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Node id.
    pub id: String,
    /// Text content.
    pub text: String,
    /// Format marks, absent when unstyled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub marks: Option<Vec<Mark>>,
}

impl TextRun {
    /// Create an unstyled text run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            text: text.into(),
            marks: None,
        }
    }

    /// Create a text run with marks. An empty mark list becomes `None`.
    pub fn with_marks(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            id: fresh_id(),
            text: text.into(),
            marks: if marks.is_empty() { None } else { Some(marks) },
        }
    }

    /// Check whether a mark of the given type is present.
    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks
            .as_ref()
            .is_some_and(|marks| marks.contains(&mark))
    }

    /// Add a mark. No-op if an equal-type mark already exists.
    pub fn add_mark(&mut self, mark: Mark) {
        if self.has_mark(mark) {
            return;
        }
        self.marks.get_or_insert_with(Vec::new).push(mark);
    }

    /// Remove a mark. Removing the last mark leaves the list absent, not
    /// empty.
    pub fn remove_mark(&mut self, mark: Mark) {
        if let Some(marks) = &mut self.marks {
            marks.retain(|m| *m != mark);
            if marks.is_empty() {
                self.marks = None;
            }
        }
    }
}

/// A stackable, order-independent text format annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    /// Bold.
    Bold,
    /// Italic.
    Italic,
    /// Underline.
    Underline,
    /// Strikethrough.
    Strikethrough,
    /// Inline code.
    Code,
    /// Subscript.
    Subscript,
    /// Superscript.
    Superscript,
    /// Highlight.
    Highlight,
    /// Small caps.
    SmallCaps,
    /// Hidden text.
    Hidden,
}

/// Explicit line break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardBreak {
    /// Node id.
    pub id: String,
}

impl HardBreak {
    /// Create a hard break.
    pub fn new() -> Self {
        Self { id: fresh_id() }
    }
}

impl Default for HardBreak {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft wrap opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftBreak {
    /// Node id.
    pub id: String,
}

impl SoftBreak {
    /// Create a soft break.
    pub fn new() -> Self {
        Self { id: fresh_id() }
    }
}

impl Default for SoftBreak {
    fn default() -> Self {
        Self::new()
    }
}

/// Hyperlink wrapping inline children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Node id.
    pub id: String,
    /// Resolved target, `#fragment` for internal anchors.
    pub href: String,
    /// Internal anchor name when the link is internal.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor: Option<String>,
    /// Inline children.
    pub children: Vec<Inline>,
}

impl Hyperlink {
    /// Create a hyperlink to an external target.
    pub fn new(href: impl Into<String>, children: Vec<Inline>) -> Self {
        Self {
            id: fresh_id(),
            href: href.into(),
            anchor: None,
            children,
        }
    }

    /// Create a hyperlink to an internal anchor; the href is the
    /// `#`-prefixed fragment.
    pub fn to_anchor(anchor: impl Into<String>, children: Vec<Inline>) -> Self {
        let anchor = anchor.into();
        Self {
            id: fresh_id(),
            href: format!("#{anchor}"),
            anchor: Some(anchor),
            children,
        }
    }
}

/// An image reference with optional geometry and positioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Node id.
    pub id: String,
    /// Resource path or URL.
    pub src: String,
    /// Alternative text.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alt: Option<String>,
    /// Display width in pixels at 96 DPI.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<f64>,
    /// Display height in pixels at 96 DPI.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<f64>,
    /// Inline or floating-anchor positioning.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<ImagePosition>,
    /// Crop rectangle as source fractions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub crop: Option<CropRect>,
    /// Rotation in degrees.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotation: Option<f64>,
}

impl Image {
    /// Create an image reference.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            src: src.into(),
            alt: None,
            width: None,
            height: None,
            position: None,
            crop: None,
            rotation: None,
        }
    }
}

/// Image placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePosition {
    /// Inline with text or floating anchor.
    pub mode: PositionMode,
    /// Horizontal offset in pixels (anchored images).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset_x: Option<f64>,
    /// Vertical offset in pixels (anchored images).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset_y: Option<f64>,
    /// Text wrap mode.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wrap: Option<WrapMode>,
    /// Render behind document text.
    #[serde(skip_serializing_if = "is_false", default)]
    pub behind_text: bool,
    /// Allow overlap with other anchored objects.
    #[serde(skip_serializing_if = "is_false", default)]
    pub allow_overlap: bool,
}

/// Inline or floating-anchor placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Flows with the text.
    #[default]
    Inline,
    /// Anchored at an offset from the paragraph.
    Anchor,
}

/// Text wrap mode around an anchored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    /// Wrap around the bounding box.
    Square,
    /// Wrap tight to the image outline.
    Tight,
    /// Text only above and below.
    TopAndBottom,
    /// No wrapping.
    None,
    /// Inline with text.
    Inline,
}

/// Crop rectangle as fractions of the source image (0.0 - 1.0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Cropped fraction from the left edge.
    pub left: f64,
    /// Cropped fraction from the top edge.
    pub top: f64,
    /// Cropped fraction from the right edge.
    pub right: f64,
    /// Cropped fraction from the bottom edge.
    pub bottom: f64,
}

/// Math content linearized to a textual source string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Math {
    /// Node id.
    pub id: String,
    /// Linearized, infix-like source text.
    pub source: String,
    /// Source format tag ("omml", "latex", ...).
    pub format: String,
}

impl Math {
    /// Create a math inline.
    pub fn new(source: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            source: source.into(),
            format: format.into(),
        }
    }
}

/// Reference to a footnote body in the auxiliary content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteRef {
    /// Node id.
    pub id: String,
    /// Footnote id in `auxiliary.footnotes`.
    pub note_id: String,
}

impl FootnoteRef {
    /// Create a footnote reference.
    pub fn new(note_id: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            note_id: note_id.into(),
        }
    }
}

/// Reference to an endnote body in the auxiliary content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndnoteRef {
    /// Node id.
    pub id: String,
    /// Endnote id in `auxiliary.endnotes`.
    pub note_id: String,
}

impl EndnoteRef {
    /// Create an endnote reference.
    pub fn new(note_id: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            note_id: note_id.into(),
        }
    }
}

/// Reference to a comment body in the auxiliary content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRef {
    /// Node id.
    pub id: String,
    /// Comment id in `auxiliary.comments`.
    pub comment_id: String,
}

impl CommentRef {
    /// Create a comment reference.
    pub fn new(comment_id: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            comment_id: comment_id.into(),
        }
    }
}

/// Named bookmark anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Node id.
    pub id: String,
    /// Bookmark name.
    pub name: String,
}

impl Bookmark {
    /// Create a bookmark.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
        }
    }
}

/// Embedded external object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    /// Node id.
    pub id: String,
    /// Source path or URL.
    pub src: String,
    /// Embed type tag when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub embed_type: Option<String>,
}

impl Embed {
    /// Create an embed.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            src: src.into(),
            embed_type: None,
        }
    }
}

/// Extension inline: opaque type tag plus data map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomInline {
    /// Node id.
    pub id: String,
    /// Opaque extension type tag.
    pub tag: String,
    /// Extension data, insertion order preserved.
    pub data: OrderedMap<serde_json::Value>,
}

impl CustomInline {
    /// Create a custom inline.
    pub fn new(tag: impl Into<String>, data: OrderedMap<serde_json::Value>) -> Self {
        Self {
            id: fresh_id(),
            tag: tag.into(),
            data,
        }
    }
}
