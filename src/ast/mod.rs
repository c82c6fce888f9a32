//! Canonical document tree: node types, ids, traversal, and whole-tree
//! operations.

pub mod id;
pub mod map;
pub mod node;
pub mod ops;
pub mod serialize;
pub mod validate;
pub mod walk;

pub use id::{content_id, fresh_id};
pub use map::OrderedMap;
pub use node::{
    inline_text, Alignment, AuxiliaryContent, Block, Blockquote, Bookmark, CodeBlock,
    CommentContent, CommentRef, CropRect, CustomBlock, CustomInline, Document,
    DocumentProperties, Embed, EndnoteRef, Figure, FootnoteRef, HardBreak,
    Heading, HeaderFooter, Hyperlink, Image, ImagePosition, Inline, List,
    ListItem, ListKind, Mark, Math, Metadata, NoteContent, NumberingDefinition,
    NumberingLevel, PageSetup, Paragraph, ParagraphProps, PositionMode,
    Resource, ResourceKind, Revision, RevisionKind, Section, SoftBreak,
    StyleDefinition, Table, TableCell, TableRow, TextRun, ThematicBreak,
    WrapMode, SCHEMA_VERSION,
};
pub use ops::{checksum, clone_with_new_ids};
pub use serialize::{from_json, to_json, to_json_pretty};
pub use validate::{ensure_valid, validate, ValidationIssue};
pub use walk::{find_by_id, find_by_type, walk, NodeRef, PathStep, Walk};
