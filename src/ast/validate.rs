//! Structural validation of a document tree.
//!
//! Parsers built in this crate produce valid trees by construction; this
//! pass exists for documents decoded from JSON or assembled by hand.

use super::node::{Block, Document, Inline};
use super::walk::{walk, NodeRef, Walk};
use crate::error::{Error, Result};
use std::collections::HashSet;

/// One structural violation found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Id of the offending node.
    pub node_id: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.node_id, self.message)
    }
}

/// Collect every structural violation in the tree. An empty result means
/// the document is valid.
pub fn validate(doc: &Document) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    walk(doc, &mut |node, _, _| {
        let id = node.id();
        if id.is_empty() {
            issues.push(ValidationIssue {
                node_id: String::new(),
                message: format!("{} node has an empty id", node.type_name()),
            });
        } else if !seen_ids.insert(id) {
            issues.push(ValidationIssue {
                node_id: id.to_string(),
                message: "duplicate node id".to_string(),
            });
        }

        match node {
            NodeRef::Block(Block::Heading(h)) => {
                if h.level < 1 || h.level > 6 {
                    issues.push(ValidationIssue {
                        node_id: h.id.clone(),
                        message: format!("heading level {} outside 1..=6", h.level),
                    });
                }
            }
            NodeRef::TableCell(cell) => {
                if cell.colspan == Some(0) {
                    issues.push(ValidationIssue {
                        node_id: cell.id.clone(),
                        message: "colspan must be at least 1".to_string(),
                    });
                }
                if cell.rowspan == Some(0) {
                    issues.push(ValidationIssue {
                        node_id: cell.id.clone(),
                        message: "rowspan must be at least 1".to_string(),
                    });
                }
            }
            NodeRef::Inline(Inline::FootnoteRef(note_ref)) => {
                let resolved = doc
                    .auxiliary
                    .as_ref()
                    .and_then(|aux| aux.footnotes.as_ref())
                    .is_some_and(|notes| notes.contains_key(&note_ref.note_id));
                if !resolved {
                    issues.push(ValidationIssue {
                        node_id: note_ref.id.clone(),
                        message: format!("footnote reference to unknown note {}", note_ref.note_id),
                    });
                }
            }
            NodeRef::Inline(Inline::EndnoteRef(note_ref)) => {
                let resolved = doc
                    .auxiliary
                    .as_ref()
                    .and_then(|aux| aux.endnotes.as_ref())
                    .is_some_and(|notes| notes.contains_key(&note_ref.note_id));
                if !resolved {
                    issues.push(ValidationIssue {
                        node_id: note_ref.id.clone(),
                        message: format!("endnote reference to unknown note {}", note_ref.note_id),
                    });
                }
            }
            _ => {}
        }
        Walk::Continue
    });

    issues
}

/// Validate and fail with a fatal error naming the first violations.
pub fn ensure_valid(doc: &Document) -> Result<()> {
    let issues = validate(doc);
    if issues.is_empty() {
        return Ok(());
    }
    let listed = issues
        .iter()
        .take(5)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::Validation(format!(
        "{} structural issue(s): {listed}",
        issues.len()
    )))
}
