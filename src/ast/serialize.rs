//! JSON serialization of the document tree.
//!
//! The wire shape is stable: tagged block and inline variants, ordered
//! maps wrapped as `{"__type": "Map", "data": [...]}`, and optional
//! fields omitted when absent. `from_json` accepts documents produced by
//! any encoder emitting the same shape.

use super::node::Document;
use crate::error::{Error, Result};

/// Serialize a document to compact JSON.
pub fn to_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

/// Serialize a document to human-readable JSON.
pub fn to_json_pretty(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Deserialize a document from JSON. Schema violations surface as
/// validation errors naming the serde failure.
pub fn from_json(json: &str) -> Result<Document> {
    serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("document decode failed: {e}")))
}
