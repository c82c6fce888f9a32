//! JSON renderer.
//!
//! Serializes the canonical tree itself, so output from this renderer
//! can be loaded back with [`crate::ast::from_json`].

use super::{DocumentRenderer, RenderMetadata, RenderOptions, RenderOutcome};
use crate::ast::{to_json, to_json_pretty, walk, Document, Walk};
use crate::error::Result;
use std::time::Instant;

/// Renderer producing the canonical JSON encoding.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Create a renderer instance.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for JsonRenderer {
    fn supported_format(&self) -> &'static str {
        "json"
    }

    fn render(&self, doc: &Document, options: &RenderOptions) -> Result<RenderOutcome> {
        let started = Instant::now();
        let output = if options.json_pretty {
            to_json_pretty(doc)?
        } else {
            to_json(doc)?
        };
        let mut node_count = 0;
        walk(doc, &mut |_, _, _| {
            node_count += 1;
            Walk::Continue
        });
        Ok(RenderOutcome {
            output,
            metadata: RenderMetadata {
                node_count,
                render_time_ms: started.elapsed().as_millis() as u64,
                ..Default::default()
            },
        })
    }
}
