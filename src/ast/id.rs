//! Node id generation.
//!
//! Every node carries a string id unique within one document. Ids combine
//! an opaque per-process session tag with a monotonic counter, so two
//! pipelines sharing memory cannot hand out colliding ids. Fixtures that
//! need reproducible trees can use [`content_id`] instead, which derives a
//! deterministic id from content.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

static SESSION_TAG: OnceLock<String> = OnceLock::new();
static COUNTER: AtomicU64 = AtomicU64::new(1);

fn session_tag() -> &'static str {
    SESSION_TAG.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let mut hasher = Sha256::new();
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        let digest = hasher.finalize();
        hex_prefix(&digest, 8)
    })
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in bytes {
        if out.len() >= chars {
            break;
        }
        out.push_str(&format!("{:02x}", byte));
    }
    out.truncate(chars);
    out
}

/// Generate a fresh node id, unique within the process and opaque across
/// processes.
pub fn fresh_id() -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", session_tag(), n)
}

/// Derive a deterministic id from content, for reproducible fixtures.
pub fn content_id(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    format!("c-{}", hex_prefix(&digest, 12))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| fresh_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_fresh_id_shape() {
        let id = fresh_id();
        let (tag, n) = id.split_once('-').unwrap();
        assert_eq!(tag.len(), 8);
        assert!(n.parse::<u64>().is_ok());
    }

    #[test]
    fn test_content_id_deterministic() {
        assert_eq!(content_id("Title"), content_id("Title"));
        assert_ne!(content_id("Title"), content_id("title"));
        assert!(content_id("x").starts_with("c-"));
    }
}
