//! Insertion-ordered dictionary used for styles, numbering, resources, and
//! auxiliary content.
//!
//! Canonical JSON encodes these as a tagged wrapper,
//! `{"__type":"Map","data":[[key,value],...]}`, so insertion order and key
//! uniqueness survive a round trip. Decoders special-case the tag.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A dictionary that preserves insertion order and enforces key uniqueness.
///
/// Inserting an existing key replaces the value in place, keeping its
/// original position.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a key/value pair, replacing in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Mutable iteration in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[derive(Serialize)]
struct TaggedRef<'a, V> {
    #[serde(rename = "__type")]
    tag: &'static str,
    data: Vec<(&'a str, &'a V)>,
}

#[derive(Deserialize)]
struct TaggedOwned<V> {
    #[serde(rename = "__type")]
    tag: String,
    data: Vec<(String, V)>,
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedRef {
            tag: "Map",
            data: self.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tagged = TaggedOwned::<V>::deserialize(deserializer)?;
        if tagged.tag != "Map" {
            return Err(D::Error::custom(format!(
                "expected ordered map tag \"Map\", found \"{}\"",
                tagged.tag
            )));
        }
        Ok(tagged.data.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut map = OrderedMap::new();
        map.insert("z", 1);
        map.insert("a", 2);
        map.insert("m", 3);

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut map = OrderedMap::new();
        map.insert("first", 1);
        map.insert("second", 2);
        map.insert("first", 10);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("first"), Some(&10));
        assert_eq!(map.keys().next(), Some("first"));
    }

    #[test]
    fn test_json_wrapper_roundtrip() {
        let mut map = OrderedMap::new();
        map.insert("b", "two".to_string());
        map.insert("a", "one".to_string());

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"__type\":\"Map\""));
        assert!(json.contains("[\"b\",\"two\"],[\"a\",\"one\"]"));

        let back: OrderedMap<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_json_wrapper_rejects_bad_tag() {
        let result: Result<OrderedMap<i32>, _> =
            serde_json::from_str(r#"{"__type":"Set","data":[]}"#);
        assert!(result.is_err());
    }
}
