//! OPC package access: zip container, parts, and relationships.

use super::xml::{parse_part, XmlElement};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Main document part every word-processing package must contain.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Relationship part for the main document.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// One relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id ("rId4").
    pub id: String,
    /// Target path, resolved relative to `word/` for internal targets.
    pub target: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target lives outside the package (external hyperlink).
    pub external: bool,
}

/// A word-processing package with its parts read into memory.
#[derive(Debug)]
pub struct Package {
    parts: HashMap<String, Vec<u8>>,
    relationships: HashMap<String, Relationship>,
}

impl Package {
    /// Open a package from bytes. A corrupt archive or a missing main
    /// document part is a container error naming what is missing.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = HashMap::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.insert(name, content);
        }

        if !parts.contains_key(DOCUMENT_PART) {
            return Err(Error::Container(format!(
                "package has no {DOCUMENT_PART} part"
            )));
        }

        let relationships = match parts.get(DOCUMENT_RELS_PART) {
            Some(content) => parse_relationships(content)?,
            None => HashMap::new(),
        };

        Ok(Self {
            parts,
            relationships,
        })
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Parse a part into an element tree.
    pub fn part_xml(&self, name: &str) -> Option<Result<XmlElement>> {
        self.part(name).map(parse_part)
    }

    /// The main document part, parsed. Malformed markup is fatal.
    pub fn document(&self) -> Result<XmlElement> {
        let bytes = self
            .part(DOCUMENT_PART)
            .ok_or_else(|| Error::Container(format!("package has no {DOCUMENT_PART} part")))?;
        parse_part(bytes).map_err(|e| Error::Markup(format!("{DOCUMENT_PART}: {e}")))
    }

    /// Part names starting with a prefix, sorted for deterministic
    /// iteration.
    pub fn parts_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .parts
            .keys()
            .filter(|name| name.starts_with(prefix))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Look up a relationship of the main document by id.
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// Number of relationships of the main document.
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

/// Parse a `.rels` part. Internal targets are normalized relative to
/// `word/`; `TargetMode="External"` entries keep their target untouched.
fn parse_relationships(bytes: &[u8]) -> Result<HashMap<String, Relationship>> {
    let root = parse_part(bytes)
        .map_err(|e| Error::Container(format!("{DOCUMENT_RELS_PART}: {e}")))?;
    let mut rels = HashMap::new();
    for rel in root.children_named("Relationship") {
        let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
            continue;
        };
        let external = rel
            .attr("TargetMode")
            .is_some_and(|mode| mode.eq_ignore_ascii_case("external"));
        let target = if external {
            target.to_string()
        } else {
            resolve_target(target)
        };
        rels.insert(
            id.to_string(),
            Relationship {
                id: id.to_string(),
                target,
                rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                external,
            },
        );
    }
    Ok(rels)
}

/// Resolve an internal relationship target relative to `word/`, handling
/// leading `/` (package-absolute) and `../` segments.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const MINIMAL_DOC: &str = r#"<w:document xmlns:w="ns"><w:body/></w:document>"#;

    #[test]
    fn test_open_minimal_package() {
        let bytes = build_package(&[(DOCUMENT_PART, MINIMAL_DOC)]);
        let package = Package::open(&bytes).unwrap();
        assert!(package.part(DOCUMENT_PART).is_some());
        assert_eq!(package.document().unwrap().name, "document");
    }

    #[test]
    fn test_missing_document_part_is_container_error() {
        let bytes = build_package(&[("word/styles.xml", "<styles/>")]);
        let err = Package::open(&bytes).unwrap_err();
        assert!(matches!(err, Error::Container(_)));
        assert!(err.to_string().contains(DOCUMENT_PART));
    }

    #[test]
    fn test_garbage_bytes_are_container_error() {
        let err = Package::open(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::Container(_)));
    }

    #[test]
    fn test_relationship_targets_resolved() {
        let rels = r#"<Relationships xmlns="ns">
            <Relationship Id="rId1" Type="t/image" Target="media/image1.png"/>
            <Relationship Id="rId2" Type="t/hyperlink" Target="https://example.com/" TargetMode="External"/>
            <Relationship Id="rId3" Type="t/font" Target="../fonts/f.odttf"/>
        </Relationships>"#;
        let bytes = build_package(&[(DOCUMENT_PART, MINIMAL_DOC), (DOCUMENT_RELS_PART, rels)]);
        let package = Package::open(&bytes).unwrap();

        let image = package.relationship("rId1").unwrap();
        assert_eq!(image.target, "word/media/image1.png");
        assert!(!image.external);

        let link = package.relationship("rId2").unwrap();
        assert_eq!(link.target, "https://example.com/");
        assert!(link.external);

        assert_eq!(package.relationship("rId3").unwrap().target, "fonts/f.odttf");
        assert!(package.relationship("rId99").is_none());
    }
}
