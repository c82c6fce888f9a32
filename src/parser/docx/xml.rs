//! Lightweight DOM over OOXML part content.
//!
//! OOXML parts are namespace-heavy; elements and attributes are stored by
//! local name so lookups work regardless of prefix choice. Whole parts are
//! small relative to the package, so an owned tree keeps the per-element
//! code simple.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// An element with its attributes and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Local element name, prefix stripped.
    pub name: String,
    /// Attributes by local name, in document order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<XmlNode>,
}

/// Element or text child.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Nested element.
    Element(XmlElement),
    /// Character data, entities decoded.
    Text(String),
}

impl XmlElement {
    /// First attribute value with the given local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// All direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Direct child elements with the given local name.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// Depth-first search for the first descendant with the given local
    /// name, the element itself excluded.
    pub fn first_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Parse one XML part into an element tree rooted at its document
/// element. Malformed markup fails with an XML error naming the cause.
pub fn parse_part(bytes: &[u8]) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(&reader, &e)?);
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&reader, &e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut root, done);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = reader
                        .decoder()
                        .decode(e.as_ref())
                        .map_err(|err| Error::Xml(err.to_string()))?;
                    if !text.is_empty() {
                        append_text(parent, &text);
                    }
                }
            }
            // The reader emits entity references as separate events; text
            // events never contain them.
            Ok(Event::GeneralRef(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let name = e
                        .decode()
                        .map_err(|err| Error::Xml(err.to_string()))?;
                    append_text(parent, &resolve_reference(&name));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = reader
                        .decoder()
                        .decode(e.as_ref())
                        .map_err(|err| Error::Xml(err.to_string()))?;
                    append_text(parent, &text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(Error::Xml(err.to_string())),
        }
    }

    // Unclosed elements at EOF still attach, outermost last.
    while let Some(done) = stack.pop() {
        attach(&mut stack, &mut root, done);
    }

    root.ok_or_else(|| Error::Xml("part has no document element".to_string()))
}

fn element_from_start(
    reader: &Reader<&[u8]>,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<XmlElement> {
    let name = local_str(reader, e.name().local_name().as_ref())?;
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|err| Error::Xml(err.to_string()))?;
        let key = local_str(reader, attr.key.local_name().as_ref())?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| Error::Xml(err.to_string()))?;
        attrs.push((key, value.into_owned()));
    }
    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn local_str(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String> {
    Ok(reader
        .decoder()
        .decode(bytes)
        .map_err(|err| Error::Xml(err.to_string()))?
        .into_owned())
}

/// Append character data, extending an existing trailing text node so a
/// run split by entity references stays one node.
fn append_text(parent: &mut XmlElement, text: &str) {
    if let Some(XmlNode::Text(last)) = parent.children.last_mut() {
        last.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

/// Resolve a general entity reference: the XML builtins and numeric
/// character references. Anything else is kept verbatim.
fn resolve_reference(name: &str) -> String {
    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        other => {
            let code = other.strip_prefix('#').and_then(|digits| {
                match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => digits.parse().ok(),
                }
            });
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => format!("&{other};"),
            }
        }
    }
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    }
}
