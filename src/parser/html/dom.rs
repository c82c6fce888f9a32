//! Lenient HTML DOM construction.
//!
//! Real-world HTML is rarely well formed, so the builder tolerates
//! unclosed elements, stray end tags, and unknown entities: void elements
//! self-close, unmatched end tags are dropped, and end of input closes
//! whatever remains open. Only a reader-level failure is a markup error.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// An HTML element with lowercase name, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    /// Lowercase tag name.
    pub name: String,
    /// Attributes in document order, names lowercased.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<HtmlNode>,
}

/// Element or text child.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    /// Nested element.
    Element(HtmlElement),
    /// Character data with entities decoded.
    Text(String),
}

impl HtmlElement {
    /// First attribute value with the given name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Space-separated class list.
    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Concatenated descendant text.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                HtmlNode::Text(t) => out.push_str(t),
                HtmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Elements that never have content and need no end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// HTML's implied end tags: opening `next` closes an open `open` first.
fn closes_implicitly(open: &str, next: &str) -> bool {
    match next {
        "p" => open == "p",
        "li" => open == "li",
        "dt" | "dd" => open == "dt" || open == "dd",
        "tr" => matches!(open, "tr" | "td" | "th"),
        "td" | "th" => open == "td" || open == "th",
        "option" => open == "option",
        _ => false,
    }
}

/// Parse HTML bytes into a synthetic root element holding all top-level
/// nodes. Fails only when the reader cannot make sense of the input at
/// all.
pub fn parse_html(bytes: &[u8]) -> Result<HtmlElement> {
    let mut reader = Reader::from_reader(bytes);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    // A bare `&` in prose is not a reference; keep it as text.
    config.allow_dangling_amp = true;

    let mut root = HtmlElement {
        name: "#root".to_string(),
        attrs: Vec::new(),
        children: Vec::new(),
    };
    let mut stack: Vec<HtmlElement> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = element_from_start(&reader, &e)?;
                while let Some(top) = stack.last() {
                    if closes_implicitly(&top.name, &element.name) {
                        let done = stack.pop().unwrap();
                        attach(&mut stack, &mut root, done);
                    } else {
                        break;
                    }
                }
                if is_void(&element.name) {
                    attach(&mut stack, &mut root, element);
                } else {
                    stack.push(element);
                }
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&reader, &e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(e)) => {
                let name = decode_lower(&reader, e.local_name().as_ref())?;
                close_until(&mut stack, &mut root, &name);
            }
            Ok(Event::Text(e)) => {
                let raw = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(|err| Error::Markup(err.to_string()))?;
                let text = decode_entities(&raw);
                if !text.is_empty() {
                    push_text(&mut stack, &mut root, &text);
                }
            }
            // References arrive as their own events, split out of the
            // surrounding text.
            Ok(Event::GeneralRef(e)) => {
                let name = e
                    .decode()
                    .map_err(|err| Error::Markup(err.to_string()))?;
                match resolve_entity(&name) {
                    Some(decoded) => push_text(&mut stack, &mut root, &decoded),
                    // Unknown references stay verbatim.
                    None => push_text(&mut stack, &mut root, &format!("&{name};")),
                }
            }
            Ok(Event::CData(e)) => {
                let text = reader
                    .decoder()
                    .decode(e.as_ref())
                    .map_err(|err| Error::Markup(err.to_string()))?;
                push_text(&mut stack, &mut root, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(Error::Markup(format!("unparseable markup: {err}"))),
        }
    }

    // End of input closes everything still open.
    while let Some(done) = stack.pop() {
        attach(&mut stack, &mut root, done);
    }
    Ok(root)
}

fn element_from_start(
    reader: &Reader<&[u8]>,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<HtmlElement> {
    let name = decode_lower(reader, e.local_name().as_ref())?;
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let Ok(attr) = attr else {
            continue;
        };
        let key = decode_lower(reader, attr.key.as_ref())?;
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(v) => v.into_owned(),
            Err(_) => decode_entities(&String::from_utf8_lossy(&attr.value)),
        };
        attrs.push((key, value));
    }
    Ok(HtmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn decode_lower(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String> {
    Ok(reader
        .decoder()
        .decode(bytes)
        .map_err(|err| Error::Markup(err.to_string()))?
        .to_ascii_lowercase())
}

fn attach(stack: &mut Vec<HtmlElement>, root: &mut HtmlElement, element: HtmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(HtmlNode::Element(element)),
        None => root.children.push(HtmlNode::Element(element)),
    }
}

/// Append character data, extending an existing trailing text node so a
/// run split by entity references stays one node.
fn push_text(stack: &mut Vec<HtmlElement>, root: &mut HtmlElement, text: &str) {
    let children = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => &mut root.children,
    };
    if let Some(HtmlNode::Text(last)) = children.last_mut() {
        last.push_str(text);
    } else {
        children.push(HtmlNode::Text(text.to_string()));
    }
}

/// Close the innermost open element with the given name, folding anything
/// opened after it into it. A stray end tag with no matching open element
/// is ignored.
fn close_until(stack: &mut Vec<HtmlElement>, root: &mut HtmlElement, name: &str) {
    let Some(position) = stack.iter().rposition(|e| e.name == name) else {
        return;
    };
    while stack.len() > position + 1 {
        let inner = stack.pop().unwrap();
        attach(stack, root, inner);
    }
    let done = stack.pop().unwrap();
    attach(stack, root, done);
}

/// Decode named and numeric character references. Unknown references are
/// kept verbatim.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest[..rest.len().min(32)].find(';') else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        match resolve_entity(entity) {
            Some(decoded) => {
                out.push_str(&decoded);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let code = if let Some(hex) = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse().ok()?
        };
        return char::from_u32(code).map(String::from);
    }
    let named = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "middot" => "\u{b7}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "dagger" => "\u{2020}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        "plusmn" => "\u{b1}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "frac12" => "\u{bd}",
        "frac14" => "\u{bc}",
        "micro" => "\u{b5}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "cent" => "\u{a2}",
        "yen" => "\u{a5}",
        "alpha" => "\u{3b1}",
        "beta" => "\u{3b2}",
        "gamma" => "\u{3b3}",
        "pi" => "\u{3c0}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",
        _ => return None,
    };
    Some(named.to_string())
}
