//! Input format detection.
//!
//! The transformation engine resolves a format in three steps: an explicit
//! tag wins, then the filename extension, then content sniffing. Sniffing
//! checks the zip magic before anything textual because an OOXML package is
//! a binary container.

use std::path::Path;

/// A recognized input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    /// OOXML word-processing package (zip container).
    Docx,
    /// Raw HTML text.
    Html,
    /// Markdown-like text.
    Markdown,
    /// JSON (canonical AST serialization).
    Json,
}

impl InputFormat {
    /// Canonical format tag, as used for registry keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Docx => "docx",
            InputFormat::Html => "html",
            InputFormat::Markdown => "markdown",
            InputFormat::Json => "json",
        }
    }

    /// Parse a format tag. Accepts common aliases ("htm", "md").
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "docx" => Some(InputFormat::Docx),
            "html" | "htm" | "xhtml" => Some(InputFormat::Html),
            "markdown" | "md" => Some(InputFormat::Markdown),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zip local-file-header magic, the first four bytes of every OOXML package.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect the input format from a filename extension.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Option<InputFormat> {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(InputFormat::from_tag)
}

/// Sniff the input format from content.
///
/// Returns `None` when nothing matches; the engine then falls back to its
/// configured default format.
pub fn sniff_format(data: &[u8]) -> Option<InputFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return Some(InputFormat::Docx);
    }

    let text = String::from_utf8_lossy(&data[..data.len().min(512)]);
    match text.trim_start().chars().next()? {
        '<' => Some(InputFormat::Html),
        '#' | '-' | '*' => Some(InputFormat::Markdown),
        '{' => Some(InputFormat::Json),
        _ => None,
    }
}

/// Check whether bytes look like an OOXML package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Check whether bytes look like HTML text.
pub fn is_html_bytes(data: &[u8]) -> bool {
    sniff_format(data) == Some(InputFormat::Html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tag_roundtrip() {
        assert_eq!(InputFormat::from_tag("docx"), Some(InputFormat::Docx));
        assert_eq!(InputFormat::from_tag("HTM"), Some(InputFormat::Html));
        assert_eq!(InputFormat::from_tag("md"), Some(InputFormat::Markdown));
        assert_eq!(InputFormat::from_tag("rtf"), None);
        assert_eq!(InputFormat::Docx.as_str(), "docx");
    }

    #[test]
    fn test_detect_from_path() {
        assert_eq!(
            detect_format_from_path("report.docx"),
            Some(InputFormat::Docx)
        );
        assert_eq!(
            detect_format_from_path("page.HTML"),
            Some(InputFormat::Html)
        );
        assert_eq!(detect_format_from_path("no_extension"), None);
    }

    #[test]
    fn test_sniff_zip_magic() {
        assert_eq!(sniff_format(b"PK\x03\x04rest"), Some(InputFormat::Docx));
        assert!(is_docx_bytes(b"PK\x03\x04"));
        assert!(!is_docx_bytes(b"PK\x05\x06"));
    }

    #[test]
    fn test_sniff_text_forms() {
        assert_eq!(
            sniff_format(b"  <html><body/></html>"),
            Some(InputFormat::Html)
        );
        assert_eq!(sniff_format(b"# Heading"), Some(InputFormat::Markdown));
        assert_eq!(sniff_format(b"- item"), Some(InputFormat::Markdown));
        assert_eq!(sniff_format(b"{\"a\":1}"), Some(InputFormat::Json));
        assert_eq!(sniff_format(b"plain prose"), None);
        assert_eq!(sniff_format(b""), None);
    }
}
