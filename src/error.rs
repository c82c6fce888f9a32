//! Error types for the candoc library.

use std::io;
use thiserror::Error;

/// Result type alias for candoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while parsing, transforming, or rendering
/// documents.
///
/// Only four classes are fatal by contract: [`Error::Container`],
/// [`Error::Markup`], [`Error::UnsupportedFormat`], and
/// [`Error::Validation`]. Everything else a parser encounters is recorded
/// as a report warning and parsing continues on a documented fallback.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input could not be matched to any known format.
    #[error("Unknown input format")]
    UnknownFormat,

    /// A required package part is missing or the container is unreadable.
    #[error("Container error: {0}")]
    Container(String),

    /// The host markup facility reported malformed input.
    #[error("Markup error: {0}")]
    Markup(String),

    /// No parser or renderer is registered for the requested format.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The AST failed a structural invariant check.
    #[error("Structural validation failed: {0}")]
    Validation(String),

    /// Error reading an XML part.
    #[error("XML error: {0}")]
    Xml(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A failure wrapped with the pipeline stage it occurred in.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Pipeline stage name ("parse", "render", "validate").
        stage: &'static str,
        /// Underlying failure.
        source: Box<Error>,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error with pipeline stage context.
    pub fn in_stage(self, stage: &'static str) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// True for the error classes that abort processing by contract.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Container(_)
                | Error::Markup(_)
                | Error::UnsupportedFormat(_)
                | Error::Validation(_)
        ) || matches!(self, Error::Stage { source, .. } if source.is_fatal())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Container(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Container("missing required part word/document.xml".into());
        assert_eq!(
            err.to_string(),
            "Container error: missing required part word/document.xml"
        );

        let err = Error::UnsupportedFormat("rtf".into());
        assert_eq!(err.to_string(), "Unsupported format: rtf");
    }

    #[test]
    fn test_stage_wrapping() {
        let err = Error::Markup("unexpected end tag".into()).in_stage("parse");
        assert_eq!(
            err.to_string(),
            "parse stage failed: Markup error: unexpected end tag"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Container("x".into()).is_fatal());
        assert!(Error::Validation("x".into()).is_fatal());
        assert!(!Error::Render("x".into()).is_fatal());
        assert!(!Error::UnknownFormat.is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
