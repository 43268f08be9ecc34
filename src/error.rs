//! Fatal parse errors
//!
//! [`ParseError`] is the abort channel: it carries a document-level failure
//! up to the parse entry point, where it is converted into a diagnostic and
//! the partially populated results are returned. The only `ParseError` a
//! caller ever sees directly is the stream-open failure from
//! [`crate::parse_file`].

/// Errors that abort processing of the current document or payload.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// I/O error while opening or reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML markup.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// UTF-8 encoding error in tag names, attributes or text content.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A numeric payload could not be decoded.
    #[error("coordinate decode error: {0}")]
    Decode(#[from] crate::coords::DecodeError),

    /// Document structure made further processing impossible.
    #[error("invalid document structure: {0}")]
    InvalidStructure(String),
}
