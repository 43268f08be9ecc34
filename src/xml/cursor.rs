//! Streaming XML cursor
//!
//! A thin forward-only layer over quick-xml: [`XmlCursor::advance`] returns
//! the next significant tag token and accumulates the character data seen
//! since the previous tag, which is how dialect handlers read element text.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseError;

/// Attribute list of one start tag. Keys keep the case the document used;
/// lookups compare ASCII-case-insensitively so dialect handlers can query
/// dictionary-ref style names in lowercase.
#[derive(Debug, Default, Clone)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn from_start(e: &BytesStart) -> Result<Self, ParseError> {
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| ParseError::Xml(quick_xml::Error::from(e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = std::str::from_utf8(&attr.value)?.to_string();
            attrs.push((key, value));
        }
        Ok(Self(attrs))
    }

    /// Look up an attribute by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse an attribute as f64 if present and well-formed.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.trim().parse().ok()
    }

    /// Parse an attribute as usize if present and well-formed.
    pub fn get_usize(&self, name: &str) -> Option<usize> {
        self.get(name)?.trim().parse().ok()
    }
}

/// One significant token from the document.
#[derive(Debug)]
pub enum XmlToken {
    /// Opening tag (self-closing tags set `empty`).
    Start {
        /// Tag name as written in the document.
        name: String,
        /// Attribute list.
        attributes: Attributes,
        /// True for `<tag/>`, which produces no matching `End`.
        empty: bool,
    },
    /// Closing tag.
    End {
        /// Tag name as written in the document.
        name: String,
    },
    /// End-of-stream sentinel.
    Eof,
}

/// Forward-only cursor over an XML byte stream.
pub struct XmlCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    text: String,
}

impl<R: BufRead> XmlCursor<R> {
    /// Create a cursor over a BufRead source.
    pub fn new(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);
        Self {
            reader: xml_reader,
            buf: Vec::new(),
            text: String::new(),
        }
    }

    /// Move to the next tag, returning [`XmlToken::Eof`] when the stream is
    /// exhausted. Character data between tags accumulates into
    /// [`XmlCursor::text`], reset on each call.
    pub fn advance(&mut self) -> Result<XmlToken, ParseError> {
        self.text.clear();
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                    let attributes = Attributes::from_start(e)?;
                    return Ok(XmlToken::Start {
                        name,
                        attributes,
                        empty: false,
                    });
                }
                Ok(Event::Empty(ref e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                    let attributes = Attributes::from_start(e)?;
                    return Ok(XmlToken::Start {
                        name,
                        attributes,
                        empty: true,
                    });
                }
                Ok(Event::End(ref e)) => {
                    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                    return Ok(XmlToken::End { name });
                }
                Ok(Event::Text(ref t)) => {
                    let unescaped = t.unescape()?;
                    if !self.text.is_empty() {
                        self.text.push(' ');
                    }
                    self.text.push_str(&unescaped);
                }
                Ok(Event::CData(ref t)) => {
                    self.text.push_str(std::str::from_utf8(t.as_ref())?);
                }
                Ok(Event::Eof) => return Ok(XmlToken::Eof),
                Ok(_) => {} // declarations, comments, processing instructions
                Err(e) => return Err(ParseError::Xml(e)),
            }
        }
    }

    /// Character data accumulated since the previously returned tag.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_tokens(doc: &str) -> Vec<String> {
        let mut cursor = XmlCursor::new(doc.as_bytes());
        let mut out = Vec::new();
        loop {
            match cursor.advance().expect("well-formed document") {
                XmlToken::Start { name, empty, .. } => {
                    out.push(format!("start:{name}{}", if empty { "/" } else { "" }))
                }
                XmlToken::End { name } => {
                    out.push(format!("end:{name}:{}", cursor.text()));
                }
                XmlToken::Eof => break,
            }
        }
        out
    }

    #[test]
    fn tokens_and_text_accumulation() {
        let tokens = collect_tokens("<a><b x=\"1\">hello</b><c/></a>");
        assert_eq!(
            tokens,
            vec!["start:a", "start:b", "end:b:hello", "start:c/", "end:a:"]
        );
    }

    #[test]
    fn attributes_lookup_is_case_insensitive() {
        let mut cursor = XmlCursor::new("<peak xValue=\"7.25\" atomRefs=\"a1 a2\"/>".as_bytes());
        match cursor.advance().expect("token") {
            XmlToken::Start { attributes, .. } => {
                assert_eq!(attributes.get("xvalue"), Some("7.25"));
                assert_eq!(attributes.get_f64("XVALUE"), Some(7.25));
                assert_eq!(attributes.get("atomrefs"), Some("a1 a2"));
                assert_eq!(attributes.get("missing"), None);
            }
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn malformed_markup_is_an_error() {
        let mut cursor = XmlCursor::new("<a><b></a>".as_bytes());
        let mut saw_error = false;
        for _ in 0..8 {
            match cursor.advance() {
                Err(_) => {
                    saw_error = true;
                    break;
                }
                Ok(XmlToken::Eof) => break,
                Ok(_) => {}
            }
        }
        assert!(saw_error, "mismatched end tag should surface as an error");
    }
}
