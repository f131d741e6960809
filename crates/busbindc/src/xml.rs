//! Tokenizer seam: turns an interface-description document into a flat
//! stream of enter/exit element events.
//!
//! Well-formedness is this layer's responsibility; anything `quick-xml`
//! rejects surfaces as a [`DocumentError`] and aborts the compilation.
//! The compiler proper only ever sees properly nested events.

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEvent {
    Enter {
        name: String,
        attrs: BTreeMap<String, String>,
        line: u64,
    },
    Exit {
        name: String,
        line: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    pub message: String,
    pub line: Option<u64>,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DocumentError {}

/// 1-based line number of a byte offset in the source text.
fn line_of(xml: &str, offset: u64) -> u64 {
    let end = (offset as usize).min(xml.len());
    xml.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() as u64 + 1
}

/// Read the whole document into an event list. Self-closing elements yield
/// an Enter immediately followed by an Exit.
pub fn read_document(xml: &str) -> Result<Vec<ElementEvent>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut events = Vec::new();
    let mut depth = 0u64;

    loop {
        let event = reader.read_event().map_err(|err| DocumentError {
            message: format!("malformed document: {err}"),
            line: Some(line_of(xml, reader.buffer_position())),
        })?;
        let line = line_of(xml, reader.buffer_position());
        match event {
            Event::Start(start) => {
                events.push(enter_event(xml, &reader, &start, line)?);
                depth += 1;
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                events.push(enter_event(xml, &reader, &start, line)?);
                events.push(ElementEvent::Exit { name, line });
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                events.push(ElementEvent::Exit { name, line });
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            // Text, comments, declarations and processing instructions
            // carry nothing the binding compiler consumes.
            _ => {}
        }
    }

    if depth > 0 {
        return Err(DocumentError {
            message: "unterminated document: element still open at end of input".to_string(),
            line: Some(line_of(xml, reader.buffer_position())),
        });
    }

    Ok(events)
}

fn enter_event(
    xml: &str,
    reader: &Reader<&[u8]>,
    start: &quick_xml::events::BytesStart<'_>,
    line: u64,
) -> Result<ElementEvent, DocumentError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| DocumentError {
            message: format!("malformed attribute on <{name}>: {err}"),
            line: Some(line_of(xml, reader.buffer_position())),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| DocumentError {
                message: format!("bad attribute value on <{name}>: {err}"),
                line: Some(line_of(xml, reader.buffer_position())),
            })?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(ElementEvent::Enter { name, attrs, line })
}
