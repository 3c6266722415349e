//! Pull-based XML reader.
//!
//! Tokenizes raw input into [`XmlEvent`]s. Parsing is lenient: malformed
//! constructs are recovered or skipped, and each recovery is recorded as a
//! [`Diagnostic`] instead of aborting the parse. Well-formedness enforcement
//! on top of the event stream lives in the DOM builder.

pub mod attributes;
pub mod entities;
pub mod events;
pub mod scanner;

pub use events::{Attribute, ElementStart, XmlEvent};

use attributes::parse_attributes;
use scanner::{is_name_start_byte, Scanner};

/// A recovered parse problem: what went wrong and where.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub offset: usize,
}

/// Pull reader over a byte buffer.
pub struct Reader<'a> {
    scanner: Scanner<'a>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Reader {
            scanner: Scanner::new(input),
            diagnostics: Vec::new(),
        }
    }

    /// Problems recovered from so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn report(&mut self, message: impl Into<String>, offset: usize) {
        self.diagnostics.push(Diagnostic {
            message: message.into(),
            offset,
        });
    }

    /// Pull the next event, or None at end of input.
    pub fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        loop {
            if self.scanner.is_eof() {
                return None;
            }

            if self.scanner.peek() != Some(b'<') {
                if let Some(event) = self.read_text() {
                    return Some(event);
                }
                continue;
            }

            if self.scanner.starts_with(b"<!--") {
                return Some(self.read_comment());
            }
            if self.scanner.starts_with(b"<![CDATA[") {
                return Some(self.read_cdata());
            }
            if self.scanner.starts_with(b"<!") {
                return Some(self.read_doctype());
            }
            if self.scanner.starts_with(b"<?") {
                if let Some(event) = self.read_pi() {
                    return Some(event);
                }
                continue;
            }
            if self.scanner.starts_with(b"</") {
                if let Some(event) = self.read_end_tag() {
                    return Some(event);
                }
                continue;
            }
            if self.scanner.peek_at(1).is_some_and(is_name_start_byte) {
                return Some(self.read_start_tag());
            }

            // Stray '<' that opens nothing; drop it and keep going.
            self.report("stray '<' in content", self.scanner.position());
            self.scanner.advance(1);
        }
    }

    fn read_text(&mut self) -> Option<XmlEvent<'a>> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.len());
        let raw = self.scanner.slice(start, end);
        self.scanner.advance(end - start);
        if raw.is_empty() {
            return None;
        }
        Some(XmlEvent::Text(entities::decode(raw)))
    }

    fn read_comment(&mut self) -> XmlEvent<'a> {
        let open = self.scanner.position();
        self.scanner.advance(4);
        let content_start = self.scanner.position();
        match self.scanner.find_sequence(b"-->") {
            Some(end) => {
                let content = self.scanner.slice(content_start, end);
                self.scanner.advance(end - content_start + 3);
                XmlEvent::Comment(content)
            }
            None => {
                self.report("unterminated comment", open);
                let content = self.rest_from(content_start);
                XmlEvent::Comment(content)
            }
        }
    }

    fn read_cdata(&mut self) -> XmlEvent<'a> {
        let open = self.scanner.position();
        self.scanner.advance(9);
        let content_start = self.scanner.position();
        match self.scanner.find_sequence(b"]]>") {
            Some(end) => {
                let content = self.scanner.slice(content_start, end);
                self.scanner.advance(end - content_start + 3);
                XmlEvent::CData(content)
            }
            None => {
                self.report("unterminated CDATA section", open);
                let content = self.rest_from(content_start);
                XmlEvent::CData(content)
            }
        }
    }

    fn read_doctype(&mut self) -> XmlEvent<'a> {
        let open = self.scanner.position();
        self.scanner.advance(2);
        let body_start = self.scanner.position();

        // The internal subset may contain '>', so track bracket depth.
        let mut depth = 0usize;
        while let Some(b) = self.scanner.peek() {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    let body = self.scanner.slice(body_start, self.scanner.position());
                    self.scanner.advance(1);
                    return XmlEvent::DocType(body);
                }
                _ => {}
            }
            self.scanner.advance(1);
        }

        self.report("unterminated DOCTYPE", open);
        XmlEvent::DocType(self.rest_from(body_start))
    }

    fn read_pi(&mut self) -> Option<XmlEvent<'a>> {
        let open = self.scanner.position();
        self.scanner.advance(2);

        let Some(target) = self.scanner.read_name() else {
            self.report("processing instruction without target", open);
            self.skip_past(b"?>");
            return None;
        };

        let data_start = self.scanner.position();
        let (raw, consumed_close) = match self.scanner.find_sequence(b"?>") {
            Some(end) => (self.scanner.slice(data_start, end), Some(end)),
            None => {
                self.report("unterminated processing instruction", open);
                (self.rest_from(data_start), None)
            }
        };
        if let Some(end) = consumed_close {
            self.scanner.advance(end - data_start + 2);
        }

        if target.eq_ignore_ascii_case(b"xml") {
            return Some(XmlEvent::XmlDeclaration {
                attributes: parse_attributes(raw),
            });
        }

        let data = trim_ascii(raw);
        Some(XmlEvent::ProcessingInstruction {
            target,
            data: if data.is_empty() { None } else { Some(data) },
        })
    }

    fn read_end_tag(&mut self) -> Option<XmlEvent<'a>> {
        let open = self.scanner.position();
        self.scanner.advance(2);

        let Some(name) = self.scanner.read_name() else {
            self.report("end tag without a name", open);
            self.skip_past(b">");
            return None;
        };

        match self.scanner.find_tag_end_quoted() {
            Some(end) => {
                let skip = end - self.scanner.position() + 1;
                self.scanner.advance(skip);
            }
            None => {
                self.report("unterminated end tag", open);
                self.scanner.advance(self.scanner.len());
            }
        }
        Some(XmlEvent::EndElement { name })
    }

    fn read_start_tag(&mut self) -> XmlEvent<'a> {
        let open = self.scanner.position();
        self.scanner.advance(1);
        // Guarded by the caller's name-start check.
        let name = self.scanner.read_name().unwrap_or(b"");

        let attrs_start = self.scanner.position();
        let (attrs_end, empty, next_pos) = match self.scanner.find_tag_end_quoted() {
            Some(gt) => {
                let empty = gt > attrs_start && self.scanner.slice(gt - 1, gt) == b"/";
                (if empty { gt - 1 } else { gt }, empty, gt + 1)
            }
            None => {
                self.report("unterminated start tag", open);
                (self.scanner.len(), false, self.scanner.len())
            }
        };

        let attributes = parse_attributes(self.scanner.slice(attrs_start, attrs_end));
        self.scanner.advance(next_pos - attrs_start);

        let element = ElementStart { name, attributes };
        if empty {
            XmlEvent::EmptyElement(element)
        } else {
            XmlEvent::StartElement(element)
        }
    }

    /// Everything from `start` to end of input, consuming it.
    fn rest_from(&mut self, start: usize) -> &'a [u8] {
        let slice = self.scanner.slice(start, self.scanner.len());
        self.scanner.advance(self.scanner.len());
        slice
    }

    fn skip_past(&mut self, needle: &[u8]) {
        match self.scanner.find_sequence(needle) {
            Some(pos) => {
                let skip = pos - self.scanner.position() + needle.len();
                self.scanner.advance(skip);
            }
            None => self.scanner.advance(self.scanner.len()),
        }
    }
}

fn trim_ascii(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

impl<'a> Iterator for Reader<'a> {
    type Item = XmlEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<XmlEvent<'_>> {
        Reader::new(input.as_bytes()).collect()
    }

    #[test]
    fn test_simple_document() {
        let evs = events("<root><child>text</child></root>");
        assert_eq!(evs.len(), 5);
        assert!(matches!(&evs[0], XmlEvent::StartElement(e) if e.name == b"root"));
        assert!(matches!(&evs[1], XmlEvent::StartElement(e) if e.name == b"child"));
        assert!(matches!(&evs[2], XmlEvent::Text(t) if t.as_ref() == b"text"));
        assert!(matches!(&evs[3], XmlEvent::EndElement { name } if *name == b"child"));
        assert!(matches!(&evs[4], XmlEvent::EndElement { name } if *name == b"root"));
    }

    #[test]
    fn test_empty_element_with_attributes() {
        let evs = events("<img src=\"a.png\" width=\"10\"/>");
        assert_eq!(evs.len(), 1);
        let XmlEvent::EmptyElement(e) = &evs[0] else {
            panic!("expected empty element");
        };
        assert_eq!(e.name, b"img");
        assert_eq!(e.attributes.len(), 2);
        assert_eq!(e.attributes[0].value.as_ref(), b"a.png");
    }

    #[test]
    fn test_declaration_comment_cdata() {
        let evs = events("<?xml version=\"1.0\"?><!-- note --><r><![CDATA[<raw>]]></r>");
        assert!(matches!(&evs[0], XmlEvent::XmlDeclaration { attributes } if attributes[0].name == b"version"));
        assert!(matches!(&evs[1], XmlEvent::Comment(c) if *c == b" note "));
        assert!(matches!(&evs[3], XmlEvent::CData(c) if *c == b"<raw>"));
    }

    #[test]
    fn test_processing_instruction() {
        let evs = events("<?php echo 1; ?><r/>");
        let XmlEvent::ProcessingInstruction { target, data } = &evs[0] else {
            panic!("expected PI");
        };
        assert_eq!(*target, b"php");
        assert_eq!(*data, Some(b"echo 1;" as &[u8]));
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        let evs = events("<!DOCTYPE html [<!ENTITY x \"y\">]><html/>");
        assert!(matches!(&evs[0], XmlEvent::DocType(_)));
        assert!(matches!(&evs[1], XmlEvent::EmptyElement(e) if e.name == b"html"));
    }

    #[test]
    fn test_entity_decoded_in_text() {
        let evs = events("<r>a &amp; b</r>");
        assert!(matches!(&evs[1], XmlEvent::Text(t) if t.as_ref() == b"a & b"));
    }

    #[test]
    fn test_truncated_input_recovers() {
        let mut reader = Reader::new(b"<root><child>text");
        let evs: Vec<_> = reader.by_ref().collect();
        assert_eq!(evs.len(), 3);
        assert!(reader.diagnostics().is_empty());
    }

    #[test]
    fn test_unterminated_comment_reports() {
        let mut reader = Reader::new(b"<r/><!-- oops");
        let evs: Vec<_> = reader.by_ref().collect();
        assert_eq!(evs.len(), 2);
        assert_eq!(reader.diagnostics().len(), 1);
        assert!(reader.diagnostics()[0].message.contains("comment"));
    }

    #[test]
    fn test_stray_angle_bracket() {
        let mut reader = Reader::new(b"<r>a < b</r>");
        let evs: Vec<_> = reader.by_ref().collect();
        assert!(!reader.diagnostics().is_empty());
        assert!(matches!(&evs[0], XmlEvent::StartElement(_)));
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let evs = events("<r cond=\"a > b\">x</r>");
        let XmlEvent::StartElement(e) = &evs[0] else {
            panic!("expected start element");
        };
        assert_eq!(e.attributes[0].value.as_ref(), b"a > b");
        assert!(matches!(&evs[1], XmlEvent::Text(t) if t.as_ref() == b"x"));
    }
}
