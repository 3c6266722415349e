//! Event types produced by the pull reader.

use memchr::memchr;
use std::borrow::Cow;

/// A parsed attribute. The value has entity references decoded.
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Full attribute name, possibly prefixed.
    pub name: &'a [u8],
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        Attribute { name, value }
    }

    /// Local part of the name (after a namespace prefix, if any).
    pub fn local_name(&self) -> &'a [u8] {
        local_part(self.name)
    }
}

/// Start-of-element event data, shared by start and empty tags.
#[derive(Debug, Clone)]
pub struct ElementStart<'a> {
    /// Full element name, possibly prefixed.
    pub name: &'a [u8],
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> ElementStart<'a> {
    pub fn local_name(&self) -> &'a [u8] {
        local_part(self.name)
    }
}

/// Split off the local part of a possibly prefixed name.
pub fn local_part(name: &[u8]) -> &[u8] {
    match memchr(b':', name) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// One XML construct pulled from the input.
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// `<name attrs...>`
    StartElement(ElementStart<'a>),
    /// `<name attrs.../>`
    EmptyElement(ElementStart<'a>),
    /// `</name>`
    EndElement { name: &'a [u8] },
    /// Character data between tags, entities decoded.
    Text(Cow<'a, [u8]>),
    /// `<![CDATA[...]]>` content, verbatim.
    CData(&'a [u8]),
    /// `<!--...-->` content.
    Comment(&'a [u8]),
    /// `<?target data?>`
    ProcessingInstruction {
        target: &'a [u8],
        data: Option<&'a [u8]>,
    },
    /// `<?xml ...?>`
    XmlDeclaration { attributes: Vec<Attribute<'a>> },
    /// `<!DOCTYPE ...>` body, verbatim.
    DocType(&'a [u8]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_part() {
        assert_eq!(local_part(b"svg:rect"), b"rect");
        assert_eq!(local_part(b"div"), b"div");
    }

    #[test]
    fn test_attribute_local_name() {
        let attr = Attribute::new(b"xlink:href", Cow::Borrowed(b"#x" as &[u8]));
        assert_eq!(attr.local_name(), b"href");
    }
}
