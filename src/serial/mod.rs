//! XML serializer.
//!
//! Turns a DOM subtree back into markup. Output parses back to an
//! equivalent tree, and serializing that tree again reproduces the same
//! bytes.

use crate::dom::{Document, NodeId, NodeKind};
use crate::reader::entities::encode;

/// Options controlling serializer output.
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Pretty-print with one element per line. Defaults to `false`.
    pub indent: bool,
    /// Indentation string per nesting level. Defaults to two spaces.
    pub indent_str: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            indent: false,
            indent_str: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

/// Serialize the whole document, with an XML declaration and a trailing
/// newline.
#[must_use]
pub fn document_xml(doc: &Document, options: &SerializeOptions) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    for child in doc.children(0) {
        // Document-level whitespace is formatting, not content.
        if options.indent && is_whitespace_text(doc, child) {
            continue;
        }
        serialize_node(doc, child, &mut out, options, 0);
        if options.indent {
            out.push('\n');
        }
    }
    if !options.indent {
        out.push('\n');
    }
    out
}

/// Markup of the node itself, including its tag and all content.
#[must_use]
pub fn outer_xml(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::new();
    serialize_node(doc, id, &mut out, options, 0);
    out
}

/// Markup of the node's content: child tags and text, without the node's
/// own tag.
#[must_use]
pub fn inner_xml(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::new();
    let element_only = options.indent && is_element_only(doc, id);
    for child in doc.children(id) {
        if element_only && is_whitespace_text(doc, child) {
            continue;
        }
        serialize_node(doc, child, &mut out, options, 0);
        if element_only {
            out.push('\n');
        }
    }
    out
}

/// True if the node's content is only elements plus ignorable whitespace,
/// meaning indentation can be inserted without changing its text.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    let mut has_element_child = false;
    for child in doc.children(id) {
        match doc.kind(child) {
            Some(NodeKind::Element) => has_element_child = true,
            Some(NodeKind::Text) => {
                if !doc.content(child).trim().is_empty() {
                    return false;
                }
            }
            Some(NodeKind::CData) => return false,
            _ => {}
        }
    }
    has_element_child
}

fn is_whitespace_text(doc: &Document, id: NodeId) -> bool {
    doc.kind(id) == Some(NodeKind::Text) && doc.content(id).trim().is_empty()
}

fn serialize_node(
    doc: &Document,
    id: NodeId,
    out: &mut String,
    options: &SerializeOptions,
    depth: usize,
) {
    match doc.kind(id) {
        Some(NodeKind::Element) => serialize_element(doc, id, out, options, depth),
        Some(NodeKind::Text) => out.push_str(&encode(doc.content(id))),
        Some(NodeKind::CData) => {
            out.push_str("<![CDATA[");
            out.push_str(doc.content(id));
            out.push_str("]]>");
        }
        Some(NodeKind::Comment) => {
            out.push_str("<!--");
            out.push_str(doc.content(id));
            out.push_str("-->");
        }
        Some(NodeKind::ProcessingInstruction) => {
            out.push_str("<?");
            out.push_str(doc.name(id));
            let data = doc.content(id);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
        Some(NodeKind::Document) | None => {}
    }
}

fn serialize_element(
    doc: &Document,
    id: NodeId,
    out: &mut String,
    options: &SerializeOptions,
    depth: usize,
) {
    out.push('<');
    out.push_str(doc.name(id));
    for (name, value) in doc.attribute_pairs(id) {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode(value));
        out.push('"');
    }

    let has_children = doc.node(id).is_some_and(|n| n.has_children());
    if !has_children {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let element_only = options.indent && is_element_only(doc, id);
    if element_only {
        out.push('\n');
    }
    for child in doc.children(id) {
        if element_only {
            if is_whitespace_text(doc, child) {
                continue;
            }
            push_indent(out, options, depth + 1);
        }
        serialize_node(doc, child, out, options, depth + 1);
        if element_only {
            out.push('\n');
        }
    }
    if element_only {
        push_indent(out, options, depth);
    }

    out.push_str("</");
    out.push_str(doc.name(id));
    out.push('>');
}

fn push_indent(out: &mut String, options: &SerializeOptions, depth: usize) {
    for _ in 0..depth {
        out.push_str(&options.indent_str);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact() -> SerializeOptions {
        SerializeOptions::default()
    }

    fn pretty() -> SerializeOptions {
        SerializeOptions::default().indent(true)
    }

    #[test]
    fn test_outer_xml_round_trip() {
        let doc = Document::parse("<r a=\"1\"><b>text</b></r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(outer_xml(&doc, root, &compact()), "<r a=\"1\"><b>text</b></r>");
    }

    #[test]
    fn test_inner_xml_excludes_own_tag() {
        let doc = Document::parse("<r><b>text</b>tail</r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(inner_xml(&doc, root, &compact()), "<b>text</b>tail");
    }

    #[test]
    fn test_empty_element_self_closes() {
        let doc = Document::parse("<r><a></a></r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(outer_xml(&doc, root, &compact()), "<r><a/></r>");
    }

    #[test]
    fn test_text_is_escaped() {
        let doc = Document::parse("<r>a &amp; b</r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(outer_xml(&doc, root, &compact()), "<r>a &amp; b</r>");
    }

    #[test]
    fn test_cdata_verbatim() {
        let doc = Document::parse("<r><![CDATA[a < b]]></r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(outer_xml(&doc, root, &compact()), "<r><![CDATA[a < b]]></r>");
    }

    #[test]
    fn test_indent_element_only() {
        let doc = Document::parse("<r><a/><b/></r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(
            outer_xml(&doc, root, &pretty()),
            "<r>\n  <a/>\n  <b/>\n</r>"
        );
    }

    #[test]
    fn test_indent_leaves_mixed_content_alone() {
        let doc = Document::parse("<r>text<b/>more</r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(outer_xml(&doc, root, &pretty()), "<r>text<b/>more</r>");
    }

    #[test]
    fn test_indented_output_is_stable() {
        let doc = Document::parse("<r><a><b/></a><c/></r>");
        let root = doc.root_element_id().unwrap();
        let once = outer_xml(&doc, root, &pretty());

        let doc2 = Document::parse(&once);
        let root2 = doc2.root_element_id().unwrap();
        let twice = outer_xml(&doc2, root2, &pretty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_document_xml_has_declaration() {
        let doc = Document::parse("<r/>");
        let xml = document_xml(&doc, &compact());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(xml.contains("<r/>"));
    }
}
