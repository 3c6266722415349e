//! Arena-based DOM document.
//!
//! Nodes live in a flat Vec and reference each other by NodeId, attributes
//! live in a parallel arena, and all strings are interned. The document
//! owns every byte it needs, so the input text can be dropped after
//! parsing.

use super::node::{Attr, Node, NodeId, NodeKind};
use super::strings::StringPool;
use crate::reader::{Diagnostic, Reader, XmlEvent};
use thiserror::Error;

/// Well-formedness violation found in strict mode.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("tag mismatch: <{start}> closed with </{end}>")]
    TagMismatch { start: String, end: String },
    #[error("unexpected end tag </{0}> without matching start tag")]
    UnexpectedEndTag(String),
    #[error("unclosed tag <{0}>")]
    UnclosedTag(String),
    #[error("document has multiple root elements")]
    MultipleRoots,
    #[error("no root element")]
    NoRootElement,
    #[error("text content not allowed at document level")]
    TextAtDocumentLevel,
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),
    #[error("malformed input at offset {offset}: {message}")]
    Malformed { message: String, offset: usize },
}

/// A parsed XML document.
///
/// Node 0 is always the document node; the root element (if any) is one of
/// its children.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    attributes: Vec<Attr>,
    strings: StringPool,
    root_element: Option<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Parse in lenient mode. Never fails; recovered problems are kept as
    /// [`Document::diagnostics`].
    pub fn parse(input: &str) -> Self {
        let mut builder = Builder::new();
        // Lenient build reports instead of failing.
        let _ = builder.run(input, false);
        builder.finish()
    }

    /// Parse in strict mode, rejecting documents that are not well-formed.
    pub fn parse_strict(input: &str) -> Result<Self, ParseError> {
        let mut builder = Builder::new();
        builder.run(input, true)?;
        let doc = builder.finish();
        if let Some(diag) = doc.diagnostics.first() {
            return Err(ParseError::Malformed {
                message: diag.message.clone(),
                offset: diag.offset,
            });
        }
        if doc.root_element.is_none() {
            return Err(ParseError::NoRootElement);
        }
        Ok(doc)
    }

    /// Problems recovered from during a lenient parse.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// First root-level element, if the input contained one.
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Element tag name or PI target; "" for other kinds.
    pub fn name(&self, id: NodeId) -> &str {
        match self.node(id) {
            Some(node) => self.strings.get(node.name_id),
            None => "",
        }
    }

    /// Name with any namespace prefix stripped.
    pub fn local_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        match name.find(':') {
            Some(pos) => &name[pos + 1..],
            None => name,
        }
    }

    /// Character data of a text, CDATA, comment, or PI node.
    pub fn content(&self, id: NodeId) -> &str {
        match self.node(id) {
            Some(node) => self.strings.get(node.content_id),
            None => "",
        }
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.next_sibling
    }

    pub fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.prev_sibling
    }

    /// Next sibling that is an element, skipping text, CDATA, comments,
    /// and processing instructions.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling_of(id);
        while let Some(sid) = current {
            if self.node(sid)?.is_element() {
                return Some(sid);
            }
            current = self.next_sibling_of(sid);
        }
        None
    }

    /// Iterate over direct children in document order.
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        self.push_children_reversed(id, &mut stack);
        DescendantIter { doc: self, stack }
    }

    fn push_children_reversed(&self, id: NodeId, stack: &mut Vec<NodeId>) {
        if let Some(node) = self.node(id) {
            let mut child = node.last_child;
            while let Some(cid) = child {
                stack.push(cid);
                child = self.node(cid).and_then(|n| n.prev_sibling);
            }
        }
    }

    /// First child element with the given name, in document order.
    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).find(|&cid| {
            self.node(cid).is_some_and(|n| n.is_element()) && self.name(cid) == name
        })
    }

    /// Text of the node's first child, if that child is a text or CDATA
    /// node. Element-first content yields "".
    pub fn inner_text(&self, id: NodeId) -> &str {
        match self.node(id).and_then(|n| n.first_child) {
            Some(first) => match self.node(first) {
                Some(node) if node.is_text() => self.strings.get(node.content_id),
                _ => "",
            },
            None => "",
        }
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn string_value(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(node) if node.is_text() => self.strings.get(node.content_id).to_string(),
            Some(_) => {
                let mut out = String::new();
                for did in self.descendants(id) {
                    if let Some(node) = self.node(did) {
                        if node.is_text() {
                            out.push_str(self.strings.get(node.content_id));
                        }
                    }
                }
                out
            }
            None => String::new(),
        }
    }

    /// Inner text of the first child element with the given name.
    pub fn child_content(&self, id: NodeId, name: &str) -> Option<&str> {
        self.child_named(id, name).map(|cid| self.inner_text(cid))
    }

    /// Attributes of an element, in source order.
    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match self.node(id) {
            Some(node) => {
                let start = node.attr_start as usize;
                let end = start + node.attr_count as usize;
                self.attributes.get(start..end).unwrap_or(&[])
            }
            None => &[],
        }
    }

    /// Value of the named attribute, or None if absent. With duplicate
    /// attributes the first occurrence wins.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|attr| self.strings.get(attr.name_id) == name)
            .map(|attr| self.strings.get(attr.value_id))
    }

    /// All (name, value) pairs of an element, in source order.
    pub fn attribute_pairs(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.attrs(id)
            .iter()
            .map(|attr| (self.strings.get(attr.name_id), self.strings.get(attr.value_id)))
    }
}

/// Iterator over direct children.
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Depth-first iterator over all descendants.
pub struct DescendantIter<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.doc.push_children_reversed(current, &mut self.stack);
        Some(current)
    }
}

/// Builds the arena from reader events.
struct Builder {
    nodes: Vec<Node>,
    attributes: Vec<Attr>,
    strings: StringPool,
    root_element: Option<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl Builder {
    fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(Node::document());
        Builder {
            nodes,
            attributes: Vec::with_capacity(128),
            strings: StringPool::new(),
            root_element: None,
            diagnostics: Vec::new(),
        }
    }

    fn finish(self) -> Document {
        Document {
            nodes: self.nodes,
            attributes: self.attributes,
            strings: self.strings,
            root_element: self.root_element,
            diagnostics: self.diagnostics,
        }
    }

    fn run(&mut self, input: &str, strict: bool) -> Result<(), ParseError> {
        let mut reader = Reader::new(input.as_bytes());
        // Open element stack; the document node is always at the bottom.
        let mut stack: Vec<NodeId> = vec![0];
        let mut open_names: Vec<String> = Vec::new();
        let mut seen_root = false;

        while let Some(event) = reader.next_event() {
            match event {
                XmlEvent::StartElement(elem) => {
                    if strict && stack.len() == 1 {
                        if seen_root {
                            return Err(ParseError::MultipleRoots);
                        }
                        seen_root = true;
                    }
                    if strict {
                        if let Some(dup) = find_duplicate_attribute(&elem.attributes) {
                            return Err(ParseError::DuplicateAttribute(dup));
                        }
                    }
                    let name = lossy(elem.name);
                    let node_id = self.append_element(&name, &elem.attributes, &stack);
                    open_names.push(name.into_owned());
                    stack.push(node_id);
                }

                XmlEvent::EmptyElement(elem) => {
                    if strict && stack.len() == 1 {
                        if seen_root {
                            return Err(ParseError::MultipleRoots);
                        }
                        seen_root = true;
                    }
                    if strict {
                        if let Some(dup) = find_duplicate_attribute(&elem.attributes) {
                            return Err(ParseError::DuplicateAttribute(dup));
                        }
                    }
                    let name = lossy(elem.name);
                    self.append_element(&name, &elem.attributes, &stack);
                }

                XmlEvent::EndElement { name } => {
                    let name = lossy(name);
                    if strict {
                        match open_names.last() {
                            Some(open) if *open == name => {}
                            Some(open) => {
                                return Err(ParseError::TagMismatch {
                                    start: open.clone(),
                                    end: name.into_owned(),
                                });
                            }
                            None => {
                                return Err(ParseError::UnexpectedEndTag(name.into_owned()));
                            }
                        }
                        open_names.pop();
                        stack.pop();
                        continue;
                    }

                    // Lenient recovery: close down to the nearest matching
                    // open tag; a stray end tag is dropped.
                    match open_names.iter().rposition(|open| *open == name) {
                        Some(pos) => {
                            while open_names.len() > pos {
                                open_names.pop();
                                stack.pop();
                            }
                        }
                        None => {
                            self.diagnostics.push(Diagnostic {
                                message: format!("end tag </{name}> without matching start tag"),
                                offset: 0,
                            });
                        }
                    }
                }

                XmlEvent::Text(content) => {
                    let text = lossy_cow(&content);
                    if strict
                        && stack.len() == 1
                        && !text.chars().all(|c| c.is_ascii_whitespace())
                    {
                        return Err(ParseError::TextAtDocumentLevel);
                    }
                    let content_id = self.strings.intern(&text);
                    let (parent, depth) = self.context(&stack);
                    self.append(Node::text(content_id, parent, depth), parent);
                }

                XmlEvent::CData(content) => {
                    if strict && stack.len() == 1 {
                        return Err(ParseError::TextAtDocumentLevel);
                    }
                    let content_id = self.strings.intern(&lossy(content));
                    let (parent, depth) = self.context(&stack);
                    self.append(Node::cdata(content_id, parent, depth), parent);
                }

                XmlEvent::Comment(content) => {
                    let content_id = self.strings.intern(&lossy(content));
                    let (parent, depth) = self.context(&stack);
                    self.append(Node::comment(content_id, parent, depth), parent);
                }

                XmlEvent::ProcessingInstruction { target, data } => {
                    let name_id = self.strings.intern(&lossy(target));
                    let content_id = match data {
                        Some(d) => self.strings.intern(&lossy(d)),
                        None => 0,
                    };
                    let (parent, depth) = self.context(&stack);
                    self.append(
                        Node::processing_instruction(name_id, content_id, parent, depth),
                        parent,
                    );
                }

                // Prologue constructs carry no tree content.
                XmlEvent::XmlDeclaration { .. } | XmlEvent::DocType(_) => {}
            }
        }

        if strict {
            if let Some(unclosed) = open_names.first() {
                return Err(ParseError::UnclosedTag(unclosed.clone()));
            }
            if let Some(diag) = reader.diagnostics().first() {
                return Err(ParseError::Malformed {
                    message: diag.message.clone(),
                    offset: diag.offset,
                });
            }
        }

        self.diagnostics.extend(reader.into_diagnostics());
        Ok(())
    }

    fn context(&self, stack: &[NodeId]) -> (NodeId, u16) {
        let parent = *stack.last().unwrap_or(&0);
        (parent, stack.len() as u16)
    }

    fn append_element(
        &mut self,
        name: &str,
        attributes: &[crate::reader::Attribute<'_>],
        stack: &[NodeId],
    ) -> NodeId {
        let (parent, depth) = self.context(stack);
        let name_id = self.strings.intern(name);
        let mut node = Node::element(name_id, parent, depth);

        node.attr_start = self.attributes.len() as u32;
        node.attr_count = attributes.len().min(u16::MAX as usize) as u16;
        for attr in attributes {
            let attr_name_id = self.strings.intern(&lossy(attr.name));
            let attr_value_id = self.strings.intern(&lossy_cow(&attr.value));
            self.attributes.push(Attr::new(attr_name_id, attr_value_id));
        }

        let node_id = self.append(node, parent);
        if parent == 0 && self.root_element.is_none() {
            self.root_element = Some(node_id);
        }
        node_id
    }

    fn append(&mut self, node: Node, parent: NodeId) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent, node_id);
        node_id
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last = self.nodes[parent as usize].last_child;
        match prev_last {
            Some(last) => {
                self.nodes[last as usize].next_sibling = Some(child);
                self.nodes[child as usize].prev_sibling = Some(last);
            }
            None => {
                self.nodes[parent as usize].first_child = Some(child);
            }
        }
        self.nodes[parent as usize].last_child = Some(child);
    }
}

fn find_duplicate_attribute(attrs: &[crate::reader::Attribute<'_>]) -> Option<String> {
    for i in 0..attrs.len() {
        for j in (i + 1)..attrs.len() {
            if attrs[i].name == attrs[j].name {
                return Some(String::from_utf8_lossy(attrs[i].name).into_owned());
            }
        }
    }
    None
}

fn lossy(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn lossy_cow<'a>(bytes: &'a std::borrow::Cow<'a, [u8]>) -> std::borrow::Cow<'a, str> {
    String::from_utf8_lossy(bytes.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse("<root><child>hello</child></root>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.name(root), "root");
        let child = doc.child_named(root, "child").unwrap();
        assert_eq!(doc.inner_text(child), "hello");
    }

    #[test]
    fn test_attributes() {
        let doc = Document::parse("<r a=\"1\" b=\"2\"/>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.attribute(root, "a"), Some("1"));
        assert_eq!(doc.attribute(root, "b"), Some("2"));
        assert_eq!(doc.attribute(root, "c"), None);
        let pairs: Vec<_> = doc.attribute_pairs(root).collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_next_element_sibling_skips_text_and_comments() {
        let doc = Document::parse("<r><a/>text<!-- c --><b/></r>");
        let root = doc.root_element_id().unwrap();
        let a = doc.child_named(root, "a").unwrap();
        let b = doc.next_element_sibling(a).unwrap();
        assert_eq!(doc.name(b), "b");
        assert_eq!(doc.next_element_sibling(b), None);
    }

    #[test]
    fn test_inner_text_element_first_is_empty() {
        let doc = Document::parse("<r><a/>tail</r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.inner_text(root), "");
    }

    #[test]
    fn test_string_value_concatenates() {
        let doc = Document::parse("<r>a<b>b</b>c</r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.string_value(root), "abc");
    }

    #[test]
    fn test_cdata_is_text_content() {
        let doc = Document::parse("<r><![CDATA[<raw>]]></r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.inner_text(root), "<raw>");
    }

    #[test]
    fn test_lenient_truncated_input() {
        let doc = Document::parse("<root><a>1</a><b>2");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.child_content(root, "a"), Some("1"));
        assert_eq!(doc.child_content(root, "b"), Some("2"));
    }

    #[test]
    fn test_lenient_mismatched_close_recovers() {
        let doc = Document::parse("<root><a><b></a></root>");
        let root = doc.root_element_id().unwrap();
        let a = doc.child_named(root, "a").unwrap();
        assert!(doc.child_named(a, "b").is_some());
    }

    #[test]
    fn test_strict_rejects_mismatch() {
        let err = Document::parse_strict("<a><b></a></b>").unwrap_err();
        assert!(matches!(err, ParseError::TagMismatch { .. }));
    }

    #[test]
    fn test_strict_rejects_multiple_roots() {
        let err = Document::parse_strict("<a/><b/>").unwrap_err();
        assert!(matches!(err, ParseError::MultipleRoots));
    }

    #[test]
    fn test_strict_rejects_unclosed() {
        let err = Document::parse_strict("<a><b></b>").unwrap_err();
        assert!(matches!(err, ParseError::UnclosedTag(name) if name == "a"));
    }

    #[test]
    fn test_strict_rejects_duplicate_attribute() {
        let err = Document::parse_strict("<a x=\"1\" x=\"2\"/>").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateAttribute(name) if name == "x"));
    }

    #[test]
    fn test_strict_accepts_well_formed() {
        let doc = Document::parse_strict("<?xml version=\"1.0\"?><a><b/></a>").unwrap();
        assert_eq!(doc.name(doc.root_element_id().unwrap()), "a");
    }

    #[test]
    fn test_descendants_document_order() {
        let doc = Document::parse("<r><a><b/></a><c/></r>");
        let root = doc.root_element_id().unwrap();
        let names: Vec<_> = doc.descendants(root).map(|id| doc.name(id).to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_input_has_no_root() {
        let doc = Document::parse("");
        assert!(doc.root_element_id().is_none());
        assert_eq!(doc.node_count(), 1);
    }
}
