//! Arena node representation.
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into the arena).
pub type NodeId = u32;

/// Kind of DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// A node in the arena.
///
/// Elements use `name_id` for the tag name; text, CDATA, and comment nodes
/// use `content_id` for their character data. Processing instructions use
/// `name_id` for the target and `content_id` for the data.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// String pool ID of the name (elements, PI targets), or 0.
    pub name_id: u32,
    /// String pool ID of character data, or 0.
    pub content_id: u32,
    /// Start of this element's run in the attribute arena.
    pub attr_start: u32,
    /// Number of attributes.
    pub attr_count: u16,
    /// Depth in the tree; the document root is 0.
    pub depth: u16,
}

impl Node {
    fn blank(kind: NodeKind, parent: Option<NodeId>, depth: u16) -> Self {
        Node {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            content_id: 0,
            attr_start: 0,
            attr_count: 0,
            depth,
        }
    }

    pub fn document() -> Self {
        Self::blank(NodeKind::Document, None, 0)
    }

    pub fn element(name_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            name_id,
            ..Self::blank(NodeKind::Element, Some(parent), depth)
        }
    }

    pub fn text(content_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            content_id,
            ..Self::blank(NodeKind::Text, Some(parent), depth)
        }
    }

    pub fn cdata(content_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            content_id,
            ..Self::blank(NodeKind::CData, Some(parent), depth)
        }
    }

    pub fn comment(content_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            content_id,
            ..Self::blank(NodeKind::Comment, Some(parent), depth)
        }
    }

    pub fn processing_instruction(name_id: u32, content_id: u32, parent: NodeId, depth: u16) -> Self {
        Node {
            name_id,
            content_id,
            ..Self::blank(NodeKind::ProcessingInstruction, Some(parent), depth)
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.attr_count > 0
    }
}

/// Stored attribute.
#[derive(Debug, Clone)]
pub struct Attr {
    pub name_id: u32,
    pub value_id: u32,
}

impl Attr {
    pub fn new(name_id: u32, value_id: u32) -> Self {
        Attr { name_id, value_id }
    }
}
