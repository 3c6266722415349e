//! Axis navigation and node tests.

use super::parser::{Axis, NodeTest};
use crate::dom::{Document, NodeId, NodeKind};

/// Nodes reached from `context` along `axis`, in axis order.
///
/// The attribute axis is handled by the evaluator, which yields attribute
/// values rather than nodes; here it is empty.
pub fn navigate(doc: &Document, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => doc.descendants(context).collect(),
        Axis::DescendantOrSelf => {
            let mut result = vec![context];
            result.extend(doc.descendants(context));
            result
        }
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Ancestor => ancestors(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestors(doc, context));
            result
        }
        Axis::FollowingSibling => siblings(context, |id| doc.next_sibling_of(id)),
        Axis::PrecedingSibling => siblings(context, |id| doc.prev_sibling_of(id)),
        Axis::Self_ => vec![context],
        Axis::Attribute => Vec::new(),
    }
}

fn ancestors(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }
    result
}

fn siblings(context: NodeId, step: impl Fn(NodeId) -> Option<NodeId>) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = step(context);
    while let Some(id) = current {
        result.push(id);
        current = step(id);
    }
    result
}

/// True if the node passes the node test.
pub fn matches_node_test(doc: &Document, id: NodeId, node_test: &NodeTest) -> bool {
    let Some(kind) = doc.kind(id) else {
        return false;
    };

    match node_test {
        NodeTest::Any => kind == NodeKind::Element,
        NodeTest::Name(name) => kind == NodeKind::Element && doc.name(id) == name,
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target.as_deref().map_or(true, |t| doc.name(id) == t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, NodeId) {
        let doc = Document::parse("<root><a><b/></a>text<c/></root>");
        let root = doc.root_element_id().unwrap();
        (doc, root)
    }

    #[test]
    fn test_child_axis_includes_text() {
        let (doc, root) = setup();
        assert_eq!(navigate(&doc, root, Axis::Child).len(), 3);
    }

    #[test]
    fn test_descendant_axis() {
        let (doc, root) = setup();
        assert_eq!(navigate(&doc, root, Axis::Descendant).len(), 4);
    }

    #[test]
    fn test_ancestor_axis_reaches_document() {
        let (doc, root) = setup();
        let a = doc.child_named(root, "a").unwrap();
        let b = doc.child_named(a, "b").unwrap();
        // a, root, document node
        assert_eq!(navigate(&doc, b, Axis::Ancestor), vec![a, root, 0]);
    }

    #[test]
    fn test_sibling_axes() {
        let (doc, root) = setup();
        let a = doc.child_named(root, "a").unwrap();
        let c = doc.child_named(root, "c").unwrap();
        // text node sits between a and c
        assert_eq!(navigate(&doc, a, Axis::FollowingSibling).len(), 2);
        assert_eq!(navigate(&doc, c, Axis::PrecedingSibling).len(), 2);
    }

    #[test]
    fn test_name_test_matches_elements_only() {
        let (doc, root) = setup();
        assert!(matches_node_test(&doc, root, &NodeTest::Name("root".to_string())));
        assert!(!matches_node_test(&doc, root, &NodeTest::Name("other".to_string())));
        let text = doc
            .children(root)
            .find(|&id| doc.kind(id) == Some(NodeKind::Text))
            .unwrap();
        assert!(!matches_node_test(&doc, text, &NodeTest::Any));
        assert!(matches_node_test(&doc, text, &NodeTest::Text));
    }
}
