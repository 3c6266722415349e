//! Extraction façade.
//!
//! [`Extractor`] owns a parsed document together with a per-document
//! expression cache and offers path-based value extraction. Every
//! operation is infallible at the API surface: failures come back as
//! `None`, `false`, or an empty enumerator, never as a panic or error
//! the caller must unwrap.

use crate::dom::{Document, NodeId, NodeKind};
use crate::serial::{self, SerializeOptions};
use crate::xpath::{ExprCache, XPathValue};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// A parsed document plus its expression cache.
///
/// Construction never fails; a document whose text could not be
/// recovered at all simply has no root element, and every extraction
/// against it comes back empty. Single-threaded by design: the cache
/// uses interior mutability without synchronization.
pub struct Extractor {
    doc: Document,
    exprs: ExprCache,
}

impl Extractor {
    /// Parse `xml` leniently. With `suppress_errors` unset, recovered
    /// parse problems are logged; the resulting document is the same
    /// either way.
    pub fn new(xml: &str, suppress_errors: bool) -> Self {
        let doc = Document::parse(xml);
        if !suppress_errors {
            for diag in doc.diagnostics() {
                warn!(offset = diag.offset, "xml parse: {}", diag.message);
            }
        }
        Extractor {
            doc,
            exprs: ExprCache::new(),
        }
    }

    /// False when no root element could be recovered from the input.
    pub fn is_valid(&self) -> bool {
        self.doc.root_element_id().is_some()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn eval(&self, expr: &str, scope: Option<NodeId>) -> Option<XPathValue> {
        let compiled = match self.exprs.get(expr) {
            Ok(compiled) => compiled,
            Err(err) => {
                warn!(expr, "xpath: {err}");
                return None;
            }
        };
        let context = scope.or(self.doc.root_element_id()).unwrap_or(0);
        match crate::xpath::evaluate_compiled_at(&self.doc, &compiled, context) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(expr, "xpath: {err}");
                None
            }
        }
    }

    fn eval_nodes(&self, expr: &str, scope: Option<NodeId>) -> Option<Vec<NodeId>> {
        match self.eval(expr, scope)? {
            XPathValue::NodeSet(nodes) => Some(nodes),
            _ => Some(Vec::new()),
        }
    }

    /// Text of a matched node: a text or CDATA node's own content, an
    /// element's leading text run.
    fn node_text(&self, id: NodeId) -> &str {
        match self.doc.kind(id) {
            Some(NodeKind::Text | NodeKind::CData) => self.doc.content(id),
            _ => self.doc.inner_text(id),
        }
    }

    /// Inner text of the first node matched by `expr`, in document
    /// order. None when nothing matched.
    pub fn first_value(&self, expr: &str) -> Option<String> {
        match self.eval(expr, None)? {
            XPathValue::NodeSet(nodes) => {
                nodes.first().map(|&id| self.node_text(id).to_string())
            }
            XPathValue::String(s) => Some(s),
            XPathValue::Strings(list) => list.into_iter().next(),
            _ => None,
        }
    }

    /// Local name to inner text for every matched node. Duplicate names
    /// keep the last match. None when nothing matched.
    pub fn values_by_name(&self, expr: &str) -> Option<HashMap<String, String>> {
        self.collect_values(expr, None)
    }

    /// Like [`Extractor::values_by_name`], with relative paths resolved
    /// from `scope` instead of the root element.
    pub fn values_under(&self, scope: NodeId, expr: &str) -> Option<HashMap<String, String>> {
        self.collect_values(expr, Some(scope))
    }

    fn collect_values(&self, expr: &str, scope: Option<NodeId>) -> Option<HashMap<String, String>> {
        let nodes = self.eval_nodes(expr, scope)?;
        if nodes.is_empty() {
            return None;
        }
        let mut map = HashMap::with_capacity(nodes.len());
        for id in nodes {
            map.insert(
                self.doc.local_name(id).to_string(),
                self.node_text(id).to_string(),
            );
        }
        Some(map)
    }

    /// Value of `attr` on the first node matched by `expr`. None when
    /// nothing matched or the attribute is absent.
    pub fn attribute_value(&self, expr: &str, attr: &str) -> Option<String> {
        let nodes = self.eval_nodes(expr, None)?;
        let first = *nodes.first()?;
        self.doc.attribute(first, attr).map(str::to_string)
    }

    /// All attributes of the first node matched by `expr`. None when
    /// nothing matched; an attribute-less match yields an empty map.
    pub fn all_attributes(&self, expr: &str) -> Option<HashMap<String, String>> {
        let nodes = self.eval_nodes(expr, None)?;
        let first = *nodes.first()?;
        let map = self
            .doc
            .attribute_pairs(first)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Some(map)
    }

    /// Hand the matched node set to `handler` and return its verdict.
    /// False without invoking the handler when the expression is
    /// malformed or nothing matched; the node set is released when this
    /// call returns, on every path.
    pub fn with_nodes<F>(&self, expr: &str, handler: F) -> bool
    where
        F: FnOnce(&[NodeId]) -> bool,
    {
        match self.eval_nodes(expr, None) {
            Some(nodes) if !nodes.is_empty() => handler(&nodes),
            _ => false,
        }
    }

    /// Enumerator over the nodes matched by `expr` against the whole
    /// document.
    pub fn nodes(&self, expr: &str) -> XPathEnumerator<'_> {
        XPathEnumerator::new(self, expr, None)
    }

    /// Enumerator scoped under `scope` for relative paths.
    pub fn nodes_under(&self, scope: NodeId, expr: &str) -> XPathEnumerator<'_> {
        XPathEnumerator::new(self, expr, Some(scope))
    }

    /// Serialize the whole document to `path`. Debug builds write
    /// indented output, release builds compact output.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> bool {
        let options = SerializeOptions::default().indent(cfg!(debug_assertions));
        let xml = serial::document_xml(&self.doc, &options);
        match std::fs::write(path.as_ref(), xml) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.as_ref().display(), "serialize: {err}");
                false
            }
        }
    }

    /// Serialized markup of the node including its own tag.
    pub fn outer_xml(&self, id: NodeId) -> String {
        serial::outer_xml(&self.doc, id, &SerializeOptions::default())
    }

    /// Serialized markup of the node's content only.
    pub fn inner_xml(&self, id: NodeId) -> String {
        serial::inner_xml(&self.doc, id, &SerializeOptions::default())
    }
}

/// Restartable forward cursor over one evaluation's node set.
///
/// The cursor starts before the first node and advances through
/// [`XPathEnumerator::next`]. Traversal position is interior-mutable
/// state: the sequence is read-only, the position is not. The node set
/// is released when the enumerator drops.
pub struct XPathEnumerator<'a> {
    doc: &'a Document,
    nodes: Vec<NodeId>,
    invalid: bool,
    cursor: Cell<isize>,
}

impl<'a> XPathEnumerator<'a> {
    fn new(extractor: &'a Extractor, expr: &str, scope: Option<NodeId>) -> Self {
        let (nodes, invalid) = match extractor.eval_nodes(expr, scope) {
            Some(nodes) => (nodes, false),
            None => (Vec::new(), true),
        };
        XPathEnumerator {
            doc: &extractor.doc,
            nodes,
            invalid,
            cursor: Cell::new(-1),
        }
    }

    /// True iff evaluation failed outright. A valid evaluation with
    /// zero matches is not invalid.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.cursor.get() < self.nodes.len() as isize - 1
    }

    /// Advance the cursor and return the node there.
    ///
    /// Callers must check [`XPathEnumerator::has_next`] first; advancing
    /// past the end is out of contract and panics on the out-of-range
    /// index.
    pub fn next(&self) -> NodeId {
        let cursor = self.cursor.get() + 1;
        self.cursor.set(cursor);
        self.nodes[cursor as usize]
    }

    /// Move the cursor back before the first node.
    pub fn reset(&self) {
        self.cursor.set(-1);
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }
}
