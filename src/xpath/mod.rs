//! XPath 1.0 engine.
//!
//! Pipeline: lexer, recursive descent parser, compiler to a flat op
//! program, stack evaluator. Compiled expressions are cached per
//! extractor in an LRU keyed by source text.

pub mod axes;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::XPathError;
pub use value::XPathValue;

use compiler::CompiledExpr;
use eval::EvalContext;
use lru::LruCache;
use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;

use crate::dom::{Document, NodeId};

const CACHE_CAPACITY: usize = 64;

/// LRU cache of compiled expressions keyed by source text.
///
/// Interior mutability keeps lookups usable from shared references; the
/// cache is single-threaded like the documents it serves.
pub struct ExprCache {
    cache: RefCell<LruCache<String, Rc<CompiledExpr>>>,
}

impl ExprCache {
    pub fn new() -> Self {
        ExprCache {
            cache: RefCell::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Compiled form of the expression, from cache or freshly compiled.
    pub fn get(&self, xpath: &str) -> Result<Rc<CompiledExpr>, XPathError> {
        let mut cache = self.cache.borrow_mut();
        if let Some(compiled) = cache.get(xpath) {
            return Ok(Rc::clone(compiled));
        }
        let compiled = Rc::new(compiler::compile(xpath)?);
        cache.put(xpath.to_string(), Rc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl Default for ExprCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate against the whole document. Absolute paths start at the
/// document node; relative paths start at the root element.
pub fn evaluate(doc: &Document, xpath: &str) -> Result<XPathValue, XPathError> {
    let compiled = compiler::compile(xpath)?;
    evaluate_compiled_at(doc, &compiled, doc.root_element_id().unwrap_or(0))
}

/// Evaluate with a specific context node for relative paths.
pub fn evaluate_from_node(
    doc: &Document,
    context_node: NodeId,
    xpath: &str,
) -> Result<XPathValue, XPathError> {
    let compiled = compiler::compile(xpath)?;
    evaluate_compiled_at(doc, &compiled, context_node)
}

/// Evaluate an already compiled expression.
pub fn evaluate_compiled_at(
    doc: &Document,
    compiled: &CompiledExpr,
    context_node: NodeId,
) -> Result<XPathValue, XPathError> {
    let ctx = EvalContext::new(doc, context_node);
    eval::evaluate_compiled(compiled, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_absolute() {
        let doc = Document::parse("<root><a/></root>");
        let result = evaluate(&doc, "/root/a").unwrap();
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
    }

    #[test]
    fn test_cache_reuses_compilations() {
        let cache = ExprCache::new();
        let first = cache.get("//a").unwrap();
        let second = cache.get("//a").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_propagates_syntax_errors() {
        let cache = ExprCache::new();
        assert!(cache.get("//a[").is_err());
        assert!(cache.is_empty());
    }
}
