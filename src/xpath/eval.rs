//! Stack evaluator for compiled XPath programs.

use super::axes::{matches_node_test, navigate};
use super::compiler::{CompiledExpr, Op};
use super::error::XPathError;
use super::functions;
use super::parser::{Axis, BinaryOp, NodeTest};
use super::value::XPathValue;
use crate::dom::{Document, NodeId};
use std::collections::HashSet;

/// Evaluation context.
pub struct EvalContext<'a> {
    pub doc: &'a Document,
    pub context_node: NodeId,
    pub context_position: usize,
    pub context_size: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(doc: &'a Document, context_node: NodeId) -> Self {
        EvalContext {
            doc,
            context_node,
            context_position: 1,
            context_size: 1,
        }
    }
}

/// Run a compiled expression.
pub fn evaluate_compiled(
    expr: &CompiledExpr,
    ctx: &EvalContext<'_>,
) -> Result<XPathValue, XPathError> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            Op::Root => stack.push(XPathValue::single_node(0)),

            Op::Context => stack.push(XPathValue::single_node(ctx.context_node)),

            Op::Parent => {
                let current = stack
                    .pop()
                    .unwrap_or_else(|| XPathValue::single_node(ctx.context_node));
                match current {
                    XPathValue::NodeSet(nodes) => {
                        let mut seen = HashSet::with_capacity(nodes.len());
                        let mut parents = Vec::with_capacity(nodes.len());
                        for node in nodes {
                            if let Some(parent) = ctx.doc.parent_of(node) {
                                if seen.insert(parent) {
                                    parents.push(parent);
                                }
                            }
                        }
                        parents.sort_unstable();
                        stack.push(XPathValue::NodeSet(parents));
                    }
                    _ => stack.push(XPathValue::empty_nodeset()),
                }
            }

            Op::Navigate(axis, node_test) => {
                let current = stack
                    .pop()
                    .unwrap_or_else(|| XPathValue::single_node(ctx.context_node));
                let XPathValue::NodeSet(nodes) = current else {
                    stack.push(XPathValue::empty_nodeset());
                    continue;
                };

                if *axis == Axis::Attribute {
                    stack.push(attribute_values(ctx.doc, &nodes, node_test));
                    continue;
                }

                // Dedup with a set; node IDs are assigned in document
                // order, so a sort restores it.
                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());
                for node in nodes {
                    for candidate in navigate(ctx.doc, node, *axis) {
                        if matches_node_test(ctx.doc, candidate, node_test)
                            && seen.insert(candidate)
                        {
                            result.push(candidate);
                        }
                    }
                }
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Predicate(pred_expr) => {
                let current = stack.pop().unwrap_or_default();
                let XPathValue::NodeSet(nodes) = current else {
                    stack.push(XPathValue::empty_nodeset());
                    continue;
                };

                let size = nodes.len();
                let mut filtered = Vec::new();
                for (i, &node) in nodes.iter().enumerate() {
                    let pred_ctx = EvalContext {
                        doc: ctx.doc,
                        context_node: node,
                        context_position: i + 1,
                        context_size: size,
                    };
                    let pred_result = evaluate_compiled(pred_expr, &pred_ctx)?;

                    // A numeric predicate is a position test.
                    let include = match pred_result {
                        XPathValue::Number(n) => (i + 1) as f64 == n,
                        other => other.to_boolean(),
                    };
                    if include {
                        filtered.push(node);
                    }
                }
                stack.push(XPathValue::NodeSet(filtered));
            }

            Op::PredicatePosition(pos) => {
                let current = stack.pop().unwrap_or_default();
                let result = match current {
                    XPathValue::NodeSet(nodes) if *pos >= 1 && *pos <= nodes.len() => {
                        XPathValue::NodeSet(vec![nodes[*pos - 1]])
                    }
                    _ => XPathValue::empty_nodeset(),
                };
                stack.push(result);
            }

            Op::PredicateAttrEq(attr_name, value) => {
                let current = stack.pop().unwrap_or_default();
                let XPathValue::NodeSet(nodes) = current else {
                    stack.push(XPathValue::empty_nodeset());
                    continue;
                };
                let filtered = nodes
                    .into_iter()
                    .filter(|&node| ctx.doc.attribute(node, attr_name) == Some(value))
                    .collect();
                stack.push(XPathValue::NodeSet(filtered));
            }

            Op::Union => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();
                match (left, right) {
                    (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
                        let mut seen: HashSet<NodeId> = l.iter().copied().collect();
                        let mut result = l;
                        result.reserve(r.len());
                        for node in r {
                            if seen.insert(node) {
                                result.push(node);
                            }
                        }
                        result.sort_unstable();
                        stack.push(XPathValue::NodeSet(result));
                    }
                    _ => {
                        return Err(XPathError::Type(
                            "union requires two node-sets".to_string(),
                        ))
                    }
                }
            }

            Op::Number(n) => stack.push(XPathValue::Number(*n)),

            Op::String(s) => stack.push(XPathValue::String(s.clone())),

            Op::Negate => {
                let val = stack.pop().unwrap_or(XPathValue::Number(0.0));
                stack.push(XPathValue::Number(-val.to_number()));
            }

            Op::Binary(op) => {
                let right = stack.pop().unwrap_or(XPathValue::Number(f64::NAN));
                let left = stack.pop().unwrap_or(XPathValue::Number(f64::NAN));
                stack.push(apply_binary(ctx.doc, *op, &left, &right));
            }

            Op::Call(name, arg_count) => {
                let mut args = Vec::with_capacity(*arg_count);
                for _ in 0..*arg_count {
                    args.push(stack.pop().unwrap_or_default());
                }
                args.reverse();

                let result = functions::call(
                    name,
                    args,
                    ctx.doc,
                    ctx.context_node,
                    ctx.context_position,
                    ctx.context_size,
                )?;
                stack.push(result);
            }
        }
    }

    Ok(stack.pop().unwrap_or_default())
}

/// Attribute axis result: values of matching attributes across the node
/// set, as strings.
fn attribute_values(doc: &Document, nodes: &[NodeId], node_test: &NodeTest) -> XPathValue {
    let mut values: Vec<String> = Vec::new();
    for &node in nodes {
        match node_test {
            NodeTest::Any => {
                values.extend(doc.attribute_pairs(node).map(|(_, v)| v.to_string()));
            }
            NodeTest::Name(name) => {
                if let Some(value) = doc.attribute(node, name) {
                    values.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    match values.len() {
        0 => XPathValue::empty_nodeset(),
        1 => XPathValue::String(values.pop().unwrap_or_default()),
        _ => XPathValue::Strings(values),
    }
}

fn apply_binary(doc: &Document, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> XPathValue {
    match op {
        BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
        BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
        BinaryOp::Eq => compare_equality(doc, left, right, |a, b| a == b),
        BinaryOp::NotEq => compare_equality(doc, left, right, |a, b| a != b),
        BinaryOp::Lt => compare_numbers(doc, left, right, |a, b| a < b),
        BinaryOp::LtEq => compare_numbers(doc, left, right, |a, b| a <= b),
        BinaryOp::Gt => compare_numbers(doc, left, right, |a, b| a > b),
        BinaryOp::GtEq => compare_numbers(doc, left, right, |a, b| a >= b),
        BinaryOp::Add => arith(doc, left, right, |a, b| a + b),
        BinaryOp::Sub => arith(doc, left, right, |a, b| a - b),
        BinaryOp::Mul => arith(doc, left, right, |a, b| a * b),
        BinaryOp::Div => arith(doc, left, right, |a, b| a / b),
        BinaryOp::Mod => arith(doc, left, right, |a, b| a % b),
    }
}

/// Equality per XPath 1.0: node-sets compare by string-value, existentially.
fn compare_equality(
    doc: &Document,
    left: &XPathValue,
    right: &XPathValue,
    cmp: impl Fn(&str, &str) -> bool,
) -> XPathValue {
    match (left, right) {
        (XPathValue::NodeSet(ln), XPathValue::NodeSet(rn)) => {
            for &l in ln {
                let ls = doc.string_value(l);
                for &r in rn {
                    if cmp(&ls, &doc.string_value(r)) {
                        return XPathValue::Boolean(true);
                    }
                }
            }
            XPathValue::Boolean(false)
        }
        (XPathValue::NodeSet(nodes), other) | (other, XPathValue::NodeSet(nodes)) => {
            let other_str = resolve(doc, other);
            let matched = nodes.iter().any(|&n| cmp(&doc.string_value(n), &other_str));
            XPathValue::Boolean(matched)
        }
        (XPathValue::Strings(list), other) | (other, XPathValue::Strings(list)) => {
            let other_str = resolve(doc, other);
            XPathValue::Boolean(list.iter().any(|s| cmp(s, &other_str)))
        }
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => XPathValue::Boolean(cmp(
            &left.to_boolean().to_string(),
            &right.to_boolean().to_string(),
        )),
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => XPathValue::Boolean(cmp(
            &left.to_number().to_string(),
            &right.to_number().to_string(),
        )),
        (XPathValue::String(ls), XPathValue::String(rs)) => XPathValue::Boolean(cmp(ls, rs)),
    }
}

fn compare_numbers(
    doc: &Document,
    left: &XPathValue,
    right: &XPathValue,
    cmp: impl Fn(f64, f64) -> bool,
) -> XPathValue {
    XPathValue::Boolean(cmp(to_number(doc, left), to_number(doc, right)))
}

fn arith(
    doc: &Document,
    left: &XPathValue,
    right: &XPathValue,
    op: impl Fn(f64, f64) -> f64,
) -> XPathValue {
    XPathValue::Number(op(to_number(doc, left), to_number(doc, right)))
}

fn resolve(doc: &Document, val: &XPathValue) -> String {
    functions::resolve_string(val, doc)
}

fn to_number(doc: &Document, val: &XPathValue) -> f64 {
    match val {
        XPathValue::NodeSet(_) => resolve(doc, val).trim().parse().unwrap_or(f64::NAN),
        _ => val.to_number(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::compiler::compile;

    fn eval(doc: &Document, xpath: &str) -> XPathValue {
        let compiled = compile(xpath).unwrap();
        let ctx = EvalContext::new(doc, doc.root_element_id().unwrap_or(0));
        evaluate_compiled(&compiled, &ctx).unwrap()
    }

    #[test]
    fn test_absolute_path() {
        let doc = Document::parse("<root><child/></root>");
        let result = eval(&doc, "/root/child");
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
    }

    #[test]
    fn test_descendant_shorthand() {
        let doc = Document::parse("<root><a><b/></a><b/></root>");
        let result = eval(&doc, "//b");
        assert_eq!(result.as_nodeset().unwrap().len(), 2);
    }

    #[test]
    fn test_position_predicate() {
        let doc = Document::parse("<root><a/><b/><c/></root>");
        let result = eval(&doc, "/root/*[2]");
        let nodes = result.as_nodeset().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.name(nodes[0]), "b");
    }

    #[test]
    fn test_attribute_predicate() {
        let doc = Document::parse("<root><i id=\"1\"/><i id=\"2\"/></root>");
        let result = eval(&doc, "//i[@id='2']");
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
    }

    #[test]
    fn test_attribute_value() {
        let doc = Document::parse("<root><i id=\"7\"/></root>");
        let result = eval(&doc, "//i/@id");
        assert!(matches!(result, XPathValue::String(s) if s == "7"));
    }

    #[test]
    fn test_attribute_values_multiple() {
        let doc = Document::parse("<root><i id=\"1\"/><i id=\"2\"/></root>");
        let result = eval(&doc, "//i/@id");
        assert_eq!(
            result.as_strings().unwrap(),
            &["1".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_count_function() {
        let doc = Document::parse("<root><a/><a/><a/></root>");
        let result = eval(&doc, "count(/root/a)");
        assert_eq!(result.to_number(), 3.0);
    }

    #[test]
    fn test_text_comparison() {
        let doc = Document::parse("<root><a>x</a><a>y</a></root>");
        let result = eval(&doc, "//a[.='y']");
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
    }

    #[test]
    fn test_union() {
        let doc = Document::parse("<root><a/><b/></root>");
        let result = eval(&doc, "//a | //b");
        assert_eq!(result.as_nodeset().unwrap().len(), 2);
    }

    #[test]
    fn test_union_document_order() {
        let doc = Document::parse("<root><a/><b/></root>");
        let result = eval(&doc, "//b | //a");
        let names: Vec<_> = result
            .as_nodeset()
            .unwrap()
            .iter()
            .map(|&id| doc.name(id))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parent_step() {
        let doc = Document::parse("<root><a><b/></a></root>");
        let result = eval(&doc, "//b/..");
        let nodes = result.as_nodeset().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.name(nodes[0]), "a");
    }

    #[test]
    fn test_arithmetic() {
        let doc = Document::parse("<r/>");
        let result = eval(&doc, "1 + 2 * 3");
        assert_eq!(result.to_number(), 7.0);
    }

    #[test]
    fn test_no_match_is_empty_nodeset() {
        let doc = Document::parse("<root><a/></root>");
        let result = eval(&doc, "//nothing");
        assert_eq!(result.as_nodeset().unwrap().len(), 0);
    }

    #[test]
    fn test_relative_path_from_context() {
        let doc = Document::parse("<root><a><b>v</b></a></root>");
        let a = doc.child_named(doc.root_element_id().unwrap(), "a").unwrap();
        let compiled = compile("b").unwrap();
        let ctx = EvalContext::new(&doc, a);
        let result = evaluate_compiled(&compiled, &ctx).unwrap();
        assert_eq!(result.as_nodeset().unwrap().len(), 1);
    }
}
