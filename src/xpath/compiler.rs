//! Compiles parsed XPath expressions into a flat operation program.
//!
//! Two predicate shapes are common enough to deserve direct operations
//! instead of a nested evaluation: a literal position (`[2]`) and an
//! attribute equality test (`[@id='x']`).

use super::error::XPathError;
use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};

/// Compiled expression, ready for the evaluator.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

#[derive(Debug, Clone)]
pub enum Op {
    /// Push the document node.
    Root,
    /// Push the context node.
    Context,
    /// Replace the node set with its parents.
    Parent,
    /// Navigate along an axis, filtering by node test.
    Navigate(Axis, NodeTest),
    /// Filter the node set with a general predicate.
    Predicate(Box<CompiledExpr>),
    /// Keep only the node at the given 1-based position.
    PredicatePosition(usize),
    /// Keep only nodes whose attribute equals the value.
    PredicateAttrEq(String, String),
    /// Union two node sets.
    Union,
    Number(f64),
    String(String),
    /// Call a function with the given argument count.
    Call(String, usize),
    Binary(BinaryOp),
    Negate,
}

impl CompiledExpr {
    pub fn compile(expr: &Expr) -> Self {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops);
        CompiledExpr { ops }
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) {
        match expr {
            Expr::Root => ops.push(Op::Root),
            Expr::Context => ops.push(Op::Context),
            Expr::Parent => {
                ops.push(Op::Context);
                ops.push(Op::Parent);
            }
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops);
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Union);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, ops);
                Self::compile_step(step, ops);
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, ops);
                ops.push(Self::compile_predicate(pred));
            }
            Expr::Step(step) => {
                ops.push(Op::Context);
                Self::compile_step(step, ops);
            }
            Expr::Function(name, args) => {
                for arg in args {
                    Self::compile_expr(arg, ops);
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
        }
    }

    fn compile_step(step: &Step, ops: &mut Vec<Op>) {
        ops.push(Op::Navigate(step.axis, step.node_test.clone()));
        for pred in &step.predicates {
            ops.push(Self::compile_predicate(pred));
        }
    }

    fn compile_predicate(pred: &Expr) -> Op {
        if let Expr::Number(n) = pred {
            if *n >= 1.0 && n.fract() == 0.0 {
                return Op::PredicatePosition(*n as usize);
            }
        }

        if let Expr::Binary(left, BinaryOp::Eq, right) = pred {
            let pair = match (left.as_ref(), right.as_ref()) {
                (Expr::Step(step), Expr::String(value))
                | (Expr::String(value), Expr::Step(step)) => Some((step, value)),
                _ => None,
            };
            if let Some((step, value)) = pair {
                if step.axis == Axis::Attribute && step.predicates.is_empty() {
                    if let NodeTest::Name(attr) = &step.node_test {
                        return Op::PredicateAttrEq(attr.clone(), value.clone());
                    }
                }
            }
        }

        Op::Predicate(Box::new(CompiledExpr::compile(pred)))
    }
}

/// Compile an XPath expression string.
pub fn compile(xpath: &str) -> Result<CompiledExpr, XPathError> {
    let expr = super::parser::parse(xpath)?;
    Ok(CompiledExpr::compile(&expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple() {
        let compiled = compile("/root").unwrap();
        assert!(matches!(compiled.ops[0], Op::Root));
        assert!(matches!(compiled.ops[1], Op::Navigate(Axis::Child, _)));
    }

    #[test]
    fn test_position_fast_path() {
        let compiled = compile("/root/*[2]").unwrap();
        assert!(matches!(compiled.ops.last(), Some(Op::PredicatePosition(2))));
    }

    #[test]
    fn test_attr_eq_fast_path() {
        let compiled = compile("//item[@id='x']").unwrap();
        assert!(matches!(
            compiled.ops.last(),
            Some(Op::PredicateAttrEq(attr, value)) if attr == "id" && value == "x"
        ));
    }

    #[test]
    fn test_general_predicate() {
        let compiled = compile("//item[position() > 1]").unwrap();
        assert!(matches!(compiled.ops.last(), Some(Op::Predicate(_))));
    }

    #[test]
    fn test_syntax_error_propagates() {
        assert!(compile("//item[").is_err());
    }
}
