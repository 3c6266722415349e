//! Recursive descent parser for XPath 1.0 expressions.

use super::error::XPathError;
use super::lexer::{Lexer, Token};

/// Expression AST node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Current context (.)
    Context,
    /// Parent (..)
    Parent,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    Number(f64),
    String(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path.
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// Supported axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Self_,
    Attribute,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            _ => None,
        }
    }
}

/// Node test in a location step. Names are matched as opaque strings,
/// qualified or not.
#[derive(Debug, Clone)]
pub enum NodeTest {
    /// * matches any element
    Any,
    /// Matches elements (or attributes) by name
    Name(String),
    /// node() matches any node
    Node,
    /// text() matches text and CDATA nodes
    Text,
    /// comment()
    Comment,
    /// processing-instruction(), optionally with a target
    ProcessingInstruction(Option<String>),
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            peeked: None,
        }
    }

    pub fn parse(&mut self) -> Result<Expr, XPathError> {
        let expr = self.parse_expr()?;
        if !matches!(self.current, Token::Eof) {
            return Err(XPathError::Syntax(format!(
                "unexpected token after expression: {:?}",
                self.current
            )));
        }
        Ok(expr)
    }

    fn advance(&mut self) {
        self.current = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token(),
        };
    }

    fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token());
        }
        self.peeked.as_ref().unwrap()
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), XPathError> {
        if self.current == token {
            self.advance();
            Ok(())
        } else {
            Err(XPathError::Syntax(format!(
                "expected {what}, got {:?}",
                self.current
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, XPathError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.current, Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_equality_expr()?;
        while matches!(self.current, Token::And) {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, XPathError> {
        if matches!(self.current, Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_expr()?;
        while matches!(self.current, Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_expr(&mut self) -> Result<Expr, XPathError> {
        let expr = match self.current {
            Token::Slash => {
                self.advance();
                if matches!(
                    self.current,
                    Token::Eof
                        | Token::RightBracket
                        | Token::RightParen
                        | Token::Pipe
                        | Token::Comma
                ) {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                // //x is shorthand for /descendant-or-self::node()/x
                let step = self.parse_step()?;
                Expr::Path(
                    Box::new(Expr::Path(
                        Box::new(Expr::Root),
                        Box::new(Step::descendant_or_self()),
                    )),
                    Box::new(step),
                )
            }
            _ => return self.parse_filter_expr(),
        };

        self.parse_path_continuation(expr)
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, XPathError> {
        let expr = self.parse_primary_expr()?;
        self.parse_path_continuation(expr)
    }

    /// Consume trailing /step, //step, and [pred] segments.
    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, XPathError> {
        loop {
            match self.current {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(
                        Box::new(Expr::Path(
                            Box::new(expr),
                            Box::new(Step::descendant_or_self()),
                        )),
                        Box::new(step),
                    );
                }
                Token::LeftBracket => {
                    self.advance();
                    let pred = self.parse_expr()?;
                    self.expect(Token::RightBracket, "]")?;
                    expr = Expr::Filter(Box::new(expr), Box::new(pred));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, XPathError> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::String(s))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen, ")")?;
                Ok(expr)
            }
            Token::Name(name) => {
                let name = name.clone();
                if matches!(self.peek(), Token::LeftParen) {
                    self.advance();
                    self.advance();
                    let args = self.parse_function_args()?;
                    Ok(Expr::Function(name, args))
                } else {
                    let step = self.parse_step()?;
                    Ok(Expr::Step(Box::new(step)))
                }
            }
            Token::NodeType(_) | Token::Star | Token::At | Token::Axis(_) => {
                let step = self.parse_step()?;
                Ok(Expr::Step(Box::new(step)))
            }
            Token::Dot => {
                self.advance();
                Ok(Expr::Context)
            }
            Token::DoubleDot => {
                self.advance();
                Ok(Expr::Parent)
            }
            other => Err(XPathError::Syntax(format!("unexpected token: {other:?}"))),
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let mut axis = Axis::Child;

        if matches!(self.current, Token::At) {
            axis = Axis::Attribute;
            self.advance();
        } else if let Token::Axis(name) = &self.current {
            axis = Axis::from_name(name).ok_or_else(|| XPathError::UnknownAxis(name.clone()))?;
            self.advance();
            self.expect(Token::DoubleColon, ":: after axis")?;
        }

        let node_test = match &self.current {
            Token::Star => {
                self.advance();
                NodeTest::Any
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance();
                NodeTest::Name(name)
            }
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance();
                self.expect(Token::LeftParen, "(")?;
                let arg = if let Token::String(s) = &self.current {
                    let s = s.clone();
                    self.advance();
                    Some(s)
                } else {
                    None
                };
                self.expect(Token::RightParen, ")")?;
                match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    "processing-instruction" => NodeTest::ProcessingInstruction(arg),
                    _ => return Err(XPathError::UnknownNodeType(name)),
                }
            }
            other => {
                return Err(XPathError::Syntax(format!(
                    "expected node test, got {other:?}"
                )))
            }
        };

        let mut predicates = Vec::new();
        while matches!(self.current, Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_expr()?);
            self.expect(Token::RightBracket, "]")?;
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut args = Vec::new();

        if !matches!(self.current, Token::RightParen) {
            args.push(self.parse_expr()?);
            while matches!(self.current, Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Token::RightParen, ")")?;

        Ok(args)
    }
}

/// Parse an XPath expression string.
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_predicate() {
        let expr = parse("item[@id='test']").unwrap();
        assert!(matches!(expr, Expr::Step(_)));
    }

    #[test]
    fn test_descendant() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn test_unknown_axis_rejected() {
        let err = parse("following::x").unwrap_err();
        assert!(matches!(err, XPathError::UnknownAxis(name) if name == "following"));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse("/root )").is_err());
    }

    #[test]
    fn test_unterminated_predicate_rejected() {
        assert!(matches!(parse("item[@id"), Err(XPathError::Syntax(_))));
    }
}
