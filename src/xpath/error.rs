//! XPath error type.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum XPathError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown axis: {0}")]
    UnknownAxis(String),
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("{0}")]
    Type(String),
}
