//! Arena-based DOM.
//!
//! Nodes are stored in a flat arena and addressed by NodeId (u32) for
//! cache-friendly traversal, with interned element and attribute names.

pub mod document;
pub mod node;
pub mod strings;

pub use document::{Document, ParseError};
pub use node::{Attr, Node, NodeId, NodeKind};
pub use strings::StringPool;
