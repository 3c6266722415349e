//! xmlpath - lenient XML parsing with XPath 1.0 extraction.
//!
//! Layers:
//! - `reader`: recovering pull parser over raw bytes
//! - `dom`: arena-backed document built from reader events
//! - `xpath`: lexer, parser, compiler and evaluator with an LRU
//!   expression cache
//! - `serial`: compact or indented serialization back to markup
//! - `extract`: the high level [`Extractor`] façade most callers want
//!
//! ```
//! use xmlpath::Extractor;
//!
//! let ex = Extractor::new("<doc><item id=\"a\">one</item></doc>", true);
//! assert_eq!(ex.first_value("//item"), Some("one".to_string()));
//! assert_eq!(ex.attribute_value("//item", "id"), Some("a".to_string()));
//! ```

pub mod dom;
pub mod extract;
pub mod reader;
pub mod serial;
pub mod xpath;

pub use dom::{Document, NodeId, NodeKind, ParseError};
pub use extract::{Extractor, XPathEnumerator};
pub use reader::Diagnostic;
pub use serial::SerializeOptions;
pub use xpath::{XPathError, XPathValue};
