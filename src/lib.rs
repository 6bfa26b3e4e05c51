//! jxml: JSON-shaped values to XML, as one string or as a stream
//!
//! This crate provides functionality to:
//! - Resolve nested values (elements, `_attr` and `_cdata` markers, scalars)
//!   into an ordered node representation
//! - Format that representation with optional indentation and an XML
//!   declaration
//! - Suspend formatting at deferred elements and resume it as a producer
//!   pushes their children, flushing the document piece by piece
//!
//! # Examples
//! ```
//! use jxml::{to_xml, Node, Options};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), jxml::Error> {
//! let input = Node::from(json!({"b": [{"_attr": {"x": "1"}}, "hi"]}));
//! assert_eq!(to_xml(input, &Options::default())?, r#"<b x="1">hi</b>"#);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub use config::{Declaration, FlushPolicy, IndentStyle, Options};

pub mod error;
pub use error::{Error, ErrorKind, Result};

pub mod escape;
pub use escape::{cdata, escape};

pub mod node;
pub use node::{Node, Scalar};

pub mod resolver;
pub use resolver::{resolve, Content, IndentContext, ParsedNode};

pub mod formatter;
pub use formatter::{format, Append};

pub mod deferred;
pub use deferred::{Element, ElementId};

pub mod document;
pub use document::{to_xml, Document};

pub mod stream;
pub use stream::{StreamEvent, XmlStream};

/// Parses JSON text and renders it
pub fn json_to_xml(json: &str, options: &Options) -> std::result::Result<String, JsonError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(to_xml(Node::from(value), options)?)
}

/// Failure of [`json_to_xml`]
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Xml(#[from] Error),
}
