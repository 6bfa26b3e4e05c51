//! Input values accepted by the resolver

use crate::deferred::Element;
use indexmap::IndexMap;
use std::fmt;

/// Reserved key marking an attribute mapping
pub const ATTR_KEY: &str = "_attr";
/// Reserved key marking a CDATA section
pub const CDATA_KEY: &str = "_cdata";

/// Character data rendered as escaped text
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    /// Integers keep every digit, including 64-bit ids beyond `f64` precision
    Integer(i128),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A JSON-shaped input node
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Absent value; resolves to an element without content
    #[default]
    Null,
    /// Text, number or boolean
    Scalar(Scalar),
    /// `_attr` marker: attribute name to raw value
    Attributes(IndexMap<String, String>),
    /// `_cdata` marker: raw text for a CDATA section
    Cdata(String),
    /// Single-key mapping from tag name to its value
    Element { name: String, content: Box<Node> },
    /// Ordered children, attribute markers and scalars
    List(Vec<Node>),
    /// Placeholder whose content is supplied later through the handle
    Deferred(Element),
}

impl Node {
    /// Builds a named element
    pub fn element(name: impl Into<String>, content: impl Into<Self>) -> Self {
        Self::Element {
            name: name.into(),
            content: Box::new(content.into()),
        }
    }

    /// Builds an attribute marker
    pub fn attrs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a CDATA marker
    pub fn cdata(raw: impl Into<String>) -> Self {
        Self::Cdata(raw.into())
    }

    /// Builds a text scalar
    pub fn text(text: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(text.into()))
    }

    /// Builds an ordered list
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Returns true if this node is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this node is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Returns the element name if this is a named element
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Number(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Self::Scalar(Scalar::Integer(i128::from(value)))
    }
}

impl From<u32> for Node {
    fn from(value: u32) -> Self {
        Self::Scalar(Scalar::Integer(i128::from(value)))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(i128::from(value)))
    }
}

impl From<u64> for Node {
    fn from(value: u64) -> Self {
        Self::Scalar(Scalar::Integer(i128::from(value)))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Deferred(element)
    }
}

impl From<&Element> for Node {
    fn from(element: &Element) -> Self {
        Self::Deferred(element.clone())
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::from(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::from(i)
                } else if let Some(u) = n.as_u64() {
                    Self::from(u)
                } else {
                    n.as_f64()
                        .map_or_else(|| Self::text(n.to_string()), Self::from)
                }
            }
            Json::String(s) => Self::text(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => {
                let mut entries: Vec<Self> = map
                    .into_iter()
                    .map(|(key, value)| entry_from_json(key, value))
                    .collect();
                if entries.len() == 1 {
                    entries.pop().unwrap_or_default()
                } else {
                    Self::List(entries)
                }
            }
        }
    }
}

fn entry_from_json(key: String, value: serde_json::Value) -> Node {
    match key.as_str() {
        ATTR_KEY => Node::Attributes(attributes_from_json(value)),
        CDATA_KEY => Node::Cdata(json_text(value)),
        _ => Node::Element {
            name: key,
            content: Box::new(Node::from(value)),
        },
    }
}

fn attributes_from_json(value: serde_json::Value) -> IndexMap<String, String> {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| (key, json_text(value)))
            .collect(),
        _ => IndexMap::new(),
    }
}

/// Raw text of a JSON value used where only strings make sense
fn json_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(1.0).to_string(), "1");
        assert_eq!(Scalar::Number(2.5).to_string(), "2.5");
        assert_eq!(Scalar::Integer(-42).to_string(), "-42");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_single_key_object_is_element() {
        let node = Node::from(json!({"tag": "v"}));
        assert_eq!(node, Node::element("tag", "v"));
    }

    #[test]
    fn test_reserved_keys() {
        let node = Node::from(json!({"_attr": {"k": "v", "n": 2, "z": null}}));
        assert_eq!(node, Node::attrs([("k", "v"), ("n", "2"), ("z", "")]));

        let node = Node::from(json!({"_cdata": "raw"}));
        assert_eq!(node, Node::cdata("raw"));
    }

    #[test]
    fn test_multi_key_object_keeps_order() {
        let node = Node::from(json!({"b": 1, "_attr": {"x": "1"}, "a": 2}));
        assert_eq!(
            node,
            Node::list([
                Node::element("b", 1),
                Node::attrs([("x", "1")]),
                Node::element("a", 2),
            ])
        );
    }

    #[test]
    fn test_large_integers_keep_precision() {
        let node = Node::from(json!({"id": 9_007_199_254_740_993u64}));
        assert_eq!(node, Node::element("id", 9_007_199_254_740_993u64));
        assert_eq!(
            Node::from(json!(u64::MAX)),
            Node::Scalar(Scalar::Integer(18_446_744_073_709_551_615))
        );
        assert_eq!(Node::from(json!(-3)), Node::from(-3));
        assert_eq!(Node::from(json!(0.5)), Node::from(0.5));
    }

    #[test]
    fn test_option_conversion() {
        assert!(Node::from(None::<&str>).is_null());
        assert!(Node::from(Some("x")).is_scalar());
    }
}
