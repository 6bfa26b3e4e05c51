//! Turns input nodes into the ordered representation the formatter walks.
//!
//! Resolution is pure: it escapes text, renders attribute fragments and lays
//! out the content queue, but never suspends or writes output. A named
//! element whose value is a deferred element keeps its link to that element
//! so the formatter can pause there.

mod parsed;

pub use parsed::{Content, IndentContext, ParsedNode};

use crate::config::IndentStyle;
use crate::deferred::Element;
use crate::escape::{attribute, cdata, escape};
use crate::node::Node;
use indexmap::IndexMap;
use std::sync::Arc;

/// Resolves `node` at the given indentation level
pub fn resolve(node: &Node, style: IndentStyle, level: usize) -> ParsedNode {
    resolve_in(node, IndentContext::new(style, level))
}

pub(crate) fn resolve_in(node: &Node, indent: IndentContext) -> ParsedNode {
    match node {
        Node::Element { name, content } => match content.as_ref() {
            Node::Deferred(element) => pending_node(Some(name.clone()), element, indent),
            values => {
                let mut parsed = ParsedNode::new(Some(name.clone()), indent);
                fill(&mut parsed, values);
                parsed
            }
        },
        Node::Deferred(element) => pending_node(None, element, indent),
        values => {
            let mut parsed = ParsedNode::new(None, indent);
            fill(&mut parsed, values);
            parsed
        }
    }
}

/// Resolves a value pushed into a deferred element into the entries it
/// adds to that element.
///
/// Lists are flattened and element children are laid out at `indent`, the
/// context of the element's children. Attribute markers are returned
/// separately since the element's opening tag is already written.
pub(crate) fn resolve_pushed(value: &Node, indent: &IndentContext) -> Pushed {
    let mut scratch = ParsedNode::new(None, indent.clone());
    fill_items(&mut scratch, std::slice::from_ref(value), indent);
    Pushed {
        entries: scratch.content,
        attributes: scratch.attributes,
    }
}

/// Entries contributed by one pushed value
#[derive(Debug, Default)]
pub(crate) struct Pushed {
    pub(crate) entries: Vec<Content>,
    pub(crate) attributes: Vec<String>,
}

fn pending_node(name: Option<String>, element: &Element, indent: IndentContext) -> ParsedNode {
    let mut parsed = ParsedNode::new(name, indent);
    fill(&mut parsed, element.initial());
    parsed.pending = Some(element.pending_ref());
    parsed
}

fn fill(parsed: &mut ParsedNode, values: &Node) {
    match values {
        Node::Null => {}
        Node::Scalar(scalar) => parsed
            .content
            .push(Content::Text(escape(&scalar.to_string()))),
        Node::Attributes(map) => push_attributes(parsed, map),
        Node::Cdata(raw) => parsed.content.push(Content::Text(cdata(raw))),
        Node::List(items) => fill_list(parsed, items),
        Node::Element { .. } | Node::Deferred(_) => {
            fill_list(parsed, std::slice::from_ref(values));
        }
    }
}

fn push_attributes(parsed: &mut ParsedNode, map: &IndexMap<String, String>) {
    parsed
        .attributes
        .extend(map.iter().map(|(key, value)| attribute(key, value)));
}

/// Lays out a list between empty markers so element children break lines
fn fill_list(parsed: &mut ParsedNode, items: &[Node]) {
    let start = parsed.content.len();
    parsed.content.push(Content::Text(String::new()));

    let child = parsed.indent.child();
    if !fill_items(parsed, items, &child) {
        parsed.content.truncate(start);
        return;
    }

    if matches!(parsed.content.last(), Some(Content::Node(_))) {
        parsed.content.push(Content::Text(String::new()));
    }
}

/// Returns true if any item contributed content
fn fill_items(parsed: &mut ParsedNode, items: &[Node], child: &IndentContext) -> bool {
    let mut contributed = false;
    for item in items {
        match item {
            Node::Null => {}
            Node::Attributes(map) => push_attributes(parsed, map),
            Node::Scalar(scalar) => {
                push_text(parsed, escape(&scalar.to_string()));
                contributed = true;
            }
            Node::Cdata(raw) => {
                push_text(parsed, cdata(raw));
                contributed = true;
            }
            Node::List(inner) => contributed |= fill_items(parsed, inner, child),
            Node::Element { .. } | Node::Deferred(_) => {
                let node = resolve_in(item, child.clone());
                parsed.content.push(Content::Node(Arc::new(node)));
                contributed = true;
            }
        }
    }
    contributed
}

/// Appends text, merging into a trailing text entry or marker
fn push_text(parsed: &mut ParsedNode, text: String) {
    match parsed.content.last_mut() {
        Some(Content::Text(last)) => last.push_str(&text),
        _ => parsed.content.push(Content::Text(text)),
    }
}
