//! Internal ordered representation of one element

use crate::config::IndentStyle;
use crate::deferred::{ElementId, PendingRef};
use std::fmt;
use std::sync::Arc;

/// Indentation context of a node: style, nesting level and its prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentContext {
    style: IndentStyle,
    level: usize,
    prefix: String,
}

impl IndentContext {
    pub fn new(style: IndentStyle, level: usize) -> Self {
        let prefix = style.unit().repeat(level.saturating_sub(1));
        Self {
            style,
            level,
            prefix,
        }
    }

    /// Context of a top-level root
    pub fn root(style: IndentStyle) -> Self {
        Self::new(style, usize::from(style.is_enabled()))
    }

    /// Context one level deeper
    pub fn child(&self) -> Self {
        Self::new(self.style, self.level + 1)
    }

    pub fn style(&self) -> IndentStyle {
        self.style
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_enabled(&self) -> bool {
        self.style.is_enabled()
    }
}

/// One entry of a node's content queue
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Already escaped text; the empty string is a layout marker
    Text(String),
    Node(Arc<ParsedNode>),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&ParsedNode> {
        match self {
            Self::Node(n) => Some(n),
            Self::Text(_) => None,
        }
    }
}

/// A resolved element ready for formatting
#[derive(Clone, PartialEq)]
pub struct ParsedNode {
    pub(crate) name: Option<String>,
    pub(crate) attributes: Vec<String>,
    pub(crate) content: Vec<Content>,
    pub(crate) indent: IndentContext,
    pub(crate) pending: Option<PendingRef>,
}

impl ParsedNode {
    pub(crate) fn new(name: Option<String>, indent: IndentContext) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            content: Vec::new(),
            indent,
            pending: None,
        }
    }

    /// Tag name; `None` for anonymous nodes
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Pre-rendered `key="value"` fragments in document order
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    pub fn indent(&self) -> &IndentContext {
        &self.indent
    }

    /// Deferred element supplying this node's content, if any
    pub fn pending(&self) -> Option<ElementId> {
        self.pending.as_ref().map(PendingRef::id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of content entries used for layout.
    ///
    /// A pending node never self-closes. It starts inline unless its initial
    /// content already holds an element child; the formatter widens it once
    /// a pushed element child arrives.
    pub fn layout_len(&self) -> usize {
        if self.is_pending() {
            self.content.len().max(1)
        } else {
            self.content.len()
        }
    }
}

impl fmt::Debug for ParsedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedNode")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("content", &self.content)
            .field("level", &self.indent.level())
            .field("pending", &self.pending())
            .finish()
    }
}
