//! Deferred elements: handles whose content arrives after the surrounding
//! document has started emitting.
//!
//! A handle only carries an id, its initial content and a weak link to the
//! document that reached it. The document keeps the suspended traversal in a
//! registry keyed by id, so nothing in the tree points back at the handle.

use crate::document::{with_engine, Engine};
use crate::error::{Error, ErrorKind, Result};
use crate::formatter::Frame;
use crate::node::Node;
use crate::resolver::{Content, IndentContext};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a deferred element
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a handle finds the document that reached it
#[derive(Default)]
pub(crate) struct Link {
    engine: Mutex<Weak<Mutex<Engine>>>,
}

/// Reference from a resolved node to the element feeding it
#[derive(Clone)]
pub(crate) struct PendingRef {
    id: ElementId,
    link: Arc<Link>,
}

impl PendingRef {
    pub(crate) fn id(&self) -> ElementId {
        self.id
    }

    pub(crate) fn attach(&self, engine: Weak<Mutex<Engine>>) {
        *self.link.engine.lock() = engine;
    }
}

impl PartialEq for PendingRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for PendingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PendingRef({})", self.id)
    }
}

/// Producer-side handle of a deferred element.
///
/// Graft it into a tree with [`Node::element`], write the tree, then feed
/// children with [`push`](Self::push) and finish with
/// [`close`](Self::close). Clones share the same element.
///
/// ```
/// use jxml::{Document, Element, Node, Options};
/// # fn main() -> Result<(), jxml::Error> {
/// let rows = Element::new(Node::attrs([("kind", "demo")]));
/// let doc = Document::new(Options::default());
/// doc.write(Node::element("rows", &rows))?;
/// rows.push(Node::element("row", 1))?;
/// rows.close()?;
/// assert_eq!(doc.into_string()?, r#"<rows kind="demo"><row>1</row></rows>"#);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Element {
    id: ElementId,
    initial: Arc<Node>,
    link: Arc<Link>,
}

impl Element {
    /// Creates a handle whose content starts with `initial`.
    ///
    /// Initial children are emitted after every pushed child, right before
    /// the closing tag.
    pub fn new(initial: impl Into<Node>) -> Self {
        Self {
            id: ElementId::next(),
            initial: Arc::new(initial.into()),
            link: Arc::new(Link::default()),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn initial(&self) -> &Node {
        &self.initial
    }

    /// True once a document has reached this element
    pub fn is_attached(&self) -> bool {
        self.link.engine.lock().strong_count() > 0
    }

    pub(crate) fn pending_ref(&self) -> PendingRef {
        PendingRef {
            id: self.id,
            link: Arc::clone(&self.link),
        }
    }

    /// Formats one child inside this element and flushes it.
    ///
    /// A list is flattened into the element the way it would be if it were
    /// part of the element's value up front; a null value adds nothing.
    /// When indenting, text pushed before the first element child is held
    /// back until the element either gets an element child or closes.
    ///
    /// Fails with [`ErrorKind::Unattached`] before the formatter reached the
    /// element, with [`ErrorKind::Closed`] after [`close`](Self::close), and
    /// with [`ErrorKind::LateAttributes`] if the value carries attribute
    /// markers, since the opening tag is already written.
    pub fn push(&self, value: impl Into<Node>) -> Result<()> {
        let engine = self.engine()?;
        let value = value.into();
        with_engine(&engine, |engine| engine.push(self.id, &value))
    }

    /// Finishes the element and resumes the suspended traversal
    pub fn close(&self) -> Result<()> {
        let engine = self.engine()?;
        with_engine(&engine, |engine| engine.close(self.id))
    }

    /// Pushes `value`, then closes
    pub fn close_with(&self, value: impl Into<Node>) -> Result<()> {
        self.push(value)?;
        self.close()
    }

    fn engine(&self) -> Result<Arc<Mutex<Engine>>> {
        self.link
            .engine
            .lock()
            .upgrade()
            .ok_or_else(|| Error::for_element(ErrorKind::Unattached, self.id))
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("initial", &self.initial)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Operation waiting to be applied to an element
#[derive(Debug)]
pub(crate) enum Op {
    /// One resolved entry of a pushed value
    Push(Content),
    Close,
}

#[derive(Debug)]
pub(crate) enum SlotState {
    /// Suspended traversal, top frame belongs to this element
    Parked(Vec<Frame>),
    /// The traversal is running or suspended on a nested element
    Busy,
    Closed,
}

/// Registry entry of a wired element
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) state: SlotState,
    /// Context pushed children resolve in
    pub(crate) indent: IndentContext,
    pub(crate) queue: VecDeque<Op>,
    /// Set once `close` was requested, even if still queued
    pub(crate) closing: bool,
}

impl Slot {
    pub(crate) fn parked(stack: Vec<Frame>, indent: IndentContext) -> Self {
        Self {
            state: SlotState::Parked(stack),
            indent,
            queue: VecDeque::new(),
            closing: false,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        !matches!(self.state, SlotState::Closed)
    }
}

/// Wired elements in the order the formatter reached them
#[derive(Debug, Default)]
pub(crate) struct Registry {
    slots: IndexMap<ElementId, Slot>,
}

impl Registry {
    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Slot> {
        self.slots.get_mut(&id)
    }

    pub(crate) fn contains(&self, id: ElementId) -> bool {
        self.slots.contains_key(&id)
    }

    pub(crate) fn insert(&mut self, id: ElementId, slot: Slot) {
        self.slots.insert(id, slot);
    }

    /// Ids of elements not yet closed
    pub(crate) fn open(&self) -> Vec<ElementId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_open())
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Element::new(Node::Null);
        let b = Element::new(Node::Null);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_push_before_attach_fails() {
        let element = Element::new(Node::Null);
        assert!(!element.is_attached());

        let err = element.push("x").err();
        assert_eq!(err.as_ref().map(Error::kind), Some(&ErrorKind::Unattached));
        assert_eq!(err.and_then(|e| e.element()), Some(element.id()));

        let err = element.close().err();
        assert_eq!(err.as_ref().map(Error::kind), Some(&ErrorKind::Unattached));
    }

    #[test]
    fn test_element_id_display() {
        assert_eq!(ElementId::from_raw(12).to_string(), "#12");
        assert_eq!(ElementId::from_raw(12).as_u64(), 12);
    }
}
