//! Depth-first formatter over resolved nodes.
//!
//! Traversal state lives in an explicit stack of frames, one per open
//! element, each holding a cursor into its node's content. When the
//! formatter reaches a pending node it opens the tag, signals an interrupt
//! and hands the whole stack back to the caller; resuming is a matter of
//! running the same stack again.

use crate::deferred::{ElementId, PendingRef};
use crate::resolver::{Content, ParsedNode};
use std::sync::Arc;
use tracing::trace;

/// Receiver of formatted text.
///
/// `interrupt` asks the receiver to flush whatever it has buffered.
pub trait Append {
    fn append(&mut self, interrupt: bool, text: &str);
}

impl Append for String {
    fn append(&mut self, _interrupt: bool, text: &str) {
        self.push_str(text);
    }
}

/// What happens once a frame's closing tag is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Finish {
    /// Carry on with the parent frame
    Continue,
    /// Stop and give control back to the producer feeding this element
    Yield(ElementId),
}

/// Traversal state of one open node
#[derive(Debug)]
pub(crate) struct Frame {
    node: Arc<ParsedNode>,
    cursor: usize,
    len: usize,
    finish: Finish,
    waiting: bool,
    /// Text pushed into an inline pending node, held until the node either
    /// gets an element child or closes
    held: Option<String>,
}

impl Frame {
    pub(crate) fn node(&self) -> &ParsedNode {
        &self.node
    }
}

/// Writes text pushed into the pending node on top of the stack
pub(crate) fn feed_text(stack: &mut [Frame], text: &str, out: &mut dyn Append) {
    match stack.last_mut().and_then(|frame| frame.held.as_mut()) {
        Some(held) => held.push_str(text),
        None => out.append(false, text),
    }
}

/// Switches the pending node on top of the stack to the multi-line layout
/// before an element child is written into it
pub(crate) fn break_line(stack: &mut [Frame], out: &mut dyn Append) {
    let Some(frame) = stack.last_mut() else {
        return;
    };
    if let Some(held) = frame.held.take() {
        out.append(false, "\n");
        out.append(false, &held);
        frame.len = frame.len.max(2);
    }
}

/// Lets the formatter drain the remaining content of the pending node on
/// top of the stack
pub(crate) fn release(stack: &mut [Frame], out: &mut dyn Append) {
    let Some(frame) = stack.last_mut() else {
        return;
    };
    frame.waiting = false;
    if let Some(held) = frame.held.take() {
        out.append(false, &held);
    }
}

/// Why a run stopped
#[derive(Debug)]
pub(crate) enum Outcome {
    /// The stack is empty
    Done,
    /// The top frame waits on a deferred element
    Suspended(PendingRef),
    /// A pushed child finished; the top frame belongs to this element again
    Yielded(ElementId),
}

/// Renders the opening fragment for a node of layout length `len`
pub fn open_fragment(node: &ParsedNode, len: usize) -> String {
    let mut out = String::from(node.indent().prefix());
    if let Some(name) = node.name() {
        out.push('<');
        out.push_str(name);
        for attr in node.attributes() {
            out.push(' ');
            out.push_str(attr);
        }
        out.push_str(if len > 0 { ">" } else { "/>" });
    }
    if node.indent().is_enabled() && len > 1 {
        out.push('\n');
    }
    out
}

/// Renders the closing fragment for a node of layout length `len`
pub fn close_fragment(node: &ParsedNode, len: usize) -> String {
    let mut out = String::new();
    if len > 1 {
        out.push_str(node.indent().prefix());
    }
    if let Some(name) = node.name() {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
    if node.indent().is_enabled() {
        out.push('\n');
    }
    out
}

/// Formats `node` into `out`.
///
/// Returns the deferred element the traversal stopped at, or `None` when the
/// node was emitted completely. A stopped traversal cannot be resumed from
/// here; documents keep the frames and resume them when the element closes.
pub fn format(node: &ParsedNode, out: &mut dyn Append) -> Option<ElementId> {
    let mut stack = Vec::new();
    match run(
        &mut stack,
        Some((Arc::new(node.clone()), Finish::Continue)),
        out,
    ) {
        Outcome::Suspended(pending) => Some(pending.id()),
        Outcome::Done | Outcome::Yielded(_) => None,
    }
}

/// Runs `stack` until it empties, suspends or yields.
///
/// `entering` is a node to open on top of the stack before draining.
pub(crate) fn run(
    stack: &mut Vec<Frame>,
    mut entering: Option<(Arc<ParsedNode>, Finish)>,
    out: &mut dyn Append,
) -> Outcome {
    loop {
        if let Some((node, finish)) = entering.take() {
            let len = node.layout_len();
            out.append(false, &open_fragment(&node, len));

            if len == 0 {
                if node.indent().is_enabled() {
                    out.append(false, "\n");
                }
                if let Finish::Yield(id) = finish {
                    out.append(true, "");
                    return Outcome::Yielded(id);
                }
                continue;
            }

            let pending = node.pending.clone();
            let inline = pending.is_some() && len == 1 && node.indent().is_enabled();
            stack.push(Frame {
                node,
                cursor: 0,
                len,
                finish,
                waiting: pending.is_some(),
                held: inline.then(String::new),
            });
            if let Some(pending) = pending {
                trace!(element = %pending.id(), depth = stack.len(), "suspending at pending node");
                out.append(true, "");
                return Outcome::Suspended(pending);
            }
            continue;
        }

        let Some(frame) = stack.last_mut() else {
            return Outcome::Done;
        };

        if frame.waiting {
            if let Some(pending) = frame.node.pending.clone() {
                return Outcome::Suspended(pending);
            }
            frame.waiting = false;
        }

        match frame.node.content.get(frame.cursor) {
            Some(Content::Text(text)) => {
                frame.cursor += 1;
                if !text.is_empty() {
                    out.append(false, text);
                }
            }
            Some(Content::Node(child)) => {
                frame.cursor += 1;
                entering = Some((Arc::clone(child), Finish::Continue));
            }
            None => {
                if let Some(frame) = stack.pop() {
                    out.append(false, &close_fragment(&frame.node, frame.len));
                    if let Finish::Yield(id) = frame.finish {
                        out.append(true, "");
                        return Outcome::Yielded(id);
                    }
                }
            }
        }
    }
}
