//! Document driver: declaration, root iteration and output handling.
//!
//! A document owns the output buffer and the registry of deferred elements
//! it has reached. Every root is formatted inside one anonymous frame, so a
//! root that suspends holds back the roots after it until its element
//! closes.

use crate::config::{FlushPolicy, IndentStyle, Options};
use crate::deferred::{ElementId, Op, Registry, Slot, SlotState};
use crate::error::{Error, ErrorKind, Result};
use crate::formatter::{self, Append, Finish, Frame, Outcome};
use crate::node::Node;
use crate::resolver::{resolve_in, resolve_pushed, Content, IndentContext, ParsedNode};
use crate::stream::{StreamEvent, XmlStream};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, instrument, trace, warn};

/// Output side of a document
#[derive(Debug)]
enum Sink {
    Text(String),
    Stream {
        buffer: String,
        outbox: Vec<StreamEvent>,
    },
}

impl Append for Sink {
    fn append(&mut self, interrupt: bool, text: &str) {
        match self {
            Self::Text(buffer) => buffer.push_str(text),
            Self::Stream { buffer, outbox } => {
                buffer.push_str(text);
                if interrupt && !buffer.is_empty() {
                    outbox.push(StreamEvent::Data(std::mem::take(buffer)));
                }
            }
        }
    }
}

/// Next move of the traversal driver
enum Step {
    /// Run the formatter, optionally entering a node first
    Run(Option<(Arc<ParsedNode>, Finish)>),
    /// Apply the next queued operation of an element
    Resume(ElementId),
}

/// Shared state behind a document and the handles it reached
pub(crate) struct Engine {
    me: Weak<Mutex<Engine>>,
    options: Options,
    sink: Sink,
    stream: Option<XmlStream>,
    registry: Registry,
    written: bool,
    complete: bool,
}

/// Runs `op` on the engine, then hands flushed events to the stream
/// listeners with no lock held.
pub(crate) fn with_engine<T>(
    engine: &Arc<Mutex<Engine>>,
    op: impl FnOnce(&mut Engine) -> Result<T>,
) -> Result<T> {
    let (result, events, stream) = {
        let mut guard = engine.lock();
        let result = op(&mut guard);
        let events = guard.take_events();
        (result, events, guard.stream.clone())
    };
    if let Some(stream) = stream {
        if !events.is_empty() {
            stream.emit(events);
        }
    }
    result
}

impl Engine {
    fn shared(options: Options, sink: Sink, stream: Option<XmlStream>) -> Arc<Mutex<Self>> {
        Arc::new_cyclic(|me| {
            Mutex::new(Self {
                me: me.clone(),
                options,
                sink,
                stream,
                registry: Registry::default(),
                written: false,
                complete: false,
            })
        })
    }

    fn write(&mut self, input: &Node) -> Result<()> {
        if self.written {
            return Err(Error::new(ErrorKind::AlreadyWritten));
        }
        self.written = true;

        let style = self.options.indent;
        let mut document = ParsedNode::new(None, IndentContext::new(IndentStyle::None, 0));

        if let Some(declaration) = &self.options.declaration {
            let mut text = declaration.render();
            if style.is_enabled() {
                text.push('\n');
            }
            document.content.push(Content::Text(text));
        }

        let roots = match input {
            Node::List(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        for root in roots.iter().filter(|root| !root.is_null()) {
            let node = resolve_in(root, IndentContext::root(style));
            document.content.push(Content::Node(Arc::new(node)));
        }

        debug!(roots = document.content.len(), "writing document");
        self.drive(
            Vec::new(),
            Step::Run(Some((Arc::new(document), Finish::Continue))),
        );
        Ok(())
    }

    pub(crate) fn push(&mut self, id: ElementId, value: &Node) -> Result<()> {
        let slot = self.open_slot(id)?;
        let pushed = resolve_pushed(value, &slot.indent);
        if !pushed.attributes.is_empty() {
            return Err(Error::for_element(ErrorKind::LateAttributes, id));
        }
        if pushed.entries.is_empty() {
            trace!(element = %id, "nothing to push");
            return Ok(());
        }

        trace!(element = %id, entries = pushed.entries.len(), "pushing content");
        slot.queue.extend(pushed.entries.into_iter().map(Op::Push));
        self.wake(id);
        Ok(())
    }

    pub(crate) fn close(&mut self, id: ElementId) -> Result<()> {
        let slot = self.open_slot(id)?;
        slot.closing = true;
        slot.queue.push_back(Op::Close);
        self.wake(id);
        Ok(())
    }

    /// Slot of a wired element that still accepts operations
    fn open_slot(&mut self, id: ElementId) -> Result<&mut Slot> {
        let slot = self
            .registry
            .get_mut(id)
            .ok_or_else(|| Error::for_element(ErrorKind::Unattached, id))?;
        if slot.closing {
            return Err(Error::for_element(ErrorKind::Closed, id));
        }
        Ok(slot)
    }

    /// Resumes a parked element so its queued operations run; a busy
    /// element picks them up when control comes back to it
    fn wake(&mut self, id: ElementId) {
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        match std::mem::replace(&mut slot.state, SlotState::Busy) {
            SlotState::Parked(stack) => self.drive(stack, Step::Resume(id)),
            SlotState::Busy => trace!(element = %id, "element busy, operation queued"),
            SlotState::Closed => slot.state = SlotState::Closed,
        }
    }

    /// Runs the traversal until it completes or parks on an element
    fn drive(&mut self, mut stack: Vec<Frame>, mut step: Step) {
        loop {
            match step {
                Step::Run(entering) => {
                    match formatter::run(&mut stack, entering, &mut self.sink) {
                        Outcome::Done => {
                            self.finish();
                            return;
                        }
                        Outcome::Suspended(pending) => {
                            let id = pending.id();
                            if self.registry.contains(id) {
                                warn!(element = %id, "element reached twice, emitting it without waiting");
                                formatter::release(&mut stack, &mut self.sink);
                                step = Step::Run(None);
                                continue;
                            }

                            pending.attach(self.me.clone());
                            let indent = stack.last().map_or_else(
                                || IndentContext::root(self.options.indent),
                                |frame| frame.node().indent().child(),
                            );
                            self.registry.insert(id, Slot::parked(stack, indent));
                            debug!(element = %id, "element attached, waiting for content");
                            return;
                        }
                        Outcome::Yielded(id) => step = Step::Resume(id),
                    }
                }
                Step::Resume(id) => {
                    let Some(slot) = self.registry.get_mut(id) else {
                        warn!(element = %id, "resuming unknown element");
                        return;
                    };
                    step = match slot.queue.pop_front() {
                        None => {
                            slot.state = SlotState::Parked(stack);
                            return;
                        }
                        Some(Op::Close) => {
                            slot.state = SlotState::Closed;
                            debug!(element = %id, "closing element, resuming traversal");
                            formatter::release(&mut stack, &mut self.sink);
                            Step::Run(None)
                        }
                        Some(Op::Push(Content::Text(text))) => {
                            formatter::feed_text(&mut stack, &text, &mut self.sink);
                            self.sink.append(true, "");
                            Step::Resume(id)
                        }
                        Some(Op::Push(Content::Node(child))) => {
                            formatter::break_line(&mut stack, &mut self.sink);
                            Step::Run(Some((child, Finish::Yield(id))))
                        }
                    };
                }
            }
        }
    }

    fn finish(&mut self) {
        self.complete = true;
        debug!("document complete");
        if let Sink::Stream { buffer, outbox } = &mut self.sink {
            if !buffer.is_empty() {
                outbox.push(StreamEvent::Data(std::mem::take(buffer)));
            }
            outbox.push(StreamEvent::End);
            outbox.push(StreamEvent::Close);
        }
    }

    fn take_events(&mut self) -> Vec<StreamEvent> {
        match &mut self.sink {
            Sink::Stream { outbox, .. } => std::mem::take(outbox),
            Sink::Text(_) => Vec::new(),
        }
    }
}

/// An XML document under construction.
///
/// ```
/// use jxml::{Document, IndentStyle, Node, Options};
/// # fn main() -> Result<(), jxml::Error> {
/// let doc = Document::new(Options::default().indent(IndentStyle::Spaces));
/// doc.write(Node::element("root", Node::list([Node::element("a", 1)])))?;
/// assert_eq!(doc.into_string()?, "<root>\n    <a>1</a>\n</root>\n");
/// # Ok(())
/// # }
/// ```
pub struct Document {
    engine: Arc<Mutex<Engine>>,
}

impl Document {
    /// Creates a document that accumulates its output into one string
    pub fn new(options: Options) -> Self {
        Self {
            engine: Engine::shared(options, Sink::Text(String::new()), None),
        }
    }

    /// Creates a document that flushes its output as stream events
    pub fn with_stream(options: Options, policy: FlushPolicy) -> (Self, XmlStream) {
        let stream = XmlStream::new(policy);
        let sink = Sink::Stream {
            buffer: String::new(),
            outbox: Vec::new(),
        };
        let document = Self {
            engine: Engine::shared(options, sink, Some(stream.clone())),
        };
        (document, stream)
    }

    /// Formats the input: the declaration if configured, then each root.
    ///
    /// A top-level list is a sequence of roots. Formatting stops at the
    /// first deferred element reached and continues when it closes.
    #[instrument(skip_all)]
    pub fn write(&self, input: impl Into<Node>) -> Result<()> {
        let input = input.into();
        with_engine(&self.engine, |engine| engine.write(&input))
    }

    /// True once every root has been emitted
    pub fn is_complete(&self) -> bool {
        self.engine.lock().complete
    }

    /// Deferred elements reached but not yet closed, in the order reached
    pub fn pending_elements(&self) -> Vec<ElementId> {
        self.engine.lock().registry.open()
    }

    /// Text emitted so far that has not been flushed to a stream
    pub fn snapshot(&self) -> String {
        match &self.engine.lock().sink {
            Sink::Text(buffer) | Sink::Stream { buffer, .. } => buffer.clone(),
        }
    }

    /// Returns the finished output of a string document
    #[instrument(skip_all)]
    pub fn into_string(self) -> Result<String> {
        let mut engine = self.engine.lock();
        if engine.stream.is_some() {
            return Err(Error::new(ErrorKind::StreamOutput));
        }
        if !engine.complete {
            let pending = engine.registry.open().len();
            return Err(Error::new(ErrorKind::Incomplete { pending }));
        }
        match &mut engine.sink {
            Sink::Text(buffer) => Ok(std::mem::take(buffer)),
            Sink::Stream { .. } => Err(Error::new(ErrorKind::StreamOutput)),
        }
    }
}

/// Renders `input` to a string in one call
pub fn to_xml(input: impl Into<Node>, options: &Options) -> Result<String> {
    let document = Document::new(options.clone());
    document.write(input)?;
    document.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Declaration;
    use crate::deferred::Element;
    use serde_json::json;

    #[test]
    fn test_multiple_roots() -> Result<()> {
        let out = to_xml(
            Node::from(json!([{"a": 1}, {"b": 2}])),
            &Options::default(),
        )?;
        assert_eq!(out, "<a>1</a><b>2</b>");
        Ok(())
    }

    #[test]
    fn test_declaration_indented() -> Result<()> {
        let options = Options::default()
            .indent(IndentStyle::Spaces)
            .declaration(Declaration::default().standalone(true));
        let out = to_xml(Node::from(json!({"a": null})), &options)?;
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<a/>\n"
        );
        Ok(())
    }

    #[test]
    fn test_write_twice() -> Result<()> {
        let doc = Document::new(Options::default());
        doc.write(Node::element("a", 1))?;
        let err = doc.write(Node::element("b", 1)).err();
        assert_eq!(err.as_ref().map(Error::kind), Some(&ErrorKind::AlreadyWritten));
        Ok(())
    }

    #[test]
    fn test_incomplete_until_closed() -> Result<()> {
        let element = Element::new(Node::Null);
        let doc = Document::new(Options::default());
        doc.write(Node::list([
            Node::element("first", &element),
            Node::element("second", 2),
        ]))?;

        assert!(!doc.is_complete());
        assert_eq!(doc.pending_elements(), vec![element.id()]);
        assert_eq!(doc.snapshot(), "<first>");

        element.close()?;
        assert!(doc.is_complete());
        assert!(doc.pending_elements().is_empty());
        assert_eq!(doc.into_string()?, "<first></first><second>2</second>");
        Ok(())
    }

    #[test]
    fn test_into_string_reports_pending() -> Result<()> {
        let element = Element::new(Node::Null);
        let doc = Document::new(Options::default());
        doc.write(Node::element("x", &element))?;
        let err = doc.into_string().err();
        assert_eq!(
            err.as_ref().map(Error::kind),
            Some(&ErrorKind::Incomplete { pending: 1 })
        );
        Ok(())
    }

    #[test]
    fn test_stream_document_has_no_string() -> Result<()> {
        let (doc, _stream) = Document::with_stream(Options::default(), FlushPolicy::Immediate);
        doc.write(Node::element("a", 1))?;
        let err = doc.into_string().err();
        assert_eq!(err.as_ref().map(Error::kind), Some(&ErrorKind::StreamOutput));
        Ok(())
    }
}
