//! Push-style output stream for incrementally flushed documents

use crate::config::FlushPolicy;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Event emitted by an [`XmlStream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A flushed chunk of XML text
    Data(String),
    /// The document is complete
    End,
    /// The stream is no longer readable
    Close,
}

type Listener = Box<dyn FnMut(&StreamEvent) + Send>;

struct StreamState {
    policy: FlushPolicy,
    readable: bool,
    ticked: bool,
    delivering: bool,
    /// Events waiting for the first tick
    held: Vec<StreamEvent>,
    backlog: VecDeque<StreamEvent>,
    listeners: Vec<Listener>,
}

/// Consumer side of a streamed document.
///
/// Listeners see `Data` chunks each time the document flushes, then `End`
/// and `Close` once the last root is emitted.
#[derive(Clone)]
pub struct XmlStream {
    state: Arc<Mutex<StreamState>>,
}

impl XmlStream {
    pub(crate) fn new(policy: FlushPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(StreamState {
                policy,
                readable: true,
                ticked: false,
                delivering: false,
                held: Vec::new(),
                backlog: VecDeque::new(),
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers a listener for every event
    pub fn on_event<F>(&self, listener: F)
    where
        F: FnMut(&StreamEvent) + Send + 'static,
    {
        self.state.lock().listeners.push(Box::new(listener));
    }

    /// Registers a listener for data chunks only
    pub fn on_data<F>(&self, mut listener: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.on_event(move |event| {
            if let StreamEvent::Data(chunk) = event {
                listener(chunk);
            }
        });
    }

    pub fn is_readable(&self) -> bool {
        self.state.lock().readable
    }

    pub fn policy(&self) -> FlushPolicy {
        self.state.lock().policy
    }

    /// Releases events held by [`FlushPolicy::DeferredFirst`]; later events
    /// are delivered as they happen
    pub fn tick(&self) {
        {
            let mut state = self.state.lock();
            if state.ticked {
                return;
            }
            state.ticked = true;
            let held = std::mem::take(&mut state.held);
            state.backlog.extend(held);
        }
        self.drain();
    }

    pub(crate) fn emit(&self, events: Vec<StreamEvent>) {
        {
            let mut state = self.state.lock();
            if state.policy == FlushPolicy::DeferredFirst && !state.ticked {
                state.held.extend(events);
                return;
            }
            state.backlog.extend(events);
        }
        self.drain();
    }

    /// Delivers the backlog with no lock held while listeners run.
    ///
    /// Events emitted by a listener are appended to the backlog and
    /// delivered by the outer call, in order.
    fn drain(&self) {
        {
            let mut state = self.state.lock();
            if state.delivering {
                return;
            }
            state.delivering = true;
        }

        loop {
            let (event, mut listeners) = {
                let mut state = self.state.lock();
                let Some(event) = state.backlog.pop_front() else {
                    state.delivering = false;
                    return;
                };
                if event == StreamEvent::Close {
                    state.readable = false;
                }
                let listeners = std::mem::take(&mut state.listeners);
                (event, listeners)
            };

            for listener in &mut listeners {
                listener(&event);
            }

            let mut state = self.state.lock();
            let added = std::mem::take(&mut state.listeners);
            listeners.extend(added);
            state.listeners = listeners;
        }
    }
}

impl fmt::Debug for XmlStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("XmlStream")
            .field("policy", &state.policy)
            .field("readable", &state.readable)
            .field("ticked", &state.ticked)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(stream: &XmlStream) -> Arc<Mutex<Vec<StreamEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        stream.on_event(move |event| sink.lock().push(event.clone()));
        events
    }

    #[test]
    fn test_immediate_delivery() {
        let stream = XmlStream::new(FlushPolicy::Immediate);
        let events = recorded(&stream);
        stream.emit(vec![StreamEvent::Data("<a>".to_string())]);
        assert_eq!(*events.lock(), vec![StreamEvent::Data("<a>".to_string())]);
    }

    #[test]
    fn test_deferred_first_holds_until_tick() {
        let stream = XmlStream::new(FlushPolicy::DeferredFirst);
        stream.emit(vec![StreamEvent::Data("early".to_string())]);

        let events = recorded(&stream);
        assert!(events.lock().is_empty());

        stream.tick();
        assert_eq!(*events.lock(), vec![StreamEvent::Data("early".to_string())]);

        stream.emit(vec![StreamEvent::Data("late".to_string())]);
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_close_clears_readable() {
        let stream = XmlStream::new(FlushPolicy::Immediate);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = stream.clone();
        let sink = Arc::clone(&seen);
        stream.on_event(move |event| sink.lock().push((event.clone(), probe.is_readable())));

        assert!(stream.is_readable());
        stream.emit(vec![StreamEvent::End, StreamEvent::Close]);
        assert_eq!(
            *seen.lock(),
            vec![(StreamEvent::End, true), (StreamEvent::Close, false)]
        );
        assert!(!stream.is_readable());
    }
}
