//! Error types for jxml

use crate::deferred::ElementId;
use std::fmt;
use thiserror::Error;

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Content was fed to a deferred element the formatter never reached
    Unattached,
    /// The deferred element was already closed
    Closed,
    /// The document still waits on open deferred elements
    Incomplete { pending: usize },
    /// `write` was called twice on the same document
    AlreadyWritten,
    /// A stream document has no string output to hand back
    StreamOutput,
    /// Attributes were pushed into an element whose opening tag is written
    LateAttributes,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unattached => write!(f, "element is not attached to a formatted document"),
            Self::Closed => write!(f, "element is already closed"),
            Self::Incomplete { pending } => {
                write!(f, "document incomplete: {pending} element(s) still open")
            }
            Self::AlreadyWritten => write!(f, "document input was already written"),
            Self::StreamOutput => write!(f, "document output is a stream"),
            Self::LateAttributes => {
                write!(f, "attributes pushed after the opening tag was written")
            }
        }
    }
}

/// Main error type for jxml
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    element: Option<ElementId>,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            element: None,
            message,
        }
    }

    /// Create an error raised by a specific deferred element
    pub fn for_element(kind: ErrorKind, element: ElementId) -> Self {
        let message = format!("{kind} ({element})");
        Self {
            kind,
            element: Some(element),
            message,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xml error: {}", self.message)
    }
}

/// Result type alias for jxml
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::AlreadyWritten);
        assert_eq!(err.kind(), &ErrorKind::AlreadyWritten);
        assert_eq!(err.element(), None);
    }

    #[test]
    fn test_element_error_display() {
        let err = Error::for_element(ErrorKind::Unattached, ElementId::from_raw(7));
        let display = err.to_string();
        assert!(display.contains("xml error"));
        assert!(display.contains("not attached"));
        assert!(display.contains("#7"));
    }

    #[test]
    fn test_incomplete_display() {
        let err = Error::new(ErrorKind::Incomplete { pending: 2 });
        assert_eq!(err.message(), "document incomplete: 2 element(s) still open");
    }
}
