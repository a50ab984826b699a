//! Diagnostic reporting infrastructure.
//!
//! The lexer and parser report problems through a [`Handler`], which
//! accumulates [`Diagnostic`]s instead of aborting. The driver inspects the
//! handler once a phase completes and decides whether to continue.
//!
//! # Example
//!
//! ```
//! use rsonnet_util::{Handler, Span};
//!
//! let handler = Handler::new();
//! handler.error("unexpected token", Span::new(1, 5));
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_messages(), vec!["1:5: unexpected token"]);
//! ```

use std::cell::RefCell;
use std::fmt;

use crate::span::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A problem that fails the current phase.
    Error,
    /// A problem worth reporting that does not fail the phase.
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level.
    pub level: Level,
    /// Main diagnostic message.
    pub message: String,
    /// Source location the message refers to.
    pub span: Span,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span,
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_dummy() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.span, self.message)
        }
    }
}

/// Accumulates diagnostics for one pipeline phase.
///
/// The handler uses interior mutability so that deeply nested lexer and
/// parser methods can report without threading `&mut` everywhere. The
/// interpreter is single-threaded, so a [`RefCell`] is all it takes.
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error at the given location.
    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(message, span));
    }

    /// Records a warning at the given location.
    pub fn warning(&self, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::warning(message, span));
    }

    /// Records an already-built diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Returns true if any error-level diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of recorded diagnostics of any level.
    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Formats all error-level diagnostics, in the order recorded.
    pub fn error_messages(&self) -> Vec<String> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .map(ToString::to_string)
            .collect()
    }

    /// Takes all recorded diagnostics, leaving the handler empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }
}
