//! Diagnostic channel for script failures
//!
//! Script errors never reach the caller that asked for the script to run.
//! They are rendered and handed to a [`DiagnosticSink`] instead, which the host
//! can show in an output pane, a log, or nowhere at all.

use std::cell::RefCell;
use tracing::error;

/// Fire-and-forget receiver of rendered failure messages
pub trait DiagnosticSink {
    fn emit(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at error level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, message: &str) {
        error!(target: "scriptpad::diagnostics", "{message}");
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything emitted so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Remove and return everything emitted so far
    pub fn drain(&self) -> Vec<String> {
        self.messages.take()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
