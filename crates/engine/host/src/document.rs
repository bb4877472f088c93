//! Running editor documents as ad-hoc scripts

use crate::Result;
use scripting::{normalize, EngineNamespace, EolMode};
use std::path::Path;
use tracing::debug;

/// Text and line-ending access for an open document
pub trait EditSurface {
    /// Length of the text in bytes
    fn length(&self) -> usize;

    /// Up to `max_len` bytes of text from the start of the document
    fn text(&self, max_len: usize) -> Vec<u8>;

    fn eol_mode(&self) -> EolMode;
}

/// A document handle owned by the host
pub trait Document {
    /// Label used in tracebacks
    fn title(&self) -> String {
        "document".to_string()
    }

    /// The editing surface, if the document currently has one
    fn edit_surface(&self) -> Option<&dyn EditSurface>;
}

/// In-memory document with its own edit surface
#[derive(Debug, Clone)]
pub struct TextBuffer {
    title: String,
    text: Vec<u8>,
    eol: EolMode,
}

impl TextBuffer {
    pub fn new(title: impl Into<String>, text: impl Into<Vec<u8>>, eol: EolMode) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            eol,
        }
    }

    /// Load a file, detecting its line-ending convention
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read(path)?;
        let eol = EolMode::detect(&text);
        Ok(Self::new(path.display().to_string(), text, eol))
    }

    /// Override the detected line-ending convention
    pub fn with_eol_mode(mut self, eol: EolMode) -> Self {
        self.eol = eol;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }
}

impl EditSurface for TextBuffer {
    fn length(&self) -> usize {
        self.text.len()
    }

    fn text(&self, max_len: usize) -> Vec<u8> {
        self.text[..max_len.min(self.text.len())].to_vec()
    }

    fn eol_mode(&self) -> EolMode {
        self.eol
    }
}

impl Document for TextBuffer {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn edit_surface(&self) -> Option<&dyn EditSurface> {
        Some(self)
    }
}

/// Evaluate the full text of `doc` directly in the namespace.
///
/// Documents without an edit surface are skipped. Bindings made by the
/// document stay in the namespace.
pub fn execute_document(namespace: &EngineNamespace, doc: &dyn Document) -> Result<()> {
    let Some(surface) = doc.edit_surface() else {
        debug!(document = %doc.title(), "no edit surface, nothing to run");
        return Ok(());
    };

    let raw = surface.text(surface.length());
    let source = normalize(&raw, surface.eol_mode());
    let chunk = format!("={}", doc.title());

    namespace.evaluate_chunk(&chunk, &source)?;
    Ok(())
}
