//! The labeled context document handed to the generator.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// One included file: its label relative to the app root and raw content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextEntry {
    pub label: String,
    pub content: String,
}

/// Ordered sequence of labeled files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextDocument {
    entries: Vec<ContextEntry>,
}

impl ContextDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, content: impl Into<String>) {
        self.entries.push(ContextEntry {
            label: label.into(),
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Number of files in the document.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a single text blob: `### <label>`, a blank line, the raw
    /// content and a trailing newline, per file.
    pub fn render(&self) -> String {
        let capacity = self
            .entries
            .iter()
            .map(|e| e.label.len() + e.content.len() + 7)
            .sum();
        let mut out = String::with_capacity(capacity);
        for entry in &self.entries {
            out.push_str("### ");
            out.push_str(&entry.label);
            out.push_str("\n\n");
            out.push_str(&entry.content);
            out.push('\n');
        }
        out
    }

    /// SHA-256 of the rendered document, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.render().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Display for ContextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
