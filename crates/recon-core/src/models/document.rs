//! Raw document input.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Declared kind of a raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// PDF with a text layer, scanned pages, or both.
    Pdf,
    /// UTF-8 text authored as `label: value` blocks.
    PlainText,
}

impl DocumentKind {
    /// Infer the document kind from a file extension (case-insensitive).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "text" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }

    /// Infer the document kind from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(extension)
            .ok_or_else(|| DocumentError::Unsupported(extension.to_string()))
    }
}

/// Document bytes borrowed for the duration of one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct RawDocument<'a> {
    bytes: &'a [u8],
    kind: DocumentKind,
}

impl<'a> RawDocument<'a> {
    pub fn new(bytes: &'a [u8], kind: DocumentKind) -> Self {
        Self { bytes, kind }
    }

    pub fn pdf(bytes: &'a [u8]) -> Self {
        Self::new(bytes, DocumentKind::Pdf)
    }

    pub fn plain_text(bytes: &'a [u8]) -> Self {
        Self::new(bytes, DocumentKind::PlainText)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }
}
