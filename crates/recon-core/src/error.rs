//! Error types for the recon-core library.

use thiserror::Error;

/// Main error type for the recon library.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Document decoding error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Reconciliation error.
    #[error("reconciliation error: {0}")]
    Reconciliation(#[from] ReconciliationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed or serialized.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised while turning raw document bytes into text.
///
/// Malformed input is reported here and never retried.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to rasterize a page.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// Plain-text document is not valid UTF-8.
    #[error("text document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The file extension does not map to a supported document kind.
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Failed to parse a required value.
    #[error("failed to parse {field}: {value:?}")]
    Parse { field: String, value: String },
}

/// Errors raised when applying reconciliation results.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconciliationError {
    /// The invoices passed to `apply` are not the ones that were reconciled.
    #[error("invoice mismatch at position {position}: expected id {expected}, found {found:?}")]
    InvoiceMismatch {
        position: usize,
        expected: i64,
        found: Option<i64>,
    },

    /// More invoices were passed to `apply` than were reconciled.
    #[error("expected {expected} invoices, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Result type for the recon library.
pub type Result<T> = std::result::Result<T, ReconError>;
