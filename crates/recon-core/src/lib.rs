//! Core library for invoice extraction and payment reconciliation.
//!
//! This crate provides:
//! - PDF text layer extraction with an OCR fallback for scanned pages
//! - Invoice record parsing from free-form and `label: value` text
//! - First-match reconciliation of invoices against payments

pub mod error;
pub mod extract;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod reconcile;

pub use error::{ReconError, Result};
pub use extract::{ExtractedText, ExtractionMethod, TextExtractor};
pub use invoice::{DelimitedInvoiceParser, InvoiceParser, StructuredInvoiceParser};
pub use models::config::ReconConfig;
pub use models::document::{DocumentKind, RawDocument};
pub use models::invoice::{Invoice, InvoiceStatus, ParsedInvoiceRecord, Payment};
pub use ocr::{OcrResult, PageRecognizer, TextBox};
#[cfg(feature = "native")]
pub use ocr::{LazyOcrEngine, PureOcrEngine};
pub use pipeline::{ExtractionResult, InvoicePipeline};
pub use reconcile::{reconcile, MatchResult, Reconciliation, ReconciliationMatcher};
