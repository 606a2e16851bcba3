//! Invoice record extraction from document text.

pub mod amounts;
mod delimited;
pub mod patterns;
mod structured;

pub use delimited::DelimitedInvoiceParser;
pub use structured::{StructuredInvoiceParser, StructuredParse, VendorCandidate};
pub use crate::models::config::VendorAssignment;

use crate::error::ExtractionError;
use crate::models::invoice::ParsedInvoiceRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice parsing.
pub trait InvoiceParser {
    /// Parse invoice records from text, in the order they appear.
    fn parse(&self, text: &str) -> Result<Vec<ParsedInvoiceRecord>>;
}
