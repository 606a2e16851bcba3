//! Document-to-records pipeline: text extraction followed by the parser that
//! fits the document kind.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::extract::{ExtractionMethod, TextExtractor};
use crate::invoice::{DelimitedInvoiceParser, InvoiceParser, StructuredInvoiceParser};
use crate::models::config::ReconConfig;
use crate::models::document::{DocumentKind, RawDocument};
use crate::models::invoice::ParsedInvoiceRecord;

/// Result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Parsed invoice records, in document order.
    pub records: Vec<ParsedInvoiceRecord>,
    /// Raw extracted text.
    pub raw_text: String,
    /// How the text was obtained.
    pub method: ExtractionMethod,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extracts invoice records from raw documents.
///
/// PDFs go through the free-form parser, plain text through the
/// `label: value` block parser.
pub struct InvoicePipeline {
    extractor: TextExtractor,
    structured: StructuredInvoiceParser,
    delimited: DelimitedInvoiceParser,
}

impl InvoicePipeline {
    /// Create a pipeline from explicit parts.
    pub fn new(extractor: TextExtractor, structured: StructuredInvoiceParser) -> Self {
        Self {
            extractor,
            structured,
            delimited: DelimitedInvoiceParser::new(),
        }
    }

    /// Build a pipeline from configuration.
    ///
    /// The OCR engine is attached only when its model files exist, and is
    /// loaded on the first scanned page.
    pub fn from_config(config: &ReconConfig) -> Self {
        let extractor = attach_ocr(TextExtractor::new().with_config(config.pdf.clone()), config);

        let structured = StructuredInvoiceParser::new()
            .with_vendor_assignment(config.extraction.vendor_assignment);

        Self::new(extractor, structured)
    }

    /// Extract text from a document and parse its invoice records.
    pub fn process(&self, document: &RawDocument<'_>) -> Result<ExtractionResult> {
        let start = Instant::now();
        let extracted = self.extractor.extract(document)?;
        let mut warnings = Vec::new();

        if extracted.is_blank() {
            warnings.push("No text could be extracted from the document".to_string());
        }

        let records = match document.kind() {
            DocumentKind::Pdf => {
                let parse = self.structured.analyze(&extracted.text);
                if !parse.counts_agree() {
                    warnings.push(format!(
                        "Found {} invoice blocks but {} vendor labels",
                        parse.block_count,
                        parse.vendor_candidates.len()
                    ));
                }
                parse.records
            }
            DocumentKind::PlainText => self.delimited.parse(&extracted.text)?,
        };

        if records.is_empty() && !extracted.is_blank() {
            warnings.push("No invoice records found".to_string());
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} records via {:?} in {}ms",
            records.len(),
            extracted.method,
            processing_time_ms
        );

        Ok(ExtractionResult {
            records,
            raw_text: extracted.text,
            method: extracted.method,
            warnings,
            processing_time_ms,
        })
    }
}

#[cfg(feature = "native")]
fn attach_ocr(extractor: TextExtractor, config: &ReconConfig) -> TextExtractor {
    if !config.pdf.ocr_fallback {
        return extractor;
    }
    if !config.models.is_available() {
        debug!(
            "OCR models not found in {}, scanned PDFs will yield no text",
            config.models.model_dir.display()
        );
        return extractor;
    }
    extractor.with_recognizer(crate::ocr::LazyOcrEngine::new(
        config.models.clone(),
        config.ocr.clone(),
    ))
}

#[cfg(not(feature = "native"))]
fn attach_ocr(extractor: TextExtractor, _config: &ReconConfig) -> TextExtractor {
    extractor
}

impl Default for InvoicePipeline {
    fn default() -> Self {
        Self::from_config(&ReconConfig::default())
    }
}
