//! Document-to-text extraction with OCR fallback for scanned PDFs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::DocumentError;
use crate::models::config::PdfConfig;
use crate::models::document::{DocumentKind, RawDocument};
use crate::ocr::PageRecognizer;
use crate::pdf::{PageSource, PdfExtractor};

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded PDF text layer.
    TextLayer,
    /// Optical recognition of page rasters.
    Ocr,
    /// UTF-8 text document.
    PlainText,
    /// Scanned PDF that was not sent to OCR; the text is empty.
    NoText,
}

/// Text extracted from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Accumulated text; may be empty.
    pub text: String,
    /// Path that produced the text.
    pub method: ExtractionMethod,
    /// Pages that contributed text.
    pub pages_with_text: u32,
}

impl ExtractedText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Converts raw documents into plain text.
///
/// PDF text layers are always preferred. Pages are only rasterized and sent to
/// the recognizer when no page of the document carries any text layer.
pub struct TextExtractor {
    recognizer: Option<Box<dyn PageRecognizer>>,
    config: PdfConfig,
}

impl TextExtractor {
    /// Create an extractor without optical recognition.
    pub fn new() -> Self {
        Self {
            recognizer: None,
            config: PdfConfig::default(),
        }
    }

    /// Set the recognizer used for scanned documents.
    pub fn with_recognizer(mut self, recognizer: impl PageRecognizer + 'static) -> Self {
        self.recognizer = Some(Box::new(recognizer));
        self
    }

    /// Set configuration.
    pub fn with_config(mut self, config: PdfConfig) -> Self {
        self.config = config;
        self
    }

    /// Extract the text of a document according to its declared kind.
    pub fn extract(&self, document: &RawDocument<'_>) -> Result<ExtractedText, DocumentError> {
        match document.kind() {
            DocumentKind::Pdf => {
                let source = PdfExtractor::from_bytes(document.bytes())?;
                self.extract_pages(&source)
            }
            DocumentKind::PlainText => {
                let text = String::from_utf8(document.bytes().to_vec())?;
                let pages_with_text = u32::from(!text.trim().is_empty());
                Ok(ExtractedText {
                    text,
                    method: ExtractionMethod::PlainText,
                    pages_with_text,
                })
            }
        }
    }

    /// Extract text from any paged source, falling back to OCR when every
    /// page lacks a text layer.
    pub fn extract_pages<S: PageSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<ExtractedText, DocumentError> {
        let page_count = self.pages_to_process(source);

        let mut text = String::new();
        let mut pages_with_text = 0;

        for page in 1..=page_count {
            match source.page_text(page)? {
                Some(page_text) if !page_text.is_empty() => {
                    text.push_str(&page_text);
                    text.push('\n');
                    pages_with_text += 1;
                }
                _ => debug!("Page {} has no text layer", page),
            }
        }

        if !text.trim().is_empty() {
            debug!(
                "Text layer found on {}/{} pages, skipping OCR",
                pages_with_text, page_count
            );
            return Ok(ExtractedText {
                text,
                method: ExtractionMethod::TextLayer,
                pages_with_text,
            });
        }

        let recognizer = match (&self.recognizer, self.config.ocr_fallback) {
            (Some(recognizer), true) => recognizer,
            (None, true) => {
                warn!("Document has no text layer and no OCR engine is configured");
                return Ok(ExtractedText {
                    text,
                    method: ExtractionMethod::NoText,
                    pages_with_text: 0,
                });
            }
            (_, false) => {
                debug!("Document has no text layer, OCR fallback disabled");
                return Ok(ExtractedText {
                    text,
                    method: ExtractionMethod::NoText,
                    pages_with_text: 0,
                });
            }
        };

        info!("No text layer in {} pages, running OCR", page_count);

        let mut text = String::new();
        let mut pages_with_text = 0;

        for page in 1..=page_count {
            let image = match source.render_page(page) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Failed to rasterize page {}: {}", page, e);
                    continue;
                }
            };

            match recognizer.recognize(&image) {
                Ok(page_text) if !page_text.trim().is_empty() => {
                    text.push_str(&page_text);
                    text.push('\n');
                    pages_with_text += 1;
                }
                Ok(_) => debug!("No text recognized on page {}", page),
                Err(e) => warn!("OCR failed for page {}: {}", page, e),
            }
        }

        Ok(ExtractedText {
            text,
            method: ExtractionMethod::Ocr,
            pages_with_text,
        })
    }

    fn pages_to_process<S: PageSource + ?Sized>(&self, source: &S) -> u32 {
        let page_count = source.page_count();
        match self.config.max_pages {
            0 => page_count,
            max => page_count.min(u32::try_from(max).unwrap_or(u32::MAX)),
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}
