//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::DocumentError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A paged document the text extractor can read.
///
/// Pages are 1-indexed.
pub trait PageSource {
    /// Get the number of pages in the document.
    fn page_count(&self) -> u32;

    /// Text layer of a page, or `None` when the page carries no text.
    fn page_text(&self, page: u32) -> Result<Option<String>>;

    /// Rasterize a page for optical recognition.
    fn render_page(&self, page: u32) -> Result<DynamicImage>;
}
