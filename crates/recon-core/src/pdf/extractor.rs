//! PDF text layer and page image extraction using lopdf and pdf-extract.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PageSource, Result};
use crate::error::DocumentError;

/// PDF page source backed by lopdf.
///
/// The text layer of every page is read once at load time; page rasters are
/// decoded on demand from the page's image XObjects.
pub struct PdfExtractor {
    document: Document,
    page_texts: Vec<Option<String>>,
}

impl PdfExtractor {
    /// Parse PDF bytes and read every page's text layer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document =
            Document::load_mem(data).map_err(|e| DocumentError::Parse(e.to_string()))?;

        // pdf-extract needs the decrypted bytes
        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(DocumentError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| DocumentError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(DocumentError::NoPages);
        }

        let page_texts = match pdf_extract::extract_text_from_mem_by_pages(&raw_data) {
            Ok(pages) => pages.into_iter().map(non_blank).collect(),
            Err(e) => {
                warn!("pdf-extract failed ({}), using lopdf text extraction", e);
                (1..=page_count as u32)
                    .map(|page| document.extract_text(&[page]).ok().and_then(non_blank))
                    .collect()
            }
        };

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            document,
            page_texts,
        })
    }

    /// Decode all images referenced by a page's XObject resources.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(DocumentError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(*page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
                    for (name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                            match self.decode_image(obj) {
                                Some(img) => images.push(img),
                                None => trace!(
                                    "Skipping XObject {} on page {}",
                                    String::from_utf8_lossy(name),
                                    page
                                ),
                            }
                        }
                    }
                }
            }
        }

        debug!("Decoded {} images on page {}", images.len(), page);
        Ok(images)
    }

    fn decode_image(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter");
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self
                    .document
                    .get_object(*r)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        raw_to_image(&data, width, height, color_space)
    }

    /// Resources dictionary for a page, walking up the page tree when inherited.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = self.document.get_object(node_id).ok()? else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = self.document.dereference(resources) {
                return Some(res_dict.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }
}

impl PageSource for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<Option<String>> {
        if page == 0 || page > self.page_count() {
            return Err(DocumentError::InvalidPage(page));
        }
        Ok(self.page_texts.get((page - 1) as usize).cloned().flatten())
    }

    fn render_page(&self, page: u32) -> Result<DynamicImage> {
        let images = self.page_images(page)?;

        // A scanned page is one full-page image plus the odd logo or stamp.
        images
            .into_iter()
            .max_by_key(|img| {
                let (w, h) = img.dimensions();
                u64::from(w) * u64::from(h)
            })
            .ok_or_else(|| DocumentError::ImageExtraction(format!("no image on page {}", page)))
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?;
    let rgb_len = pixels.checked_mul(3)?;

    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => data[..rgb_len]
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&g| [g, g, g, 255])
            .collect(),
        _ => {
            trace!(
                "Could not decode image: colorspace={:?}, data_len={}, pixels={}",
                String::from_utf8_lossy(color_space),
                data.len(),
                pixels
            );
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_rejects_malformed_bytes() {
        let result = PdfExtractor::from_bytes(b"definitely not a pdf");
        assert!(matches!(result, Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_raw_gray_image() {
        let img = raw_to_image(&[0, 64, 128, 255], 2, 2, b"DeviceGray").unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.to_rgba8().get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_raw_image_too_short() {
        assert!(raw_to_image(&[0, 0, 0], 2, 2, b"DeviceRGB").is_none());
        assert!(raw_to_image(&[0; 16], 2, 2, b"DeviceCMYK").is_none());
    }

    #[test]
    fn test_raw_image_huge_dimensions() {
        assert!(raw_to_image(&[0; 16], u32::MAX, u32::MAX, b"DeviceRGB").is_none());
        assert!(raw_to_image(&[0; 16], u32::MAX, 1, b"DeviceGray").is_none());
    }

    #[test]
    fn test_negative_dimensions_are_not_an_image() {
        let extractor = PdfExtractor {
            document: Document::with_version("1.4"),
            page_texts: Vec::new(),
        };

        let stream = lopdf::Stream::new(
            lopdf::dictionary! {
                "Subtype" => "Image",
                "Width" => -2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0u8; 4],
        );
        assert!(extractor.decode_image(&Object::Stream(stream)).is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(" \n\n".to_string()), None);
        assert_eq!(non_blank("Total".to_string()), Some("Total".to_string()));
    }
}
