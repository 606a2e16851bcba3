//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::sync::OnceLock;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{OcrResult, PageRecognizer, TextBox};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `models`.
    pub fn from_models(models: &ModelConfig, config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = models.model_dir.join(&models.detection_model);
        let rec_path = models.model_dir.join(&models.recognition_model);
        let dict_path = models.model_dir.join(&models.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("missing {}", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", models.model_dir.display());

        Ok(Self { engine, config })
    }

    /// Process an image and extract text with bounding boxes.
    pub fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        debug!("Processing image: {}x{}", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let boxes: Vec<TextBox> = results
            .iter()
            .filter(|r| r.confidence >= self.config.min_confidence)
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect();

        let result = OcrResult::from_boxes(
            boxes,
            (width, height),
            start.elapsed().as_millis() as u64,
        );

        info!(
            "OCR complete: {} text boxes in {}ms",
            result.boxes.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

impl PageRecognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        Ok(self.process(image)?.text)
    }
}

/// Loads a [`PureOcrEngine`] the first time a page needs recognition.
///
/// Documents with a text layer never touch the models.
pub struct LazyOcrEngine {
    models: ModelConfig,
    config: OcrConfig,
    engine: OnceLock<Result<PureOcrEngine, String>>,
}

impl LazyOcrEngine {
    pub fn new(models: ModelConfig, config: OcrConfig) -> Self {
        Self {
            models,
            config,
            engine: OnceLock::new(),
        }
    }

    fn engine(&self) -> Result<&PureOcrEngine, OcrError> {
        self.engine
            .get_or_init(|| {
                PureOcrEngine::from_models(&self.models, self.config.clone())
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|msg| OcrError::ModelLoad(msg.clone()))
    }
}

impl PageRecognizer for LazyOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self.engine()?.recognize(image)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
