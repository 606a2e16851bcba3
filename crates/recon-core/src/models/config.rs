//! Configuration structures for the extraction pipeline and the matcher.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the recon pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Invoice extraction configuration.
    pub extraction: ExtractionConfig,

    /// Reconciliation configuration.
    pub reconciliation: ReconciliationConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition confidence threshold (0.0 - 1.0). Boxes below it are dropped.
    pub min_confidence: f32,

    /// Keep `[UNK]` tokens emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0, // CTC confidence scores are inherently low
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Run OCR when no page has a text layer.
    pub ocr_fallback: bool,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            ocr_fallback: true,
            max_pages: 0,
        }
    }
}

/// How the structured parser ties vendor labels to invoice blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorAssignment {
    /// The i-th vendor label in the document goes to the i-th invoice block.
    #[default]
    Positional,
    /// Each block takes the vendor label just before it, or the first one
    /// inside it when the document puts vendors after invoice numbers.
    Scoped,
}

/// Invoice extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Vendor correlation strategy for free-form text.
    pub vendor_assignment: VendorAssignment,
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Maximum absolute difference between invoice amount and paid amount.
    pub amount_tolerance: Decimal,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: crate::reconcile::AMOUNT_TOLERANCE,
        }
    }
}

/// OCR model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Check that the detection and recognition models exist in `model_dir`.
    pub fn is_available(&self) -> bool {
        self.model_dir.join(&self.detection_model).exists()
            && self.model_dir.join(&self.recognition_model).exists()
    }
}

impl ReconConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
