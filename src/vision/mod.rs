//! Vision/OCR Layer
//!
//! Turns an image path into a structured recognition result.
//! The text-recognition engine itself is injected through [`TextRecognizer`]:
//! - [`HelperRecognizer`] runs the platform Vision helper process (production)
//! - fixture recognizers feed synthetic observations in tests

pub mod adapter;
pub mod helper;
pub mod pipeline;
pub mod serialize;

#[cfg(test)]
pub mod testing;

pub use adapter::recognize_image;
pub use helper::{compile_helper, install_helper_script, HelperRecognizer};
pub use pipeline::build_result;
pub use serialize::{to_json, to_text};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

use crate::config::{OcrConfig, RecognitionLevel};
use crate::error::OcrError;

/// Normalized bounding box, origin bottom-left, Y increasing upward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Vertical midpoint
    pub fn mid_y(&self) -> f64 {
        self.min_y + self.height / 2.0
    }

    /// Finite coordinates with a non-negative extent
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// One ranked reading of an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub confidence: f64,
}

/// Text region reported by the engine, candidates ranked best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub bbox: BoundingBox,
}

impl Observation {
    /// Highest-ranked reading, if the engine produced any
    pub fn top_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Convert into a line using the top candidate.
    /// Observations without candidates or with empty text yield no line.
    pub fn into_line(self) -> Option<RecognizedLine> {
        let bbox = self.bbox;
        let top = self.candidates.into_iter().next()?;
        if top.text.is_empty() {
            return None;
        }

        Some(RecognizedLine {
            text: top.text,
            confidence: top.confidence,
            bbox,
        })
    }
}

/// A recognized line of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Final result for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    /// Path as supplied by the caller
    #[serde(rename = "path")]
    pub input_path: String,
    /// Canonical absolute path
    pub resolved_path: String,
    /// Image width in pixels
    #[serde(rename = "width")]
    pub image_width: u32,
    /// Image height in pixels
    #[serde(rename = "height")]
    pub image_height: u32,
    pub line_count: usize,
    /// Line texts joined by newline, in final order
    pub full_text: String,
    pub lines: Vec<RecognizedLine>,
}

/// Decoded image handed to the recognizer
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: PathBuf,
    image: DynamicImage,
}

impl SourceImage {
    pub fn new(path: PathBuf, image: DynamicImage) -> Self {
        Self { path, image }
    }

    /// Canonical path the image was decoded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Language/quality configuration passed to the engine
#[derive(Debug, Clone, Copy)]
pub struct RecognitionRequest<'a> {
    pub languages: &'a [String],
    pub recognition_level: RecognitionLevel,
    pub language_correction: bool,
}

impl<'a> RecognitionRequest<'a> {
    pub fn from_config(config: &'a OcrConfig) -> Self {
        Self {
            languages: &config.languages,
            recognition_level: config.recognition_level,
            language_correction: config.language_correction,
        }
    }
}

/// Text-recognition capability.
///
/// Implementations block until the engine is done and return its observations
/// in engine order. Errors are reported as recognition failures.
pub trait TextRecognizer: Send + Sync {
    fn recognize(
        &self,
        image: &SourceImage,
        request: &RecognitionRequest<'_>,
    ) -> anyhow::Result<Vec<Observation>>;
}

/// Single-image pipeline: adapter followed by result post-processing
pub struct OcrPipeline<'a> {
    recognizer: &'a dyn TextRecognizer,
    config: &'a OcrConfig,
}

impl<'a> OcrPipeline<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, config: &'a OcrConfig) -> Self {
        Self { recognizer, config }
    }

    /// Recognize one image and return the structured result
    pub fn process(&self, path: &str) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let recognized = recognize_image(path, self.recognizer, self.config)?;
        let result = build_result(recognized, self.config);

        debug!(
            "OCR of {} complete in {:?}: {} lines",
            result.resolved_path,
            start.elapsed(),
            result.line_count
        );

        Ok(result)
    }

    /// Recognize one image and return only its text
    pub fn process_text(&self, path: &str) -> Result<String, OcrError> {
        self.process(path).map(|result| to_text(&result))
    }
}
