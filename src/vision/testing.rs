//! Test fixtures: a scripted recognizer and image helpers

use anyhow::anyhow;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{BoundingBox, Candidate, Observation, RecognitionRequest, SourceImage, TextRecognizer};
use crate::config::RecognitionLevel;

/// Request as seen by [`FixtureRecognizer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub file_name: String,
    pub languages: Vec<String>,
    pub recognition_level: RecognitionLevel,
    pub language_correction: bool,
}

/// Recognizer returning canned observations, optionally per file name
pub struct FixtureRecognizer {
    default: Vec<Observation>,
    per_file: HashMap<String, Result<Vec<Observation>, String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FixtureRecognizer {
    pub fn new(default: Vec<Observation>) -> Self {
        Self {
            default,
            per_file: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_file(mut self, file_name: &str, observations: Vec<Observation>) -> Self {
        self.per_file.insert(file_name.to_string(), Ok(observations));
        self
    }

    pub fn failing_on(mut self, file_name: &str, message: &str) -> Self {
        self.per_file.insert(file_name.to_string(), Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl TextRecognizer for FixtureRecognizer {
    fn recognize(
        &self,
        image: &SourceImage,
        request: &RecognitionRequest<'_>,
    ) -> anyhow::Result<Vec<Observation>> {
        let file_name = image
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.requests.lock().push(RecordedRequest {
            file_name: file_name.clone(),
            languages: request.languages.to_vec(),
            recognition_level: request.recognition_level,
            language_correction: request.language_correction,
        });

        match self.per_file.get(&file_name) {
            Some(Ok(observations)) => Ok(observations.clone()),
            Some(Err(message)) => Err(anyhow!("{}", message)),
            None => Ok(self.default.clone()),
        }
    }
}

/// Single-candidate observation centred vertically on `mid_y`
pub fn observation(text: &str, confidence: f64, mid_y: f64, min_x: f64) -> Observation {
    Observation {
        candidates: vec![Candidate {
            text: text.to_string(),
            confidence,
        }],
        bbox: BoundingBox::new(min_x, mid_y - 0.01, 0.2, 0.02),
    }
}

/// Write a blank PNG and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::new(width, height)
        .save(&path)
        .expect("Failed to write fixture image");
    path
}
