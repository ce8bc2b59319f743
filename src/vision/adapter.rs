//! Recognition adapter
//!
//! Resolves and decodes the input image, then invokes the injected recognizer.
//! "Bad file" and "engine failure" are kept apart: the former is an
//! [`OcrError::ImageLoad`], the latter an [`OcrError::Recognition`].

use image::ImageReader;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{RecognitionRequest, RecognizedLine, SourceImage, TextRecognizer};
use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::storage;

/// Image file extensions accepted as input (lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 8] = ["bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// Output of the adapter for one image
#[derive(Debug, Clone)]
pub struct RecognizedImage {
    /// Path as supplied by the caller
    pub input_path: String,
    /// Canonical absolute path
    pub resolved_path: String,
    pub width: u32,
    pub height: u32,
    /// Lines in engine order, unfiltered
    pub lines: Vec<RecognizedLine>,
}

/// Resolve, decode and recognize one image
pub fn recognize_image(
    input_path: &str,
    recognizer: &dyn TextRecognizer,
    config: &OcrConfig,
) -> Result<RecognizedImage, OcrError> {
    let resolved_path = resolve_image_path(input_path)?;
    let source = load_image(&resolved_path)?;
    let request = RecognitionRequest::from_config(config);

    debug!(
        "Recognizing {:?} ({}x{}, languages={:?}, level={})",
        resolved_path,
        source.width(),
        source.height(),
        request.languages,
        request.recognition_level
    );

    let observations = recognizer
        .recognize(&source, &request)
        .map_err(|e| OcrError::Recognition(format!("{:#}", e)))?;

    let observed = observations.len();
    let mut lines = Vec::with_capacity(observed);
    for (index, observation) in observations.into_iter().enumerate() {
        if let Some(line) = observation.into_line() {
            check_engine_line(index, &line)?;
            lines.push(line);
        }
    }

    if lines.len() != observed {
        debug!(
            "Dropped {} observations without a usable candidate",
            observed - lines.len()
        );
    }

    Ok(RecognizedImage {
        input_path: input_path.to_string(),
        resolved_path: utf8_path(&resolved_path)?.to_string(),
        width: source.width(),
        height: source.height(),
        lines,
    })
}

/// Values outside the engine's documented ranges are an engine failure
fn check_engine_line(index: usize, line: &RecognizedLine) -> Result<(), OcrError> {
    if !line.confidence.is_finite() || !(0.0..=1.0).contains(&line.confidence) {
        return Err(OcrError::Recognition(format!(
            "Engine returned confidence {} for observation {}",
            line.confidence, index
        )));
    }
    if !line.bbox.is_valid() {
        return Err(OcrError::Recognition(format!(
            "Engine returned invalid bounding box {:?} for observation {}",
            line.bbox, index
        )));
    }
    Ok(())
}

fn utf8_path(path: &Path) -> Result<&str, OcrError> {
    path.to_str().ok_or_else(|| {
        OcrError::ImageLoad(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

/// Resolve a user-supplied path to a canonical absolute image file path
pub fn resolve_image_path(path: &str) -> Result<PathBuf, OcrError> {
    let expanded = expand_home(path);
    let candidate = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(|e| OcrError::ImageLoad(format!("Cannot determine working directory: {}", e)))?
            .join(expanded)
    };

    let resolved = match candidate.canonicalize() {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OcrError::ImageLoad(format!(
                "File not found: {}",
                candidate.display()
            )));
        }
        Err(e) => {
            return Err(OcrError::ImageLoad(format!(
                "Cannot resolve {}: {}",
                candidate.display(),
                e
            )));
        }
    };

    utf8_path(&resolved)?;

    if !resolved.is_file() {
        return Err(OcrError::ImageLoad(format!(
            "Path is not a file: {}",
            resolved.display()
        )));
    }

    let extension = resolved
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(OcrError::ImageLoad(format!(
            "Unsupported extension: '{}'. Supported: {}",
            extension,
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    Ok(resolved)
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, storage::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Decode an image file into memory
pub fn load_image(path: &Path) -> Result<SourceImage, OcrError> {
    let image = ImageReader::open(path)
        .map_err(|e| OcrError::ImageLoad(format!("Cannot open {}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| OcrError::ImageLoad(format!("Cannot read {}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| OcrError::ImageLoad(format!("Cannot decode {}: {}", path.display(), e)))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(OcrError::ImageLoad(format!(
            "No decodable frames in {}",
            path.display()
        )));
    }

    Ok(SourceImage::new(path.to_path_buf(), image))
}
