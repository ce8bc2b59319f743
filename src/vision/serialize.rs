//! Serializer for the externally visible record
//!
//! Results are validated before they are written. A violation means an
//! upstream bug and is reported as an internal error, never coerced.

use serde::Serialize;
use thiserror::Error;

use super::OcrResult;

/// Internal serialization failure
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Check the invariants a serializable result must satisfy
pub fn validate(result: &OcrResult) -> Result<(), SerializeError> {
    let violation = |msg: String| -> Result<(), SerializeError> {
        Err(SerializeError::InvariantViolation(format!(
            "{}: {}",
            result.resolved_path, msg
        )))
    };

    if result.image_width == 0 || result.image_height == 0 {
        return violation(format!(
            "image dimensions {}x{}",
            result.image_width, result.image_height
        ));
    }
    if result.line_count != result.lines.len() {
        return violation(format!(
            "lineCount {} but {} lines",
            result.line_count,
            result.lines.len()
        ));
    }

    for (i, line) in result.lines.iter().enumerate() {
        if !line.confidence.is_finite() || !(0.0..=1.0).contains(&line.confidence) {
            return violation(format!("line {} confidence {}", i, line.confidence));
        }
        if line.text.is_empty() {
            return violation(format!("line {} has empty text", i));
        }
        if !line.bbox.is_valid() {
            return violation(format!("line {} bbox {:?}", i, line.bbox));
        }
    }

    Ok(())
}

/// Encode any record as JSON, pretty-printed unless `compact`
pub fn encode<T: Serialize>(value: &T, compact: bool) -> Result<String, SerializeError> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

/// Validate and encode one result
pub fn to_json(result: &OcrResult, compact: bool) -> Result<String, SerializeError> {
    validate(result)?;
    encode(result, compact)
}

/// Plain-text variant: only the aggregated text
pub fn to_text(result: &OcrResult) -> String {
    result.full_text.clone()
}
