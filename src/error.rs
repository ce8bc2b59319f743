//! Error taxonomy
//!
//! Every user-facing failure of a recognition run maps onto one of three kinds.
//! Internal invariant violations live in [`crate::vision::serialize::SerializeError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single recognition run
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OcrError {
    /// A configuration value could not be validated
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input path is missing, unreadable, undecodable or has no frames
    #[error("image load failed: {0}")]
    ImageLoad(String),

    /// The recognition engine failed on a decodable image
    #[error("recognition failed: {0}")]
    Recognition(String),
}

impl OcrError {
    /// Kind of this error, as reported at the boundary
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            OcrError::ImageLoad(_) => ErrorKind::ImageLoadError,
            OcrError::Recognition(_) => ErrorKind::RecognitionError,
        }
    }

    /// Human-readable message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            OcrError::InvalidConfig(msg) | OcrError::ImageLoad(msg) | OcrError::Recognition(msg) => msg,
        }
    }

    /// Process exit code used by the CLI for this error
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::InvalidConfig => 2,
            ErrorKind::ImageLoadError => 3,
            ErrorKind::RecognitionError => 4,
        }
    }
}

/// Closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidConfig,
    ImageLoadError,
    RecognitionError,
}

/// Structured error record printed at the process boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_kind: ErrorKind,
    pub message: String,
}

impl From<&OcrError> for ErrorReport {
    fn from(err: &OcrError) -> Self {
        Self {
            error_kind: err.kind(),
            message: err.message().to_string(),
        }
    }
}
