//! Recognition options and their validation

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OcrError;

/// Languages used when none are given
pub const DEFAULT_LANGUAGES: [&str; 2] = ["ja-JP", "en-US"];

/// Recognition quality requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionLevel {
    #[default]
    Accurate,
    Fast,
}

impl RecognitionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionLevel::Accurate => "accurate",
            RecognitionLevel::Fast => "fast",
        }
    }
}

impl fmt::Display for RecognitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecognitionLevel {
    type Err = OcrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accurate" => Ok(RecognitionLevel::Accurate),
            "fast" => Ok(RecognitionLevel::Fast),
            _ => Err(OcrError::InvalidConfig(format!(
                "recognition_level must be one of [accurate, fast], got '{}'",
                value
            ))),
        }
    }
}

/// Unvalidated recognition options, exactly as supplied by the caller.
///
/// Settings files may use native TOML values (`min_confidence = 0.5`,
/// `sort_reading_order = false`, `languages = ["en-US"]`); they are kept in
/// textual form and validated together with CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    /// Comma-joined language tags
    #[serde(deserialize_with = "raw_option")]
    pub languages: String,
    #[serde(deserialize_with = "raw_option")]
    pub recognition_level: String,
    #[serde(deserialize_with = "raw_option")]
    pub language_correction: String,
    #[serde(deserialize_with = "raw_option")]
    pub sort_reading_order: String,
    #[serde(deserialize_with = "raw_option")]
    pub min_confidence: String,
}

/// Any scalar or list a settings file may hold for an option
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Number(f64),
    List(Vec<String>),
}

fn raw_option<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawValue::deserialize(deserializer)? {
        RawValue::Text(text) => text,
        RawValue::Flag(flag) => flag.to_string(),
        RawValue::Integer(n) => n.to_string(),
        RawValue::Number(n) => n.to_string(),
        RawValue::List(items) => items.join(","),
    })
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.join(","),
            recognition_level: "accurate".to_string(),
            language_correction: "true".to_string(),
            sort_reading_order: "true".to_string(),
            min_confidence: "0.0".to_string(),
        }
    }
}

/// Validated recognition configuration, read-only once built
#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    pub languages: Vec<String>,
    pub recognition_level: RecognitionLevel,
    pub language_correction: bool,
    pub sort_reading_order: bool,
    pub min_confidence: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            recognition_level: RecognitionLevel::Accurate,
            language_correction: true,
            sort_reading_order: true,
            min_confidence: 0.0,
        }
    }
}

impl OcrConfig {
    /// Validate raw options. Either every field validates or nothing is built.
    pub fn from_options(options: &OcrOptions) -> Result<Self, OcrError> {
        Ok(Self {
            languages: parse_languages(&options.languages),
            recognition_level: options.recognition_level.parse()?,
            language_correction: parse_bool("language_correction", &options.language_correction)?,
            sort_reading_order: parse_bool("sort_reading_order", &options.sort_reading_order)?,
            min_confidence: parse_min_confidence(&options.min_confidence)?,
        })
    }
}

fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect()
}

/// Split a comma-joined language list. An empty list falls back to the defaults.
pub fn parse_languages(value: &str) -> Vec<String> {
    let languages: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if languages.is_empty() {
        default_languages()
    } else {
        languages
    }
}

/// Parse a boolean token
pub fn parse_bool(field: &str, value: &str) -> Result<bool, OcrError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(OcrError::InvalidConfig(format!(
            "{} cannot parse boolean: '{}'",
            field, value
        ))),
    }
}

/// Parse the confidence threshold; range-checked, never clamped
pub fn parse_min_confidence(value: &str) -> Result<f64, OcrError> {
    let parsed: f64 = value.trim().parse().map_err(|_| {
        OcrError::InvalidConfig(format!("min_confidence is not a number: '{}'", value))
    })?;

    if !parsed.is_finite() {
        return Err(OcrError::InvalidConfig(format!(
            "min_confidence is not a number: '{}'",
            value
        )));
    }
    if !(0.0..=1.0).contains(&parsed) {
        return Err(OcrError::InvalidConfig(format!(
            "min_confidence must be between 0.0 and 1.0, got {}",
            parsed
        )));
    }

    Ok(parsed)
}
