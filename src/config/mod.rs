//! Application Configuration
//!
//! Recognition options and the settings file that supplies their defaults.
//! Settings are stored in TOML format.

pub mod options;

pub use options::{OcrConfig, OcrOptions, RecognitionLevel};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the settings file inside the config directory
pub const SETTINGS_FILE: &str = "config.toml";

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default recognition options (overridden by CLI flags)
    pub ocr: OcrOptions,
    /// Recognition helper location
    pub helper: HelperSettings,
    /// Batch settings
    pub batch: BatchSettings,
}

/// Where to find the recognition helper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperSettings {
    /// Prebuilt helper executable
    pub binary: Option<PathBuf>,
    /// Helper source, run through `xcrun swift` when no binary is available
    pub script: Option<PathBuf>,
}

/// Batch-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Worker pool size
    pub workers: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get().min(4))
                .unwrap_or(1),
        }
    }
}

/// Load settings from file
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {:?}", path))?;
    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file {:?}", path))?;
    Ok(settings)
}

/// Save settings to file
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
