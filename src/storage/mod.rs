//! Storage Layer
//!
//! Per-user directories for the settings file and the compiled recognition helper.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::SETTINGS_FILE;

/// File name of the compiled helper inside `<data dir>/bin`
pub const HELPER_BINARY_NAME: &str = "vision_ocr";

/// File name of the installed helper source inside `<data dir>/helper`
pub const HELPER_SCRIPT_NAME: &str = "vision_ocr.swift";

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "vision-ocr", "vision-ocr")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Path of the settings file
pub fn settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}

/// Default location of the compiled helper binary
pub fn default_helper_binary() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("bin").join(HELPER_BINARY_NAME))
}

/// Current user's home directory, used for `~` expansion
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Default location of the installed helper source
pub fn default_helper_script() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("helper").join(HELPER_SCRIPT_NAME))
}
