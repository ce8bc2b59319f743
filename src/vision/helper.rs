//! Vision helper process backend
//!
//! Runs the platform recognition helper (a small Swift program wrapping the
//! Vision framework) and reads its raw observations from stdout as JSON.
//! The helper is run as a prebuilt binary when one is available, otherwise
//! its source is interpreted through `xcrun swift`. The source ships inside
//! this binary and is written to the data directory on first use.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::{Observation, RecognitionRequest, SourceImage, TextRecognizer};

/// Swift source of the recognition helper
pub const HELPER_SOURCE: &str = include_str!("../../helper/vision_ocr.swift");

/// Write the bundled helper source to `path` unless an identical copy is already there
pub fn install_helper_script(path: &Path) -> Result<()> {
    if std::fs::read_to_string(path).is_ok_and(|existing| existing == HELPER_SOURCE) {
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    std::fs::write(path, HELPER_SOURCE)
        .with_context(|| format!("Failed to write helper source {:?}", path))?;

    info!("Installed helper source to {:?}", path);
    Ok(())
}

/// How the helper is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperCommand {
    /// Prebuilt executable
    Binary(PathBuf),
    /// Swift source run through `xcrun swift`
    Script(PathBuf),
}

impl HelperCommand {
    /// Prefer an executable binary, fall back to the script
    pub fn resolve(binary: Option<&Path>, script: Option<&Path>) -> Result<Self> {
        if let Some(binary) = binary.filter(|b| is_executable(b)) {
            return Ok(HelperCommand::Binary(binary.to_path_buf()));
        }

        match script {
            Some(script) if script.is_file() => Ok(HelperCommand::Script(script.to_path_buf())),
            Some(script) => bail!("Swift helper script not found: {}", script.display()),
            None => bail!("No Swift helper binary or script configured"),
        }
    }

    fn command(&self) -> Command {
        match self {
            HelperCommand::Binary(binary) => Command::new(binary),
            HelperCommand::Script(script) => {
                let mut command = Command::new("xcrun");
                command.arg("swift").arg(script);
                command
            }
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Raw helper output
#[derive(Debug, Deserialize)]
struct HelperOutput {
    #[serde(default)]
    observations: Vec<Observation>,
}

/// Recognizer backed by the Vision helper process
#[derive(Debug, Clone)]
pub struct HelperRecognizer {
    binary: Option<PathBuf>,
    script: Option<PathBuf>,
}

impl HelperRecognizer {
    /// Create a recognizer from the helper locations.
    /// Locations are checked on every call, so a binary compiled later is picked up.
    pub fn new(binary: Option<PathBuf>, script: Option<PathBuf>) -> Self {
        Self { binary, script }
    }

    /// Command that would be used right now
    pub fn helper_command(&self) -> Result<HelperCommand> {
        HelperCommand::resolve(self.binary.as_deref(), self.script.as_deref())
    }
}

impl TextRecognizer for HelperRecognizer {
    fn recognize(
        &self,
        image: &SourceImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<Observation>> {
        let helper = self.helper_command()?;
        debug!("Running helper {:?} on {:?}", helper, image.path());

        let output = helper
            .command()
            .arg("--input")
            .arg(image.path())
            .arg("--languages")
            .arg(request.languages.join(","))
            .arg("--recognition-level")
            .arg(request.recognition_level.as_str())
            .arg("--language-correction")
            .arg(request.language_correction.to_string())
            .output()
            .with_context(|| format!("Failed to start OCR helper {:?}", helper))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.is_empty() {
                bail!("Swift OCR helper failed without stderr output.");
            }
            bail!(stderr);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let observations = parse_helper_output(&stdout)?;

        debug!("Helper returned {} observations", observations.len());
        Ok(observations)
    }
}

/// Parse the helper's stdout
pub fn parse_helper_output(stdout: &str) -> Result<Vec<Observation>> {
    let output: HelperOutput = serde_json::from_str(stdout)
        .map_err(|e| anyhow::anyhow!("Helper returned invalid JSON: {}", e))?;
    Ok(output.observations)
}

/// Result of compiling the helper
#[derive(Debug, Clone, Serialize)]
pub struct CompiledHelper {
    pub binary: PathBuf,
    pub status: String,
}

/// Compile the Swift helper into a native binary for faster calls
pub fn compile_helper(script: &Path, output: &Path) -> Result<CompiledHelper> {
    if !script.is_file() {
        bail!("Swift helper script not found: {}", script.display());
    }

    if let Some(out_dir) = output.parent() {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create {:?}", out_dir))?;
    }

    info!("Compiling {:?} -> {:?}", script, output);

    let result = Command::new("xcrun")
        .arg("swiftc")
        .arg("-O")
        .arg(script)
        .arg("-o")
        .arg(output)
        .output()
        .context("Failed to start xcrun swiftc")?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        if stderr.is_empty() {
            bail!("swiftc failed");
        }
        bail!(stderr);
    }

    Ok(CompiledHelper {
        binary: output.to_path_buf(),
        status: "compiled".to_string(),
    })
}
