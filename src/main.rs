//! vision-ocr - structured OCR from the platform Vision engine
//!
//! Recognizes text in images and prints deterministic results:
//! per-line text, confidence and bounding box plus reading-order full text.

mod batch;
mod config;
mod error;
mod storage;
mod vision;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::batch::BatchRunner;
use crate::config::{OcrConfig, OcrOptions, Settings};
use crate::error::{ErrorReport, OcrError};
use crate::vision::serialize::encode;
use crate::vision::{compile_helper, install_helper_script, to_json, HelperRecognizer, OcrPipeline};

/// Exit code for internal errors
const EXIT_INTERNAL: u8 = 70;

/// vision-ocr - OCR images and print structured results
#[derive(Parser, Debug)]
#[command(name = "vision-ocr", version)]
#[command(about = "OCR images with the platform Vision engine and print structured results")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Comma-separated language tags (default: ja-JP,en-US)
    #[arg(long, global = true)]
    languages: Option<String>,

    /// Recognition level: accurate or fast
    #[arg(long, global = true)]
    recognition_level: Option<String>,

    /// Apply language correction (true/false, yes/no, on/off, 1/0)
    #[arg(long, global = true)]
    language_correction: Option<String>,

    /// Sort lines top-to-bottom, left-to-right
    #[arg(long, global = true)]
    sort_reading_order: Option<String>,

    /// Drop lines below this confidence (0.0 - 1.0)
    #[arg(long, global = true, allow_hyphen_values = true)]
    min_confidence: Option<String>,

    /// Prebuilt helper executable
    #[arg(long, global = true)]
    helper_bin: Option<PathBuf>,

    /// Swift helper source, used when no binary is available
    #[arg(long, global = true)]
    helper_script: Option<PathBuf>,

    /// Worker threads for batch runs
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Settings file (default: per-user config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long, global = true)]
    compact: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// OCR one image and print the structured result
    Image {
        path: String,
    },
    /// OCR many images; failures are reported per image
    Batch {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// OCR one image and print only its text
    Text {
        path: String,
    },
    /// Compile the Swift helper to a native binary
    CompileHelper {
        /// Output binary (default: per-user data directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a settings file with the default values
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    /// Raw options: flags override the settings file
    fn ocr_options(&self, defaults: OcrOptions) -> OcrOptions {
        OcrOptions {
            languages: self.languages.clone().unwrap_or(defaults.languages),
            recognition_level: self
                .recognition_level
                .clone()
                .unwrap_or(defaults.recognition_level),
            language_correction: self
                .language_correction
                .clone()
                .unwrap_or(defaults.language_correction),
            sort_reading_order: self
                .sort_reading_order
                .clone()
                .unwrap_or(defaults.sort_reading_order),
            min_confidence: self.min_confidence.clone().unwrap_or(defaults.min_confidence),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}

/// Initialize logging on stderr; stdout carries results
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn run(args: Args) -> Result<ExitCode> {
    match &args.command {
        Commands::InitConfig { force } => {
            let path = match &args.config {
                Some(path) => path.clone(),
                None => storage::settings_path()?,
            };
            init_settings(&path, *force)?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::CompileHelper { output } => {
            let settings = load_or_default_settings(args.config.as_deref());
            let script = helper_script(&args, &settings)?;
            let output = match output.clone().or_else(|| settings.helper.binary.clone()) {
                Some(output) => output,
                None => storage::default_helper_binary()?,
            };

            let compiled = compile_helper(&script, &output)?;
            println!("{}", encode(&compiled, args.compact)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Image { path } => with_recognizer(&args, |recognizer, config, _| {
            match OcrPipeline::new(recognizer, config).process(path) {
                Ok(result) => {
                    println!("{}", to_json(&result, args.compact)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => report_error(&e),
            }
        }),
        Commands::Text { path } => with_recognizer(&args, |recognizer, config, _| {
            match OcrPipeline::new(recognizer, config).process_text(path) {
                Ok(text) => {
                    println!("{}", text);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => report_error(&e),
            }
        }),
        Commands::Batch { paths } => with_recognizer(&args, |recognizer, config, settings| {
            let workers = args.workers.unwrap_or(settings.batch.workers);
            let report = BatchRunner::new(recognizer, config, workers).run(paths);
            println!("{}", report.to_json(args.compact)?);
            Ok(ExitCode::SUCCESS)
        }),
    }
}

/// Validate the recognition config and build the helper recognizer.
/// An invalid config is reported before any image is touched.
fn with_recognizer<F>(args: &Args, f: F) -> Result<ExitCode>
where
    F: FnOnce(&HelperRecognizer, &OcrConfig, &Settings) -> Result<ExitCode>,
{
    let settings = load_or_default_settings(args.config.as_deref());

    let options = args.ocr_options(settings.ocr.clone());
    let config = match OcrConfig::from_options(&options) {
        Ok(config) => config,
        Err(e) => return report_error(&e),
    };
    debug!("Recognition config: {:?}", config);

    let helper_binary = args
        .helper_bin
        .clone()
        .or_else(|| settings.helper.binary.clone())
        .or_else(|| storage::default_helper_binary().ok());
    let helper_script = match helper_script(args, &settings) {
        Ok(script) => Some(script),
        Err(e) => {
            warn!("No helper source available: {:#}", e);
            None
        }
    };

    let recognizer = HelperRecognizer::new(helper_binary, helper_script);
    f(&recognizer, &config, &settings)
}

/// Configured helper source, or the bundled one installed in the data directory
fn helper_script(args: &Args, settings: &Settings) -> Result<PathBuf> {
    if let Some(script) = args.helper_script.clone().or_else(|| settings.helper.script.clone()) {
        return Ok(script);
    }

    let script = storage::default_helper_script()?;
    install_helper_script(&script)?;
    Ok(script)
}

/// Print a structured error on stderr and map it to an exit code
fn report_error(err: &OcrError) -> Result<ExitCode> {
    eprintln!("{}", encode(&ErrorReport::from(err), true)?);
    Ok(ExitCode::from(err.exit_code()))
}

/// Load settings from file or fall back to defaults
fn load_or_default_settings(path: Option<&Path>) -> Settings {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match storage::settings_path() {
            Ok(path) => path,
            Err(e) => {
                debug!("No settings directory: {:#}", e);
                return Settings::default();
            }
        },
    };

    if path.exists() {
        match config::load_settings(&path) {
            Ok(settings) => {
                info!("Loaded settings from {:?}", path);
                return settings;
            }
            Err(e) => warn!("Ignoring settings: {:#}", e),
        }
    }

    debug!("Using default settings");
    Settings::default()
}

/// Write default settings unless a file already exists
fn init_settings(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config::save_settings(&Settings::default(), path)?;
    info!("Wrote default settings to {:?}", path);
    Ok(())
}
