//! Batch Orchestrator
//!
//! Runs the single-image pipeline over many paths. Each item fails on its own:
//! an error is recorded against its index and the remaining items still run.

use crossbeam_channel::{bounded, unbounded};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::OcrConfig;
use crate::error::{ErrorKind, OcrError};
use crate::vision::serialize::{encode, validate, SerializeError};
use crate::vision::{OcrPipeline, OcrResult, TextRecognizer};

/// Successful item, tagged with its input position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSuccess {
    pub index: usize,
    #[serde(flatten)]
    pub result: OcrResult,
}

/// Failed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub index: usize,
    /// Path as supplied
    pub path: String,
    pub error_kind: ErrorKind,
    pub message: String,
}

/// Aggregate of a batch run, both lists in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchSuccess>,
    pub errors: Vec<BatchFailure>,
}

impl BatchReport {
    fn from_outcomes(paths: &[String], outcomes: Vec<Result<OcrResult, OcrError>>) -> Self {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for (index, (path, outcome)) in paths.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(result) => results.push(BatchSuccess { index, result }),
                Err(err) => errors.push(BatchFailure {
                    index,
                    path: path.clone(),
                    error_kind: err.kind(),
                    message: err.message().to_string(),
                }),
            }
        }

        Self {
            total: paths.len(),
            succeeded: results.len(),
            failed: errors.len(),
            results,
            errors,
        }
    }

    /// Validate every contained result and encode the report as JSON
    pub fn to_json(&self, compact: bool) -> Result<String, SerializeError> {
        for success in &self.results {
            validate(&success.result)?;
        }
        encode(self, compact)
    }
}

/// Runs a batch with a bounded worker pool
pub struct BatchRunner<'a> {
    pipeline: OcrPipeline<'a>,
    workers: usize,
}

impl<'a> BatchRunner<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, config: &'a OcrConfig, workers: usize) -> Self {
        Self {
            pipeline: OcrPipeline::new(recognizer, config),
            workers: workers.max(1),
        }
    }

    /// Process every path; never aborts on a single failure
    pub fn run(&self, paths: &[String]) -> BatchReport {
        let start = Instant::now();
        let workers = self.workers.min(paths.len()).max(1);
        info!("Running OCR batch of {} images on {} worker(s)", paths.len(), workers);

        let outcomes = if workers == 1 {
            paths.iter().map(|path| self.process_item(path)).collect()
        } else {
            self.run_parallel(paths, workers)
        };

        let report = BatchReport::from_outcomes(paths, outcomes);
        info!(
            "Batch complete in {:?}: {} succeeded, {} failed",
            start.elapsed(),
            report.succeeded,
            report.failed
        );
        report
    }

    fn run_parallel(&self, paths: &[String], workers: usize) -> Vec<Result<OcrResult, OcrError>> {
        let (job_tx, job_rx) = bounded::<(usize, &str)>(paths.len());
        let (result_tx, result_rx) = unbounded::<(usize, Result<OcrResult, OcrError>)>();

        for (index, path) in paths.iter().enumerate() {
            // Capacity covers every path and the receiver is still held here
            if let Err(e) = job_tx.send((index, path.as_str())) {
                warn!("Failed to queue batch item {}: {}", index, e);
                break;
            }
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    for (index, path) in jobs.iter() {
                        let outcome = self.process_item(path);
                        if results.send((index, outcome)).is_err() {
                            warn!("Batch collector gone, stopping worker");
                            return;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Result<OcrResult, OcrError>>> =
            (0..paths.len()).map(|_| None).collect();
        for (index, outcome) in result_rx.iter() {
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(OcrError::Recognition("batch worker produced no outcome".to_string()))
                })
            })
            .collect()
    }

    fn process_item(&self, path: &str) -> Result<OcrResult, OcrError> {
        let outcome = self.pipeline.process(path);
        match &outcome {
            Ok(result) => debug!("{}: {} lines", path, result.line_count),
            Err(err) => warn!("{}: {}", path, err),
        }
        outcome
    }
}
