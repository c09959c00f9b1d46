use crate::analyzer::Analyzer;
use imgsize_common::{Error, Result};
use imgsize_formats::ImageMetadata;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A file that could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessError {
    pub filename: String,
    pub error: String,
}

/// Totals over the successfully analyzed files
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    #[serde(rename = "total_original_size_bytes")]
    pub total_original_size: u64,
    #[serde(rename = "total_decoded_size_bytes")]
    pub total_decoded_size: u64,
    /// Mean of the per-file ratios, 0 when nothing succeeded
    pub average_compression_ratio: f64,
    pub total_original_size_mb: f64,
    pub total_decoded_size_mb: f64,
}

impl BatchSummary {
    fn new(images: &[ImageMetadata], total_files: usize) -> Self {
        let successful_files = images.len();
        let total_original_size = images.iter().map(|m| m.original_size).sum::<u64>();
        let total_decoded_size = images.iter().map(|m| m.decoded_size).sum::<u64>();

        let average_compression_ratio = if successful_files == 0 {
            0.0
        } else {
            images.iter().map(|m| m.compression_ratio).sum::<f64>() / successful_files as f64
        };

        Self {
            total_files,
            successful_files,
            failed_files: total_files - successful_files,
            total_original_size,
            total_decoded_size,
            average_compression_ratio,
            total_original_size_mb: total_original_size as f64 / BYTES_PER_MB,
            total_decoded_size_mb: total_decoded_size as f64 / BYTES_PER_MB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every file was analyzed
    Complete,
    /// Some files failed
    Partial,
    /// No file was analyzed
    Failed,
}

/// Outcome of a batch, in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub images: Vec<ImageMetadata>,
    pub summary: BatchSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ProcessError>,
}

impl BatchReport {
    pub fn status(&self) -> BatchStatus {
        let summary = &self.summary;
        if summary.successful_files == 0 {
            BatchStatus::Failed
        } else if summary.failed_files > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Complete
        }
    }
}

/// Analyzes many files on a dedicated worker pool
pub struct BatchProcessor {
    /// Number of worker threads
    concurrency: usize,
    analyzer: Analyzer,
}

impl BatchProcessor {
    pub fn new(concurrency: usize) -> Self {
        let concurrency = if concurrency == 0 {
            num_cpus::get()
        } else {
            concurrency
        };

        tracing::debug!(
            "BatchProcessor initialized with concurrency={}",
            concurrency
        );
        Self {
            concurrency,
            analyzer: Analyzer::new(),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn process(&self, files: &[PathBuf]) -> Result<BatchReport> {
        self.process_with_progress(files, |_, _| {})
    }

    /// Analyze `files`, calling `on_done(path, succeeded)` as each one finishes.
    ///
    /// The callback runs on worker threads in completion order; the report
    /// is always in input order.
    pub fn process_with_progress<F>(&self, files: &[PathBuf], on_done: F) -> Result<BatchReport>
    where
        F: Fn(&Path, bool) + Sync,
    {
        tracing::info!(
            "Starting batch analysis: {} files on {} workers",
            files.len(),
            self.concurrency
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("imgsize-worker-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        let results: Vec<Result<ImageMetadata>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let result = self.analyze_one(path);
                    on_done(path, result.is_ok());
                    result
                })
                .collect()
        });

        let mut images = Vec::with_capacity(files.len());
        let mut errors = Vec::new();
        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(metadata) => images.push(metadata),
                Err(e) => {
                    tracing::debug!("{}: {}", path.display(), e);
                    errors.push(ProcessError {
                        filename: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = BatchSummary::new(&images, files.len());
        tracing::info!(
            "Batch analysis complete: {}/{} succeeded",
            summary.successful_files,
            summary.total_files
        );

        Ok(BatchReport {
            images,
            summary,
            errors,
        })
    }

    fn analyze_one(&self, path: &Path) -> Result<ImageMetadata> {
        let mut metadata = self.analyzer.analyze_path(path)?;
        metadata.filename = Some(path.display().to_string());
        Ok(metadata)
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(0) // Auto-detect CPU count
    }
}
