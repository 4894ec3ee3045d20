//! Batch processing with optional parallelism.
//!
//! Every file is processed independently: a failure is recorded in the
//! file's outcome and never cancels the rest of the batch. With the
//! `parallel` feature each rayon worker owns its own upscaler.

use crate::pipeline::{ImageReport, Pipeline, PipelineConfig};
use crate::upscale::Upscaler;
use imgtools_core::ErrorCode;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

/// Error of a file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    /// Error code
    pub code: ErrorCode,
    /// Error message
    pub message: String,
}

/// Result of one file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// Source file
    pub path: PathBuf,
    /// Report, when the image could be planned and processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ImageReport>,
    /// Error that aborted the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

impl FileOutcome {
    /// Processed with every encoding written.
    pub fn is_success(&self) -> bool {
        self.report.as_ref().is_some_and(ImageReport::is_success)
    }
}

/// Outcomes of a whole batch, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Per-file outcomes
    pub outcomes: Vec<FileOutcome>,
    /// Wall-clock duration
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl BatchReport {
    /// Files fully processed.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Files with an error or a failed encoding.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Every file succeeded.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Total files written.
    pub fn files_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.report.as_ref())
            .map(|r| r.written.len())
            .sum()
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Process `files`, building one upscaler per worker with `make_upscaler`.
///
/// `on_complete` runs once per file as soon as it is done, in completion order.
///
/// # Example
/// ```no_run
/// use imgtools_image::{process_batch, AvailableScales, PipelineConfig, ResampleUpscaler, ScaleStrategy};
/// use imgtools_core::config::{EncodeConfig, OutputFormatConfig};
/// use std::path::PathBuf;
///
/// let scales = AvailableScales::new([2, 4]).unwrap();
/// let formats = vec![OutputFormatConfig::width(1920).with_encoding(EncodeConfig::new("jpg"))];
/// let config = PipelineConfig::new(formats, "output", ScaleStrategy::Auto(scales.clone())).unwrap();
///
/// let files = vec![PathBuf::from("photos/a.jpg")];
/// let report = process_batch(&config, &files, || ResampleUpscaler::new(scales.clone()), &|_| {});
/// println!("{} of {} succeeded", report.succeeded(), report.outcomes.len());
/// ```
pub fn process_batch<F, U>(
    config: &PipelineConfig,
    files: &[PathBuf],
    make_upscaler: F,
    on_complete: &(dyn Fn(&FileOutcome) + Sync),
) -> BatchReport
where
    F: Fn() -> U + Sync + Send,
    U: Upscaler,
{
    let start = Instant::now();

    #[cfg(feature = "parallel")]
    let outcomes = {
        use rayon::prelude::*;
        files
            .par_iter()
            .map_init(
                || Pipeline::new(config, make_upscaler()),
                |pipeline, path| process_single_file(pipeline, path, on_complete),
            )
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes = {
        let mut pipeline = Pipeline::new(config, make_upscaler());
        files
            .iter()
            .map(|path| process_single_file(&mut pipeline, path, on_complete))
            .collect()
    };

    BatchReport {
        outcomes,
        elapsed: start.elapsed(),
    }
}

fn process_single_file<U: Upscaler>(
    pipeline: &mut Pipeline<'_, U>,
    path: &Path,
    on_complete: &(dyn Fn(&FileOutcome) + Sync),
) -> FileOutcome {
    let outcome = match pipeline.process_file(path) {
        Ok(report) => FileOutcome {
            path: path.to_path_buf(),
            report: Some(report),
            error: None,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "image failed");
            FileOutcome {
                path: path.to_path_buf(),
                report: None,
                error: Some(FileError {
                    code: err.code(),
                    message: err.to_string(),
                }),
            }
        }
    };
    on_complete(&outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AvailableScales;
    use crate::strategy::ScaleStrategy;
    use crate::upscale::ResampleUpscaler;
    use image::{DynamicImage, RgbImage};
    use imgtools_core::config::{EncodeConfig, OutputFormatConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_batch_records_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let mut files = Vec::new();
        for (name, width) in [("a", 8), ("b", 12), ("c", 6)] {
            let path = dir.path().join(format!("{name}.png"));
            DynamicImage::ImageRgb8(RgbImage::new(width, 4)).save(&path).unwrap();
            files.push(path);
        }
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();
        files.insert(1, broken.clone());

        let scales = AvailableScales::new([2, 3]).unwrap();
        let formats = vec![OutputFormatConfig::width(24).with_encoding(EncodeConfig::new("png"))];
        let config = PipelineConfig::new(formats, &out, ScaleStrategy::Auto(scales.clone())).unwrap();

        let completed = AtomicUsize::new(0);
        let report = process_batch(
            &config,
            &files,
            || ResampleUpscaler::new(scales.clone()),
            &|_| {
                completed.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(completed.load(Ordering::SeqCst), 4);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.files_written(), 3);

        let failed = &report.outcomes[1];
        assert_eq!(failed.path, broken);
        assert_eq!(failed.error.as_ref().unwrap().code, ErrorCode::ProcessingError);

        for name in ["a_24x12.png", "b_24x8.png", "c_24x16.png"] {
            assert!(out.join(name).exists(), "{name}");
        }
    }

    #[test]
    fn test_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let formats = vec![OutputFormatConfig::width(24).with_encoding(EncodeConfig::new("png"))];
        let config = PipelineConfig::new(formats, dir.path(), ScaleStrategy::Fixed(2)).unwrap();
        let scales = AvailableScales::new([2]).unwrap();

        let report = process_batch(&config, &[], || ResampleUpscaler::new(scales.clone()), &|_| {});
        assert!(report.outcomes.is_empty());
        assert!(report.is_success());
    }
}
