//! Per-image execution of upscale plans.
//!
//! A [`Pipeline`] decodes an image, plans its passes, runs them through an
//! [`Upscaler`] and writes every output format as soon as the running image is
//! large enough for it. Each output is downscaled from the current image, never
//! from a previous output.

use crate::demand::{DemandTable, ImageSize, SizeBounds};
use crate::encode::write_encoded;
use crate::error::{ImageError, Result};
use crate::planner::AutoPlan;
use crate::resize::downscale_to_bounds;
use crate::strategy::{compute_plan, ScaleStrategy, UpscalePlan};
use crate::upscale::Upscaler;
use image::DynamicImage;
use imgtools_core::config::OutputFormatConfig;
use imgtools_core::validation::validate_output_formats;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Most passes the fixed strategy runs for one image.
///
/// Each pass multiplies the pixel count by the square of the model scale.
/// Demands above this bound fail the image with
/// [`ImageError::CombinationExhausted`], as the automatic strategy does past
/// its step bound.
pub const MAX_FIXED_PASSES: u32 = 10;

/// Validated settings shared by every image of a batch.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    formats: Vec<OutputFormatConfig>,
    output_dir: PathBuf,
    strategy: ScaleStrategy,
}

impl PipelineConfig {
    /// Validate formats, strategy and output directory.
    pub fn new(
        formats: Vec<OutputFormatConfig>,
        output_dir: impl Into<PathBuf>,
        strategy: ScaleStrategy,
    ) -> Result<Self> {
        let validation = validate_output_formats(&formats);
        if !validation.is_valid() {
            let messages: Vec<String> = validation.errors().iter().map(ToString::to_string).collect();
            return Err(ImageError::InvalidOutputFormat(messages.join("; ")));
        }

        match &strategy {
            ScaleStrategy::Fixed(scale) if *scale < 2 => {
                return Err(ImageError::InvalidScale(format!(
                    "fixed model scale must be at least 2, got {scale}"
                )));
            }
            ScaleStrategy::Auto(scales) if scales.is_empty() => {
                return Err(ImageError::InvalidScale("no model scale available".to_string()));
            }
            _ => {}
        }

        let output_dir = output_dir.into();
        if !output_dir.is_dir() {
            return Err(ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output directory not found: {}", output_dir.display()),
            )));
        }

        Ok(Self {
            formats,
            output_dir,
            strategy,
        })
    }

    /// Output formats, in configuration order.
    pub fn formats(&self) -> &[OutputFormatConfig] {
        &self.formats
    }

    /// Directory receiving the encoded files.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Upscale strategy.
    pub fn strategy(&self) -> &ScaleStrategy {
        &self.strategy
    }

    /// Plan the passes for an image of `size`.
    pub fn plan(&self, size: ImageSize) -> Result<UpscalePlan> {
        compute_plan(size, &self.formats, &self.strategy)
    }

    fn write_format(
        &self,
        image: &DynamicImage,
        source: ImageSize,
        key: usize,
        report: &mut ImageReport,
    ) {
        let format = &self.formats[key];
        let resized = downscale_to_bounds(image, SizeBounds::for_format(format, source));

        for encoding in &format.formats {
            match write_encoded(&resized, &self.output_dir, &report.name, encoding) {
                Ok(path) => {
                    debug!(path = %path.display(), "wrote output");
                    report.written.push(path);
                }
                Err(err) => {
                    warn!(image = %report.name, format = key, ext = %encoding.ext, error = %err, "encode failed");
                    report.failures.push(EncodeFailure {
                        format: key,
                        ext: encoding.extension(),
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}

/// An encoding that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeFailure {
    /// Output format index
    pub format: usize,
    /// Extension of the failed encoding
    pub ext: String,
    /// Error message
    pub error: String,
}

/// Outcome of one processed image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    /// Source file stem, used in output names
    pub name: String,
    /// Source dimensions
    pub size: ImageSize,
    /// Upscale passes executed
    pub passes: u32,
    /// Files written
    pub written: Vec<PathBuf>,
    /// Encodings that failed
    pub failures: Vec<EncodeFailure>,
}

impl ImageReport {
    fn new(name: &str, size: ImageSize) -> Self {
        Self {
            name: name.to_string(),
            size,
            passes: 0,
            written: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Every encoding was written.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs upscale plans with one [`Upscaler`].
pub struct Pipeline<'a, U> {
    config: &'a PipelineConfig,
    upscaler: U,
}

impl<'a, U: Upscaler> Pipeline<'a, U> {
    /// Pipeline over shared settings.
    pub fn new(config: &'a PipelineConfig, upscaler: U) -> Self {
        Self { config, upscaler }
    }

    /// Decode and process a source file.
    pub fn process_file(&mut self, path: &Path) -> Result<ImageReport> {
        let image = image::open(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.process_image(&name, image)
    }

    /// Process a decoded image, writing outputs named after `name`.
    pub fn process_image(&mut self, name: &str, image: DynamicImage) -> Result<ImageReport> {
        let size = ImageSize::new(image.height(), image.width())?;
        let plan = self.config.plan(size)?;
        let mut report = ImageReport::new(name, size);

        match &plan {
            UpscalePlan::Fixed { model_scale, table } => {
                self.run_fixed(image, *model_scale, table, &mut report)?;
            }
            UpscalePlan::Auto(auto) => self.run_auto(image, auto, &mut report)?,
        }

        info!(
            image = name,
            width = size.width,
            height = size.height,
            passes = report.passes,
            written = report.written.len(),
            failed = report.failures.len(),
            "processed image"
        );
        Ok(report)
    }

    fn run_fixed(
        &mut self,
        image: DynamicImage,
        model_scale: u32,
        table: &DemandTable,
        report: &mut ImageReport,
    ) -> Result<()> {
        if table.max_upscale > MAX_FIXED_PASSES {
            return Err(ImageError::CombinationExhausted(format!(
                "{} passes of x{} needed, at most {} allowed",
                table.max_upscale, model_scale, MAX_FIXED_PASSES
            )));
        }

        let mut current = image;
        for demand in &table.stats {
            while report.passes < demand.nb_upscale {
                current = self.upscaler.upscale(&current, model_scale)?;
                report.passes += 1;
            }
            self.config.write_format(&current, report.size, demand.key, report);
        }
        Ok(())
    }

    fn run_auto(
        &mut self,
        image: DynamicImage,
        plan: &AutoPlan,
        report: &mut ImageReport,
    ) -> Result<()> {
        if let ScaleStrategy::Auto(available) = &self.config.strategy {
            if let Some(entry) = plan
                .entries
                .iter()
                .find(|e| e.nb_upscale > 0 && !available.contains(e.scale))
            {
                return Err(ImageError::InvalidScale(format!(
                    "planned scale {} is not available",
                    entry.scale
                )));
            }
        }

        let mut current = image;
        for entry in &plan.entries {
            if entry.nb_upscale > 0 {
                current = self.upscaler.upscale(&current, entry.scale)?;
                report.passes += 1;
            }
            if let Some(key) = entry.key {
                self.config.write_format(&current, report.size, key, report);
            }
        }
        Ok(())
    }
}
