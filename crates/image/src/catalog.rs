//! Model catalog discovery.
//!
//! Super-resolution models are single `.pb` files named after their family
//! and scale, e.g. `EDSR_x4.pb`. The scale is the last character of the stem.

use crate::error::{ImageError, Result};
use crate::strategy::ScaleStrategy;
use imgtools_core::config::{ModelConfig, ModelFamily, ScaleSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of model files.
pub const MODEL_EXTENSION: &str = "pb";

/// Sorted, deduplicated model scales (each at least 2).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailableScales(Vec<u32>);

impl AvailableScales {
    /// Collect scales, rejecting factors below 2.
    pub fn new(scales: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut scales: Vec<u32> = scales.into_iter().collect();
        if let Some(bad) = scales.iter().find(|&&s| s < 2) {
            return Err(ImageError::InvalidScale(format!(
                "model scales must be at least 2, got {bad}"
            )));
        }
        scales.sort_unstable();
        scales.dedup();
        Ok(Self(scales))
    }

    /// Scales in ascending order.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Whether `scale` is available.
    pub fn contains(&self, scale: u32) -> bool {
        self.0.binary_search(&scale).is_ok()
    }

    /// Smallest scale.
    pub fn smallest(&self) -> Option<u32> {
        self.0.first().copied()
    }

    /// No scale at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Model files of one family, by scale.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    family: ModelFamily,
    models: BTreeMap<u32, PathBuf>,
}

impl ModelCatalog {
    /// List the models of `family` found directly in `dir`.
    pub fn discover(dir: &Path, family: ModelFamily) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ImageError::ModelError(format!(
                "model directory not found: {}",
                dir.display()
            )));
        }

        let mut models = BTreeMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(scale) = model_scale(&path, family) {
                debug!(family = %family, scale, path = %path.display(), "found model");
                models.entry(scale).or_insert(path);
            }
        }

        Ok(Self { family, models })
    }

    /// Family the catalog was built for.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Scales with a model file.
    pub fn available_scales(&self) -> AvailableScales {
        AvailableScales(self.models.keys().copied().collect())
    }

    /// Model file for `scale`.
    pub fn model_path(&self, scale: u32) -> Option<&Path> {
        self.models.get(&scale).map(PathBuf::as_path)
    }

    /// Strategy described by the model configuration.
    ///
    /// The fixed strategy uses the configured scale, or the smallest available
    /// one when none is set.
    pub fn resolve_strategy(&self, config: &ModelConfig) -> Result<ScaleStrategy> {
        let available = self.available_scales();
        if available.is_empty() {
            return Err(ImageError::ModelError(format!(
                "no {} model found",
                self.family
            )));
        }

        match config.selector() {
            ScaleSelector::Auto => Ok(ScaleStrategy::Auto(available)),
            ScaleSelector::Fixed => {
                let scale = match config.scale {
                    Some(scale) => scale,
                    None => available.smallest().unwrap_or_default(),
                };
                if !available.contains(scale) {
                    return Err(ImageError::InvalidScale(format!(
                        "no {} model for scale {} (available: {:?})",
                        self.family,
                        scale,
                        available.as_slice()
                    )));
                }
                Ok(ScaleStrategy::Fixed(scale))
            }
        }
    }
}

// `EDSR_x4.pb` -> 4 for the edsr family.
fn model_scale(path: &Path, family: ModelFamily) -> Option<u32> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case(MODEL_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if !stem.to_ascii_lowercase().contains(family.as_str()) {
        return None;
    }
    stem.chars()
        .last()?
        .to_digit(10)
        .filter(|&scale| scale >= 2)
}
