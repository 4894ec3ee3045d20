//! Scale planning and image conversion for imgtools.
//!
//! This crate provides:
//! - Size demand analysis of output formats against a source image
//! - Shortest integer compositions over the available model scales
//! - Scale combination planning for the automatic upscale strategy
//! - Plan execution: upscale, downscale to bounds, encode (`processing` feature)
//! - Batch processing across a rayon pool (`parallel` feature)
//!
//! Planning is pure: [`compute_plan`] and [`count_discrete_upscales_for`]
//! never read an image.
//!
//! # Example
//! ```
//! use imgtools_image::{compute_plan, AvailableScales, ImageSize, ScaleStrategy, UpscalePlan};
//! use imgtools_core::config::OutputFormatConfig;
//!
//! let formats = vec![OutputFormatConfig::width(1900), OutputFormatConfig::width(200)];
//! let strategy = ScaleStrategy::Auto(AvailableScales::new([2, 3, 4]).unwrap());
//!
//! let plan = compute_plan(ImageSize::new(200, 400).unwrap(), &formats, &strategy).unwrap();
//! let UpscalePlan::Auto(auto) = plan else { unreachable!() };
//! assert_eq!(auto.max_x_scale, 5);
//! assert_eq!(auto.used_scales.iter().sum::<u32>(), 5);
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod combination;
pub mod demand;
mod error;
pub mod planner;
pub mod strategy;

#[cfg(feature = "processing")]
pub mod batch;

#[cfg(feature = "processing")]
pub mod encode;

#[cfg(feature = "processing")]
pub mod pipeline;

#[cfg(feature = "processing")]
mod resize;

#[cfg(feature = "processing")]
pub mod upscale;

pub use catalog::{AvailableScales, ModelCatalog};
pub use combination::{all_minimal_compositions, shortest_composition, MAX_COMPOSITION_TOTAL};
pub use demand::{
    count_discrete_upscales, demand_table, needs_enlargement, required_multiplier, scale_demand,
    DemandTable, ImageSize, SizeBounds, UpscaleDemand,
};
pub use error::{ImageError, Result};
pub use planner::{
    annotate_demand_table, best_combinations, evaluate_combination, plan_for_demand,
    select_best_combination, AutoPlan, PlanEntry, PlanStep, PlanSummary,
};
pub use strategy::{compute_plan, count_discrete_upscales_for, ScaleStrategy, UpscalePlan};

#[cfg(feature = "processing")]
pub use batch::{process_batch, BatchReport, FileOutcome};

#[cfg(feature = "processing")]
pub use pipeline::{ImageReport, Pipeline, PipelineConfig};

#[cfg(feature = "processing")]
pub use resize::{downscale_to_bounds, fit_dimensions, output_file_name};

#[cfg(feature = "processing")]
pub use upscale::{ResampleUpscaler, Upscaler};
