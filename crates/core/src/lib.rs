//! Core utilities for the imgtools image pipeline
//!
//! This crate provides the functionality shared by the planner and the CLI:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based model and output format configuration
//! - **Validation**: Fail-fast checks of output formats and codec options
//! - **File scanning**: Source image discovery with filtering
//!
//! # Example
//!
//! ```rust,no_run
//! use imgtools_core::{config::Config, file_scanner::collect_images};
//! use std::path::Path;
//!
//! let config = Config::load(None)?;
//! let images = collect_images(Path::new("photos"))?;
//! println!("{} images, {} output formats", images.len(), config.schema.output.formats.len());
//! # Ok::<(), imgtools_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod file_scanner;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, EncodeConfig, ModelConfig, OutputFormatConfig, ScaleSelector};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::file_scanner::{collect_images, FileScanner};
    pub use crate::validation::{ValidationResult, Validator};
}
