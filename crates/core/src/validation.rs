//! Configuration and input validation
//!
//! Provides validation for:
//! - Output format size options and their exclusivity
//! - Codec options per encoding
//! - Model configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use imgtools_core::validation::validate_output_formats;
//!
//! let result = validate_output_formats(&config.output.formats);
//! if !result.is_valid() {
//!     for error in result.errors() {
//!         eprintln!("Validation error: {}", error);
//!     }
//! }
//! ```

use crate::config::{ConfigSchema, EncodeConfig, EncodeFormat, ModelConfig, OutputFormatConfig};
use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusive range accepted for `fixed_scale`
pub const FIXED_SCALE_RANGE: (u32, u32) = (2, 10);

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        self.to_result_with(ErrorCode::ValidationError)
    }

    /// Convert to Result type, failing with the given code
    pub fn to_result_with(self, code: ErrorCode) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                code,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be one of: {}", allowed.join(", ")),
                code: "ONE_OF".to_string(),
                expected: Some(allowed.join(", ")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {} and {}", min, max),
                code: "RANGE".to_string(),
                expected: Some(format!("{} - {}", min, max)),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate an optional numeric range, skipping absent values
    pub fn optional_range<T: PartialOrd + std::fmt::Display>(
        self,
        field: &str,
        value: Option<T>,
        min: T,
        max: T,
    ) -> Self {
        match value {
            Some(value) => self.range(field, value, min, max),
            None => self,
        }
    }

    /// Validate that a path is a directory
    pub fn is_directory(mut self, field: &str, path: &Path) -> Self {
        if !path.is_dir() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Not a directory: {}", path.display()),
                code: "NOT_A_DIRECTORY".to_string(),
                expected: Some("directory".to_string()),
                actual: Some(if path.is_file() {
                    "file".to_string()
                } else {
                    "not found".to_string()
                }),
            });
        }
        self
    }

    /// Add a custom validation
    pub fn custom<F>(mut self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message,
                code: "CUSTOM".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Validate the size options of one output format and all of its encodings
pub fn validate_output_format(index: usize, format: &OutputFormatConfig) -> ValidationResult {
    let field = format!("output.formats[{}]", index);
    let has_dimensions = format.fixed_width.is_some() || format.fixed_height.is_some();

    let mut result = Validator::new()
        .optional_range(&format!("{field}.fixed_width"), format.fixed_width, 1, u32::MAX)
        .optional_range(&format!("{field}.fixed_height"), format.fixed_height, 1, u32::MAX)
        .optional_range(&format!("{field}.fixed_size"), format.fixed_size, 1, u32::MAX)
        .optional_range(
            &format!("{field}.fixed_scale"),
            format.fixed_scale,
            FIXED_SCALE_RANGE.0,
            FIXED_SCALE_RANGE.1,
        )
        .custom(&field, || {
            (has_dimensions && (format.fixed_size.is_some() || format.fixed_scale.is_some()))
                .then(|| "fixed_width and/or fixed_height can't be mixed with fixed_size or fixed_scale".to_string())
        })
        .custom(&field, || {
            (format.fixed_size.is_some() && format.fixed_scale.is_some())
                .then(|| "fixed_size can't be mixed with fixed_scale".to_string())
        })
        .custom(&format!("{field}.formats"), || {
            format
                .formats
                .is_empty()
                .then(|| "At least one encoding is required".to_string())
        })
        .validate();

    for (position, encoding) in format.formats.iter().enumerate() {
        result.merge(validate_encoding(&format!("{field}.formats[{position}]"), encoding));
    }

    result
}

/// Validate the codec options of a single encoding
pub fn validate_encoding(field: &str, encoding: &EncodeConfig) -> ValidationResult {
    let ext = encoding.extension();
    let validator = Validator::new().one_of(&format!("{field}.ext"), &ext, EncodeFormat::EXTENSIONS);

    let Some(format) = encoding.format() else {
        return validator.validate();
    };

    let validator = match format {
        EncodeFormat::Jpeg => validator
            .optional_range(&format!("{field}.quality"), encoding.quality, 0, 100)
            .optional_range(&format!("{field}.progressive"), encoding.progressive, 0, 1)
            .optional_range(&format!("{field}.optimize"), encoding.optimize, 0, 1)
            .warn_if(
                &format!("{field}.compression"),
                encoding.compression.is_some(),
                "compression is ignored for jpeg",
            ),
        EncodeFormat::WebP => validator
            .optional_range(&format!("{field}.quality"), encoding.quality, 0, 100)
            .warn_if(
                &format!("{field}.quality"),
                encoding.quality.is_some(),
                "webp output is lossless, quality is ignored",
            ),
        EncodeFormat::Png => validator
            .optional_range(&format!("{field}.compression"), encoding.compression, 0, 9)
            .warn_if(
                &format!("{field}.quality"),
                encoding.quality.is_some(),
                "quality is ignored for png",
            ),
        EncodeFormat::Gif => validator.warn_if(
            field,
            encoding.quality.is_some() || encoding.compression.is_some(),
            "gif takes no codec options",
        ),
    };

    validator.validate()
}

/// Validate every output format, in order
pub fn validate_output_formats(formats: &[OutputFormatConfig]) -> ValidationResult {
    let mut result = Validator::new()
        .custom("output.formats", || {
            formats
                .is_empty()
                .then(|| "At least one output format is required".to_string())
        })
        .validate();

    for (index, format) in formats.iter().enumerate() {
        result.merge(validate_output_format(index, format));
    }

    result
}

/// Validate the model section
pub fn validate_model(model: &ModelConfig) -> ValidationResult {
    Validator::new()
        .required("model.path", &model.path)
        .optional_range("model.scale", model.scale, 2, 9)
        .validate()
}

/// Validate a full configuration, failing with the code of the first faulty section
pub fn validate_config(config: &ConfigSchema) -> Result<()> {
    validate_model(&config.model).to_result_with(ErrorCode::InvalidModelConfig)?;
    validate_output_formats(&config.output.formats).to_result_with(ErrorCode::InvalidOutputFormat)
}
