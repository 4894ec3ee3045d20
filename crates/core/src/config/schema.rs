//! Configuration schema definitions
//!
//! Model selection and output format types shared by the planner and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Super-resolution model families with published model assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    #[default]
    Edsr,
    Espcn,
    Fsrcnn,
    Lapsrn,
}

impl ModelFamily {
    /// Lowercase family name, as found in model file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edsr => "edsr",
            Self::Espcn => "espcn",
            Self::Fsrcnn => "fsrcnn",
            Self::Lapsrn => "lapsrn",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How upscale passes are chosen for an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleSelector {
    /// Compose passes from every available model scale
    Auto,
    /// Repeat a single model scale
    Fixed,
}

/// Super-resolution model configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Directory holding the model assets
    #[serde(default = "default_model_path")]
    pub path: String,

    /// Model family
    #[serde(default)]
    pub name: ModelFamily,

    /// Model scale used by the fixed strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Explicit strategy selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_selector: Option<ScaleSelector>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            name: ModelFamily::default(),
            scale: None,
            scale_selector: None,
        }
    }
}

impl ModelConfig {
    /// Effective strategy: an explicit selector wins, a configured scale implies `Fixed`.
    pub fn selector(&self) -> ScaleSelector {
        match (self.scale_selector, self.scale) {
            (Some(selector), _) => selector,
            (None, Some(_)) => ScaleSelector::Fixed,
            (None, None) => ScaleSelector::Auto,
        }
    }
}

fn default_model_path() -> String {
    "models".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Directory receiving the encoded files
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Requested output formats, in order
    #[serde(default = "default_output_formats")]
    pub formats: Vec<OutputFormatConfig>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            formats: default_output_formats(),
        }
    }
}

fn default_output_path() -> String {
    "output".to_string()
}

fn default_output_formats() -> Vec<OutputFormatConfig> {
    vec![OutputFormatConfig {
        fixed_width: Some(1920),
        formats: vec![
            EncodeConfig {
                quality: Some(95),
                ..EncodeConfig::new("jpg")
            },
            EncodeConfig::new("webp"),
        ],
        ..OutputFormatConfig::default()
    }]
}

/// One requested output size and the encodings written for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormatConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_height: Option<u32>,

    /// Shorthand for `fixed_width = fixed_height = fixed_size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_size: Option<u32>,

    /// Explicit multiplier of the source dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_scale: Option<u32>,

    #[serde(default)]
    pub formats: Vec<EncodeConfig>,
}

impl OutputFormatConfig {
    /// Format bounded by a width only
    pub fn width(width: u32) -> Self {
        Self {
            fixed_width: Some(width),
            ..Self::default()
        }
    }

    /// Format bounded by a height only
    pub fn height(height: u32) -> Self {
        Self {
            fixed_height: Some(height),
            ..Self::default()
        }
    }

    /// Add an encoding
    pub fn with_encoding(mut self, encoding: EncodeConfig) -> Self {
        self.formats.push(encoding);
        self
    }

    /// Explicit width bound, `fixed_size` included
    pub fn bound_width(&self) -> Option<u32> {
        self.fixed_width.or(self.fixed_size)
    }

    /// Explicit height bound, `fixed_size` included
    pub fn bound_height(&self) -> Option<u32> {
        self.fixed_height.or(self.fixed_size)
    }
}

/// Encoded file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl EncodeFormat {
    /// Recognized extensions, lowercase and without the leading dot
    pub const EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg", "jpe", "png", "webp", "gif"];

    /// Resolve an extension such as `jpg` or `.PNG`
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// One encoding of an output format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// File extension, with or without the leading dot
    pub ext: String,

    /// JPEG or WebP quality (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,

    /// JPEG progressive flag (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progressive: Option<u32>,

    /// JPEG optimize flag (0-1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize: Option<u32>,

    /// PNG compression level (0-9)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<u32>,
}

impl EncodeConfig {
    /// Encoding with default codec options
    pub fn new(ext: impl Into<String>) -> Self {
        Self {
            ext: ext.into(),
            quality: None,
            progressive: None,
            optimize: None,
            compression: None,
        }
    }

    /// Codec resolved from the extension
    pub fn format(&self) -> Option<EncodeFormat> {
        EncodeFormat::from_extension(&self.ext)
    }

    /// Extension normalized for output file names
    pub fn extension(&self) -> String {
        self.ext.trim_start_matches('.').to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema() {
        let schema = ConfigSchema::default();
        assert_eq!(schema.model.name, ModelFamily::Edsr);
        assert_eq!(schema.model.selector(), ScaleSelector::Auto);
        assert_eq!(schema.output.formats.len(), 1);
        assert_eq!(schema.output.formats[0].fixed_width, Some(1920));
    }

    #[test]
    fn test_selector_resolution() {
        let mut model = ModelConfig {
            scale: Some(3),
            ..ModelConfig::default()
        };
        assert_eq!(model.selector(), ScaleSelector::Fixed);

        model.scale_selector = Some(ScaleSelector::Auto);
        assert_eq!(model.selector(), ScaleSelector::Auto);
    }

    #[test]
    fn test_parse_toml() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [model]
            path = "assets/models"
            name = "fsrcnn"
            scale_selector = "fixed"

            [output]
            path = "out"

            [[output.formats]]
            fixed_size = 500
            formats = [{ ext = ".PNG", compression = 9 }]

            [[output.formats]]
            fixed_scale = 2
            formats = [{ ext = "jpg", quality = 80, progressive = 1 }]
            "#,
        )
        .unwrap();

        assert_eq!(schema.model.name, ModelFamily::Fsrcnn);
        assert_eq!(schema.model.selector(), ScaleSelector::Fixed);
        assert_eq!(schema.output.formats.len(), 2);

        let first = &schema.output.formats[0];
        assert_eq!(first.bound_width(), Some(500));
        assert_eq!(first.bound_height(), Some(500));
        assert_eq!(first.formats[0].format(), Some(EncodeFormat::Png));
        assert_eq!(first.formats[0].extension(), "png");

        assert_eq!(schema.output.formats[1].fixed_scale, Some(2));
    }

    #[test]
    fn test_encode_format_from_extension() {
        assert_eq!(EncodeFormat::from_extension("JPE"), Some(EncodeFormat::Jpeg));
        assert_eq!(EncodeFormat::from_extension(".webp"), Some(EncodeFormat::WebP));
        assert_eq!(EncodeFormat::from_extension("tiff"), None);
    }
}
