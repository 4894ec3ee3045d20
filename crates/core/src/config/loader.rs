//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use crate::validation::validate_config;
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path, a discovered file, or defaults.
    ///
    /// The result is validated before it is returned, so a bad output format
    /// fails here rather than halfway through a batch.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.is_file() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        let config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = Self {
            schema: toml::from_str(content)?,
            path: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load with defaults only (no file)
    pub fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Validate the model and output sections
    pub fn validate(&self) -> Result<()> {
        let result = validate_config(&self.schema);
        match &self.path {
            Some(p) => result.context(format!("Validating {}", p.display())),
            None => result,
        }
    }

    /// Directory holding model assets
    pub fn model_dir(&self) -> PathBuf {
        self.resolve(&self.schema.model.path)
    }

    /// Directory receiving encoded files
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.schema.output.path)
    }

    // Relative paths are taken from the directory of the config file.
    fn resolve(&self, value: &str) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(value).as_ref());
        if expanded.is_absolute() {
            return expanded;
        }
        match self.path.as_deref().and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(expanded),
            _ => expanded,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = [".imgtools.toml", "imgtools.toml", ".config/imgtools.toml"];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("imgtools").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {}", path.display(), e))
            .with_source(e)
    })?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.output.path, "output");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/imgtools.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgtools.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
            [model]
            path = "models"
            scale = 3

            [output]
            path = "out"

            [[output.formats]]
            fixed_height = 600
            formats = [{{ ext = "png" }}]
            "#
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.schema.model.scale, Some(3));
        assert_eq!(config.model_dir(), dir.path().join("models"));
        assert_eq!(config.output_dir(), dir.path().join("out"));
    }

    #[test]
    fn test_config_load_rejects_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgtools.toml");
        std::fs::write(
            &path,
            r#"
            [[output.formats]]
            fixed_width = 300
            fixed_size = 200
            formats = [{ ext = "jpg" }]
            "#,
        )
        .unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOutputFormat);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_config_parse_error() {
        let err = Config::from_toml("[model\nname = 1").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_config_unknown_family() {
        let err = Config::from_toml("[model]\nname = \"srgan\"").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }
}
