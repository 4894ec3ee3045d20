//! Logging setup
//!
//! Installs a `tracing` subscriber writing compact lines to stderr. The
//! level comes from `RUST_LOG` when set, otherwise from [`LogConfig`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Show the event target (module path)
    pub show_target: bool,
    /// Show thread ids, useful with parallel batches
    pub show_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
            show_thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Defaults, switched to `debug` with targets and thread ids when verbose.
    pub fn from_verbosity(verbose: bool) -> Self {
        if verbose {
            Self {
                level: "debug".to_string(),
                show_target: true,
                show_thread_ids: true,
            }
        } else {
            Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Install the global subscriber for the given verbosity.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    init_with_config(&LogConfig::from_verbosity(verbose))
}

/// Install the global subscriber.
pub fn init_with_config(config: &LogConfig) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::registry().with(config.filter()).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .compact(),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.show_target);
    }

    #[test]
    fn test_verbose_level() {
        let config = LogConfig::from_verbosity(true);
        assert_eq!(config.level, "debug");
        assert!(config.show_thread_ids);
    }

    #[test]
    fn test_init_twice_fails() {
        let config = LogConfig {
            level: "warn".to_string(),
            ..LogConfig::default()
        };
        assert!(init_with_config(&config).is_ok());
        assert!(init_with_config(&config).is_err());
    }
}
