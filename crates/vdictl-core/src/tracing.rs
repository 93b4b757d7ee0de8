//! Tracing setup for vdictl.
//!
//! The library crates only emit events through the `tracing` macros; binaries
//! (and embedding applications) decide where they go by calling
//! [`init_tracing`] once at start-up.
//!
//! ```ignore
//! use vdictl_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::from_verbosity(2)).expect("failed to initialize tracing");
//! ```

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Compact single-line format (default, written to stderr)
    #[default]
    Compact,
    /// Human-readable multi-line format
    Pretty,
    /// JSON lines, for log shippers
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The level used for the `vdictl` crates when RUST_LOG is not set
    pub default_level: Level,
    /// Output format for log messages
    pub output_format: TracingOutputFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
    /// Whether to include target (module path) in logs
    pub include_target: bool,
    /// Custom env filter directive (overrides default_level and RUST_LOG)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            output_format: TracingOutputFormat::Compact,
            include_location: false,
            include_target: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Maps a `-v` repetition count onto a level.
    ///
    /// 0 = WARN, 1 = INFO, 2 = DEBUG, 3 and above = TRACE.
    #[must_use]
    pub fn from_verbosity(verbose: u8) -> Self {
        let level = match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            include_location: level == Level::TRACE,
            include_target: level >= Level::DEBUG,
            ..Self::default().with_level(level)
        }
    }

    /// Set the default log level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set a custom env filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Builds the stderr formatting layer for the configured output format.
    fn output_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(self.include_target);

        match self.output_format {
            TracingOutputFormat::Compact => layer.compact().boxed(),
            TracingOutputFormat::Pretty => layer.pretty().boxed(),
            TracingOutputFormat::Json => layer.json().boxed(),
        }
    }

    fn build_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(ref filter) = self.env_filter {
            return Ok(EnvFilter::try_new(filter)?);
        }
        Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("vdictl={}", self.default_level))))
    }
}

/// Initialize tracing with the given configuration.
///
/// Logs always go to stderr so that stdout stays reserved for command output.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.output_layer())
        .with(config.build_filter()?);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(!config.include_location);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(TracingConfig::from_verbosity(0).default_level, Level::WARN);
        assert_eq!(TracingConfig::from_verbosity(1).default_level, Level::INFO);
        assert_eq!(TracingConfig::from_verbosity(2).default_level, Level::DEBUG);
        assert_eq!(TracingConfig::from_verbosity(3).default_level, Level::TRACE);
        assert_eq!(TracingConfig::from_verbosity(9).default_level, Level::TRACE);
        assert!(TracingConfig::from_verbosity(3).include_location);
        assert!(!TracingConfig::from_verbosity(1).include_target);
    }

    #[test]
    fn test_builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::INFO)
            .with_format(TracingOutputFormat::Json)
            .with_env_filter("vdictl=trace");

        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.env_filter, Some("vdictl=trace".to_string()));
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = TracingConfig::default().with_env_filter("vdictl=notalevel");
        assert!(matches!(config.build_filter(), Err(TracingError::EnvFilter(_))));
    }

    #[test]
    fn test_every_format_builds_a_layer() {
        for format in [
            TracingOutputFormat::Compact,
            TracingOutputFormat::Pretty,
            TracingOutputFormat::Json,
        ] {
            let config = TracingConfig::from_verbosity(3).with_format(format);
            let subscriber = tracing_subscriber::Registry::default().with(config.output_layer());
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(format = ?format, "layer installed");
            });
        }
    }
}
