use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Selects the log output format.
pub const LOG_FORMAT_VAR: &str = "PUSHGATE_LOG_FORMAT";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "full" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("unknown log format '{0}' (expected pretty, compact or json)")]
    UnknownFormat(String),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Configuration for the tracing/logging system.
///
/// `RUST_LOG` takes precedence over [`TracingConfig::level`] when set.
///
/// # Examples
///
/// ```ignore
/// use pushgate::observability::TracingConfig;
///
/// TracingConfig::from_env()?.init()?;
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: LogFormat,
    /// The minimum log level.
    pub level: Level,
    /// Include the target (module path) in logs.
    pub with_target: bool,
    /// Colorize output. Ignored for JSON.
    pub ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: Level::INFO,
            with_target: false,
            ansi: true,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the format from `PUSHGATE_LOG_FORMAT`, keeping defaults otherwise.
    pub fn from_env() -> Result<Self, TracingError> {
        let format = match std::env::var(LOG_FORMAT_VAR) {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => LogFormat::default(),
        };
        Ok(Self::new().format(format))
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Shorthand for `format(LogFormat::Json)`.
    pub fn json(self) -> Self {
        self.format(LogFormat::Json)
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }

    /// Installs the global subscriber.
    pub fn init(self) -> Result<(), TracingError> {
        let builder = fmt()
            .with_env_filter(self.filter())
            .with_target(self.with_target);

        let installed = match self.format {
            LogFormat::Pretty => builder.with_ansi(self.ansi).try_init(),
            LogFormat::Compact => builder.with_ansi(self.ansi).compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };

        installed.map_err(|_| TracingError::AlreadyInstalled)
    }
}
