//! Configuration loading from environment variables and `.env` files.
//!
//! Both programs read the gateway host from `PUSHGATEWAYHOST`. The `.env`
//! file is mandatory: failing to load it is a fatal configuration error.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Host of the push target.
pub const GATEWAY_HOST_VAR: &str = "PUSHGATEWAYHOST";
pub const JOB_VAR: &str = "PUSHGATE_JOB";
pub const MAX_DELAY_VAR: &str = "PUSHGATE_MAX_DELAY_MS";
pub const RECORDS_VAR: &str = "PUSHGATE_RECORDS";
pub const FAILURE_RATE_VAR: &str = "PUSHGATE_FAILURE_RATE";
pub const SERVICE_JOB_VAR: &str = "PUSHGATE_SERVICE_JOB";
pub const LISTEN_VAR: &str = "PUSHGATE_LISTEN";
pub const STARTUP_PUSH_VAR: &str = "PUSHGATE_STARTUP_PUSH";

/// Load environment variables from the nearest `.env` file.
///
/// Returns the path of the file that was loaded.
pub fn load_dotenv() -> Result<PathBuf, ConfigError> {
    dotenvy::dotenv().map_err(ConfigError::EnvFile)
}

/// Load environment variables from an explicit file.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let path = path.as_ref();
    dotenvy::from_path(path).map_err(ConfigError::EnvFile)?;
    Ok(path.to_path_buf())
}

/// Get a required environment variable.
///
/// An empty value counts as missing.
pub fn get_env(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

/// Get an optional environment variable with a default value.
pub fn get_env_or(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable.
pub fn get_env_parsed<T: FromStr>(key: &str) -> Result<T, ConfigError> {
    let value = get_env(key)?;
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value,
    })
}

/// Get and parse an environment variable, falling back to `default` when unset.
///
/// Unlike a silent fallback, a value that is present but unparsable is an error.
pub fn get_env_parsed_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match get_env_parsed(key) {
        Err(ConfigError::Missing(_)) => Ok(default),
        other => other,
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `.env` file could not be read or parsed.
    #[error("Error loading .env file: {0}")]
    EnvFile(#[source] dotenvy::Error),
    /// Environment variable is not set.
    #[error("Missing required environment variable '{0}'")]
    Missing(String),
    /// Environment variable value is invalid.
    #[error(
        "Invalid value '{value}' for environment variable '{key}' (failed to parse as expected type)"
    )]
    Invalid { key: String, value: String },
}

/// Where pushes go.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub host: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: get_env(GATEWAY_HOST_VAR)?,
        })
    }
}

/// Settings for a single backup job run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub gateway: GatewayConfig,
    /// Logical job name, also used as the metric prefix.
    pub job: String,
    pub max_delay: Duration,
    pub records: u64,
    pub failure_rate: f64,
}

impl JobConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            gateway: GatewayConfig::from_env()?,
            job: get_env_or(JOB_VAR, "db_backup"),
            max_delay: Duration::from_millis(get_env_parsed_or(MAX_DELAY_VAR, 1000)?),
            records: get_env_parsed_or(RECORDS_VAR, 42)?,
            failure_rate: get_env_parsed_or(FAILURE_RATE_VAR, 0.0)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that `failure_rate` is a probability in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ConfigError::Invalid {
                key: FAILURE_RATE_VAR.to_string(),
                value: self.failure_rate.to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for the timing web service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub gateway: GatewayConfig,
    pub job: String,
    pub listen: String,
    /// Push the duration gauge once when the service is built.
    pub startup_push: bool,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            gateway: GatewayConfig::from_env()?,
            job: get_env_or(SERVICE_JOB_VAR, "request_timing"),
            listen: get_env_or(LISTEN_VAR, "127.0.0.1:3000"),
            startup_push: get_env_parsed_or(STARTUP_PUSH_VAR, true)?,
        })
    }
}
