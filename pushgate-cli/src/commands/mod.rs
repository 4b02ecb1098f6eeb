//! CLI command implementations.

pub mod backup;
pub mod serve;

use colored::Colorize;
use pushgate::config;
use pushgate::observability::TracingConfig;

/// Loads the `.env` file and installs logging. Both are required to proceed.
pub fn bootstrap(env_file: Option<&str>) -> Result<(), String> {
    let loaded = match env_file {
        Some(path) => config::load_dotenv_from(path),
        None => config::load_dotenv(),
    }
    .map_err(|e| e.to_string())?;

    TracingConfig::from_env()
        .map_err(|e| e.to_string())?
        .init()
        .map_err(|e| e.to_string())?;

    println!(
        "  {} Loaded {}",
        "✓".green(),
        loaded.display().to_string().cyan()
    );
    Ok(())
}
