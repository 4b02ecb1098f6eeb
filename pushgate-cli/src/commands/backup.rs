//! Implementation of the `pushgate backup` command.

use std::time::Duration;

use colored::Colorize;
use pushgate::config::JobConfig;
use pushgate::job::{JobReporter, SimulatedBackup};
use pushgate::metrics::JobMetrics;
use pushgate::push::Pusher;

/// Flags that override the environment.
#[derive(Debug, Default)]
pub struct BackupOverrides {
    pub job: Option<String>,
    pub records: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub failure_rate: Option<f64>,
}

impl BackupOverrides {
    fn apply(self, config: &mut JobConfig) {
        if let Some(job) = self.job {
            config.job = job;
        }
        if let Some(records) = self.records {
            config.records = records;
        }
        if let Some(ms) = self.max_delay_ms {
            config.max_delay = Duration::from_millis(ms);
        }
        if let Some(rate) = self.failure_rate {
            config.failure_rate = rate;
        }
    }
}

/// Runs the simulated backup once and pushes its metrics.
///
/// Only configuration problems are errors. A failed backup or a failed push
/// is reported and the command still succeeds.
pub async fn execute(overrides: BackupOverrides) -> Result<(), String> {
    let mut config = JobConfig::from_env().map_err(|e| e.to_string())?;
    overrides.apply(&mut config);
    config.validate().map_err(|e| e.to_string())?;

    println!(
        "  {} Pushgateway: {}",
        "→".cyan(),
        config.gateway.host.bold()
    );

    let pusher = Pusher::new(&config.gateway.host, &config.job).map_err(|e| e.to_string())?;
    let reporter = JobReporter::new(pusher);
    let work =
        SimulatedBackup::new(config.max_delay, config.records).failure_rate(config.failure_rate);
    let mut metrics = JobMetrics::try_new(&config.job)
        .map_err(|e| format!("Invalid job name '{}': {}", config.job, e))?;

    let report = reporter.run(&work, &mut metrics).await;

    match &report.error {
        None => println!(
            "  {} {} processed {} records in {:.3}s",
            "✓".green(),
            config.job.cyan(),
            report.snapshot.records_processed,
            report.snapshot.duration_seconds
        ),
        Some(e) => println!("  {} {} failed: {}", "✗".red(), config.job.cyan(), e),
    }

    match &report.push {
        Ok(()) => println!("  {} Pushed to {}", "✓".green(), reporter.pusher().url().cyan()),
        Err(e) => println!("  {} Could not push to Pushgateway: {}", "✗".red(), e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushgate::config::GatewayConfig;

    fn config() -> JobConfig {
        JobConfig {
            gateway: GatewayConfig {
                host: "localhost:9091".to_string(),
            },
            job: "db_backup".to_string(),
            max_delay: Duration::from_millis(1000),
            records: 42,
            failure_rate: 0.0,
        }
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = config();
        BackupOverrides::default().apply(&mut config);
        assert_eq!(config, self::config());
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = config();
        BackupOverrides {
            job: Some("nightly".into()),
            records: Some(7),
            max_delay_ms: Some(0),
            failure_rate: Some(1.0),
        }
        .apply(&mut config);

        assert_eq!(config.job, "nightly");
        assert_eq!(config.records, 7);
        assert_eq!(config.max_delay, Duration::ZERO);
        assert_eq!(config.failure_rate, 1.0);
    }

    #[test]
    fn test_out_of_range_failure_rate_override_is_rejected() {
        let mut config = config();
        BackupOverrides {
            failure_rate: Some(7.0),
            ..Default::default()
        }
        .apply(&mut config);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PUSHGATE_FAILURE_RATE"));
    }
}
