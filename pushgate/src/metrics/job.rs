use std::time::Duration;

use prometheus::Gauge;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use serde::Serialize;

use super::registry::GaugeRegistry;
use super::unix_now;

/// Gauges describing the most recent run of a batch job.
///
/// Completion time, duration and record count are registered and are part
/// of every push. The success timestamp lives outside the registry and is
/// only attached to a push after a run that succeeded, so a failed run
/// leaves the previously pushed success timestamp untouched at the gateway.
pub struct JobMetrics {
    job: String,
    registry: GaugeRegistry,
    completion_timestamp: Gauge,
    duration_seconds: Gauge,
    records_processed: Gauge,
    success_timestamp: Gauge,
    succeeded: bool,
}

/// Point-in-time view of [`JobMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub completion_timestamp: f64,
    pub duration_seconds: f64,
    pub records_processed: f64,
    /// `None` unless the last recorded run succeeded.
    pub success_timestamp: Option<f64>,
}

impl JobMetrics {
    /// Creates the gauges for `job`, using it as the metric name prefix.
    ///
    /// Panics if `job` does not produce valid metric names.
    pub fn new(job: &str) -> Self {
        Self::try_new(job).unwrap_or_else(|e| panic!("failed to create metrics for job {job}: {e}"))
    }

    pub fn try_new(job: &str) -> prometheus::Result<Self> {
        let registry = GaugeRegistry::new();

        let completion_timestamp = registry.try_register(
            &format!("{job}_last_completion_timestamp_seconds"),
            "The timestamp of the last completion of the job, successful or not.",
        )?;
        let duration_seconds = registry.try_register(
            &format!("{job}_duration_seconds"),
            "The duration of the last run of the job in seconds.",
        )?;
        let records_processed = registry.try_register(
            &format!("{job}_records_processed"),
            "The number of records processed in the last run of the job.",
        )?;
        let success_timestamp = Gauge::new(
            format!("{job}_last_success_timestamp_seconds"),
            "The timestamp of the last successful completion of the job.",
        )?;

        Ok(Self {
            job: job.to_string(),
            registry,
            completion_timestamp,
            duration_seconds,
            records_processed,
            success_timestamp,
            succeeded: false,
        })
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Records the outcome of one run.
    ///
    /// Completion time, duration and record count are always set. The
    /// success timestamp is set only when `succeeded` is true.
    pub fn record(&mut self, records: u64, elapsed: Duration, succeeded: bool) {
        self.records_processed.set(records as f64);
        self.duration_seconds.set(elapsed.as_secs_f64());
        self.completion_timestamp.set(unix_now());

        self.succeeded = succeeded;
        if succeeded {
            self.success_timestamp.set(unix_now());
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            completion_timestamp: self.completion_timestamp.get(),
            duration_seconds: self.duration_seconds.get(),
            records_processed: self.records_processed.get(),
            success_timestamp: self.succeeded.then(|| self.success_timestamp.get()),
        }
    }

    /// Metric families to push for the last recorded run.
    pub fn families(&self) -> Vec<MetricFamily> {
        let mut families = self.registry.gather();
        if self.succeeded {
            families.extend(self.success_timestamp.collect());
        }
        families
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(families: &[MetricFamily]) -> Vec<String> {
        families.iter().map(|f| f.get_name().to_string()).collect()
    }

    #[test]
    fn test_new_registers_three_gauges() {
        let metrics = JobMetrics::new("db_backup");
        let names = names(&metrics.families());

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"db_backup_last_completion_timestamp_seconds".to_string()));
        assert!(names.contains(&"db_backup_duration_seconds".to_string()));
        assert!(names.contains(&"db_backup_records_processed".to_string()));
    }

    #[test]
    fn test_record_success_sets_all_gauges() {
        let mut metrics = JobMetrics::new("db_backup");
        metrics.record(42, Duration::from_millis(250), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_processed, 42.0);
        assert_eq!(snapshot.duration_seconds, 0.25);
        assert!(snapshot.completion_timestamp > 0.0);
        assert!(snapshot.success_timestamp.unwrap() > 0.0);
        assert!(
            names(&metrics.families())
                .contains(&"db_backup_last_success_timestamp_seconds".to_string())
        );
    }

    #[test]
    fn test_record_failure_omits_success_timestamp() {
        let mut metrics = JobMetrics::new("db_backup");
        metrics.record(0, Duration::from_millis(10), false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_processed, 0.0);
        assert!(snapshot.completion_timestamp > 0.0);
        assert_eq!(snapshot.success_timestamp, None);
        assert!(
            !names(&metrics.families())
                .contains(&"db_backup_last_success_timestamp_seconds".to_string())
        );
    }

    #[test]
    fn test_failure_after_success_drops_success_from_families() {
        let mut metrics = JobMetrics::new("nightly");
        metrics.record(5, Duration::ZERO, true);
        metrics.record(1, Duration::ZERO, false);

        assert_eq!(metrics.snapshot().success_timestamp, None);
        assert_eq!(metrics.families().len(), 3);
    }

    #[test]
    fn test_job_prefix() {
        let metrics = JobMetrics::new("nightly_export");
        assert_eq!(metrics.job(), "nightly_export");
        assert!(
            names(&metrics.families())
                .iter()
                .all(|name| name.starts_with("nightly_export_"))
        );
    }

    #[test]
    fn test_try_new_rejects_invalid_prefix() {
        assert!(JobMetrics::try_new("nightly backup").is_err());
        assert!(JobMetrics::try_new("9lives").is_err());
    }

    #[test]
    fn test_snapshot_serializes_missing_success_as_null() {
        let metrics = JobMetrics::new("db_backup");
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert!(json["success_timestamp"].is_null());
    }
}
