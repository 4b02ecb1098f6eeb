use std::time::Duration;

use prometheus::Gauge;
use prometheus::proto::MetricFamily;

use super::registry::GaugeRegistry;

pub const REQUEST_DURATION_METRIC: &str = "request_duration_seconds";

/// Holds the request duration gauge shared by every in-flight request.
///
/// Clones share the same gauge. Concurrent requests overwrite each other;
/// the gauge always reports the most recently finished request.
#[derive(Clone)]
pub struct RequestMetrics {
    registry: GaugeRegistry,
    request_duration_seconds: Gauge,
}

impl RequestMetrics {
    pub fn new() -> Self {
        let registry = GaugeRegistry::new();
        let request_duration_seconds = registry.register(
            REQUEST_DURATION_METRIC,
            "The duration of the most recent HTTP request in seconds.",
        );

        Self {
            registry,
            request_duration_seconds,
        }
    }

    pub fn observe(&self, elapsed: Duration) {
        self.request_duration_seconds.set(elapsed.as_secs_f64());
    }

    pub fn duration_seconds(&self) -> f64 {
        self.request_duration_seconds.get()
    }

    pub fn families(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn encode(&self) -> prometheus::Result<String> {
        self.registry.encode()
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let metrics = RequestMetrics::new();
        assert_eq!(metrics.duration_seconds(), 0.0);
        assert!(metrics.encode().unwrap().contains("request_duration_seconds 0"));
    }

    #[test]
    fn test_observe_is_last_write_wins() {
        let metrics = RequestMetrics::new();
        metrics.observe(Duration::from_millis(300));
        metrics.observe(Duration::from_nanos(1_500));
        assert_eq!(metrics.duration_seconds(), 0.0000015);
    }

    #[test]
    fn test_clone_shares_gauge() {
        let metrics = RequestMetrics::new();
        let clone = metrics.clone();
        clone.observe(Duration::from_secs(2));
        assert_eq!(metrics.duration_seconds(), 2.0);
    }

    #[test]
    fn test_families_single_gauge() {
        let families = RequestMetrics::default().families();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), REQUEST_DURATION_METRIC);
    }
}
