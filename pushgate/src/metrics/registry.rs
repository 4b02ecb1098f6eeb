use std::sync::Arc;

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};

/// A set of gauges, unique by name.
///
/// Registration checks for duplicate names and inconsistent descriptors.
/// [`GaugeRegistry::register`] treats a violation as a programming error
/// and panics; [`GaugeRegistry::try_register`] hands the error back.
#[derive(Clone, Default)]
pub struct GaugeRegistry {
    registry: Arc<Registry>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a gauge, panicking if `name` is invalid or taken.
    pub fn register(&self, name: &str, help: &str) -> Gauge {
        self.try_register(name, help)
            .unwrap_or_else(|e| panic!("failed to register gauge {name}: {e}"))
    }

    pub fn try_register(&self, name: &str, help: &str) -> prometheus::Result<Gauge> {
        let gauge = Gauge::with_opts(Opts::new(name, help))?;
        self.registry.register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }

    /// Snapshot of every registered gauge.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Encodes all gauges in the Prometheus text exposition format.
    pub fn encode(&self) -> prometheus::Result<String> {
        encode_text(&self.gather())
    }
}

/// Renders metric families in the text exposition format.
pub fn encode_text(families: &[MetricFamily]) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
