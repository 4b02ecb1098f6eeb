//! Gauge contexts for the backup job and the timing service.
//!
//! Each context owns its own registry. Nothing here is process-global, so
//! callers pass the context to whatever records into it.

mod job;
mod registry;
mod request;

pub use self::job::{JobMetrics, JobSnapshot};
pub use self::registry::{GaugeRegistry, encode_text};
pub use self::request::{REQUEST_DURATION_METRIC, RequestMetrics};

use chrono::Utc;

/// Current wall-clock time as fractional Unix seconds.
pub fn unix_now() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}
