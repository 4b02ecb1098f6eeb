//! Logging setup shared by the backup job and the timing service.

mod tracing;

pub use self::tracing::{LOG_FORMAT_VAR, LogFormat, TracingConfig, TracingError};
