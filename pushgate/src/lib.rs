//! Push gauges from short-lived jobs and HTTP services to a Prometheus
//! Pushgateway.
//!
//! Two independent pieces share the [`push::Pusher`] client:
//!
//! - [`job::JobReporter`] runs a unit of work once, records completion
//!   time, duration and record count in a [`metrics::JobMetrics`] context and
//!   pushes them additively.
//! - [`middleware::RequestTimingMiddleware`] times every request and keeps
//!   the latest duration in a [`metrics::RequestMetrics`] gauge.

use std::future::Future;
use std::pin::Pin;

pub mod app;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod job;
pub mod metrics;
pub mod middleware;
pub mod observability;
pub mod push;
pub mod response;
pub mod router;
pub mod server;
pub mod testing;
pub mod users;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::{GatewayConfig, JobConfig, ServiceConfig};
    pub use crate::context::RequestContext;
    pub use crate::error::{Error, Result};
    pub use crate::job::{
        JobReport, JobReporter, SimulatedBackup, UnitOfWork, WorkError, WorkOutcome,
    };
    pub use crate::metrics::{JobMetrics, JobSnapshot, RequestMetrics};
    pub use crate::middleware::{Middleware, Next, RequestTimingMiddleware};
    pub use crate::push::{PushError, Pusher};
    pub use crate::response::IntoResponse;
    pub use crate::router::Router;

    pub use http::{Method, StatusCode};
}
