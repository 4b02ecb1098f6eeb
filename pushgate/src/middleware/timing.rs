use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use hyper::body::Incoming;
use hyper::{Request, Response};
use tracing::{Instrument, info, info_span};

use crate::context::RequestContext;
use crate::metrics::RequestMetrics;
use crate::response::BoxBody;

use super::{BoxFuture, Middleware, Next};

/// Times each request and writes the result into the duration gauge.
///
/// The gauge is set after the handler returns, whatever status it produced.
/// Every request also logs its start and end wall-clock times, the elapsed
/// time in nanoseconds and in seconds, and the response status.
pub struct RequestTimingMiddleware {
    metrics: RequestMetrics,
}

impl RequestTimingMiddleware {
    pub fn new(metrics: RequestMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }
}

impl Middleware for RequestTimingMiddleware {
    fn handle<'a>(
        &'a self,
        req: Request<Incoming>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>> {
        let span = info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            trace_id = %ctx.trace_id,
        );

        Box::pin(
            async move {
                let started_at = Utc::now();
                let start = Instant::now();

                let response = next.run(req).await;

                let elapsed = start.elapsed();
                let finished_at = Utc::now();
                self.metrics.observe(elapsed);

                info!(
                    started_at = %started_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                    finished_at = %finished_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                    elapsed_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
                    elapsed_seconds = elapsed.as_secs_f64(),
                    status = response.status().as_u16(),
                    "request timed"
                );

                response
            }
            .instrument(span),
        )
    }
}
