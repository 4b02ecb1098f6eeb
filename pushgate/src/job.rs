//! Run-once batch job reporting.
//!
//! [`JobReporter::run`] times a [`UnitOfWork`], records the outcome into a
//! [`JobMetrics`] context and pushes the result to the gateway with
//! additive semantics. Neither a failed unit of work nor a failed push is
//! fatal; both end up in the returned [`JobReport`] and in the logs.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::BoxFuture;
use crate::metrics::{JobMetrics, JobSnapshot};
use crate::push::{PushError, Pusher};

/// Why a unit of work did not succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkError {
    #[error("{0}")]
    Failed(String),
    #[error("simulated failure")]
    Simulated,
}

/// What a unit of work reports back: a record count plus an optional error.
///
/// A failed run still reports how many records it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOutcome {
    pub records: u64,
    pub error: Option<WorkError>,
}

impl WorkOutcome {
    pub fn success(records: u64) -> Self {
        Self {
            records,
            error: None,
        }
    }

    pub fn failed(records: u64, error: WorkError) -> Self {
        Self {
            records,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A single run of the job's real work.
pub trait UnitOfWork: Send + Sync {
    fn run(&self) -> BoxFuture<'_, WorkOutcome>;
}

/// Stand-in for a real backup: sleeps for a random time below `max_delay`.
#[derive(Debug, Clone)]
pub struct SimulatedBackup {
    pub max_delay: Duration,
    pub records: u64,
    /// Probability in `[0, 1]` that the run reports a failure.
    pub failure_rate: f64,
}

impl SimulatedBackup {
    pub fn new(max_delay: Duration, records: u64) -> Self {
        Self {
            max_delay,
            records,
            failure_rate: 0.0,
        }
    }

    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }
}

impl Default for SimulatedBackup {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), 42)
    }
}

impl UnitOfWork for SimulatedBackup {
    fn run(&self) -> BoxFuture<'_, WorkOutcome> {
        Box::pin(async move {
            let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
            if max_ms > 0 {
                let wait = rand::random_range(0..max_ms);
                tokio::time::sleep(Duration::from_millis(wait)).await;
            }

            if self.failure_rate > 0.0 && rand::random_bool(self.failure_rate) {
                WorkOutcome::failed(0, WorkError::Simulated)
            } else {
                WorkOutcome::success(self.records)
            }
        })
    }
}

/// Result of one reporter run.
#[derive(Debug)]
pub struct JobReport {
    pub snapshot: JobSnapshot,
    pub error: Option<WorkError>,
    pub push: Result<(), PushError>,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn pushed(&self) -> bool {
        self.push.is_ok()
    }
}

/// Runs a unit of work and reports its metrics to one gateway group.
pub struct JobReporter {
    pusher: Pusher,
}

impl JobReporter {
    pub fn new(pusher: Pusher) -> Self {
        Self { pusher }
    }

    pub fn pusher(&self) -> &Pusher {
        &self.pusher
    }

    pub async fn run<W: UnitOfWork + ?Sized>(
        &self,
        work: &W,
        metrics: &mut JobMetrics,
    ) -> JobReport {
        let start = Instant::now();
        let outcome = work.run().await;
        let elapsed = start.elapsed();

        metrics.record(outcome.records, elapsed, outcome.is_success());
        let snapshot = metrics.snapshot();

        match &outcome.error {
            None => info!(
                job = metrics.job(),
                records = outcome.records,
                duration_seconds = snapshot.duration_seconds,
                "job succeeded"
            ),
            Some(e) => error!(
                job = metrics.job(),
                records = outcome.records,
                duration_seconds = snapshot.duration_seconds,
                error = %e,
                "job failed"
            ),
        }

        let push = self.pusher.add(&metrics.families()).await;
        match &push {
            Ok(()) => info!(url = %self.pusher.url(), "pushed job metrics"),
            Err(e) => warn!(url = %self.pusher.url(), error = %e, "could not push to gateway"),
        }

        JobReport {
            snapshot,
            error: outcome.error,
            push,
        }
    }
}
