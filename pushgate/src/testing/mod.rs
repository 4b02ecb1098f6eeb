//! In-process helpers for integration tests.
//!
//! [`TestClient`] serves an [`App`](crate::app::App) on a random local port.
//! [`MockGateway`] stands in for a Pushgateway and keeps what it receives,
//! applying the same merge and replace rules as the real thing.
//! [`LogCapture`] records formatted log output for assertions.

mod client;
mod gateway;
mod logs;

pub use client::{TestClient, TestRequestBuilder, TestResponse};
pub use gateway::{MockGateway, ReceivedPush};
pub use logs::{CaptureWriter, LogCapture};
