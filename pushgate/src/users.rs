//! The `POST /users` echo service.
//!
//! There is no user store: the handler decodes the entity and sends it
//! straight back. The interesting part is the request timing middleware in
//! front of it and the gateway push performed while the service is built.

use http::{Request, Response, StatusCode};
use hyper::body::Incoming;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::App;
use crate::context::RequestContext;
use crate::entity::{self, MediaType};
use crate::error::Result;
use crate::metrics::RequestMetrics;
use crate::middleware::RequestTimingMiddleware;
use crate::push::Pusher;
use crate::response::{BoxBody, IntoResponse};
use crate::router::Router;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "User")]
pub struct User {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
}

pub async fn create_user(req: Request<Incoming>, ctx: RequestContext) -> Response<BoxBody> {
    match echo(req).await {
        Ok(response) => response,
        Err(err) => err.with_trace_id(ctx.trace_id).into_response(),
    }
}

async fn echo(req: Request<Incoming>) -> Result<Response<BoxBody>> {
    let headers = req.headers().clone();
    let (user, request_media): (User, MediaType) = entity::read(req).await?;
    let response_media = MediaType::negotiate(&headers, request_media)?;
    entity::encode(response_media, StatusCode::CREATED, &user)
}

pub fn routes() -> Router {
    Router::new().post("/users", create_user)
}

/// Builds the user service around `metrics`.
///
/// When `startup_push` is given, the current value of the duration gauge is
/// pushed once with replace semantics before any request is served. A
/// failed push is logged and does not stop the service from being built.
pub async fn build(metrics: RequestMetrics, startup_push: Option<&Pusher>) -> App {
    if let Some(pusher) = startup_push {
        match pusher.push(&metrics.families()).await {
            Ok(()) => info!(url = %pusher.url(), "pushed initial request metrics"),
            Err(e) => warn!(url = %pusher.url(), error = %e, "could not push to gateway"),
        }
    }

    App::new()
        .middleware(RequestTimingMiddleware::new(metrics))
        .router(routes())
}
