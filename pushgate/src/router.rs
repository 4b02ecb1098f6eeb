//! Exact-path request dispatch.
//!
//! Routes match on method and the literal request path. A path that exists
//! under another method answers 405 with an `Allow` header; anything else
//! answers 404.

use std::future::Future;

use http::{Method, Request, Response};
use hyper::body::Incoming;

use crate::BoxFuture;
use crate::context::RequestContext;
use crate::error::Error;
use crate::response::{BoxBody, IntoResponse};

type HandlerFn = Box<
    dyn Fn(Request<Incoming>, RequestContext) -> BoxFuture<'static, Response<BoxBody>>
        + Send
        + Sync,
>;

pub(crate) struct Route {
    pub(crate) method: Method,
    pub(crate) path: String,
    handler: HandlerFn,
}

/// # Examples
///
/// ```
/// use pushgate::router::Router;
/// use http::StatusCode;
///
/// let router = Router::new()
///     .get("/health", |_, _| async { StatusCode::OK })
///     .post("/users", |_, _| async { StatusCode::CREATED });
/// ```
pub struct Router {
    pub(crate) routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn route<F, Fut, Out>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        let handler: HandlerFn = Box::new(move |req: Request<Incoming>, ctx: RequestContext| {
            let fut = handler(req, ctx);
            Box::pin(async move { fut.await.into_response() })
                as BoxFuture<'static, Response<BoxBody>>
        });

        self.routes.push(Route {
            method,
            path: path.to_string(),
            handler,
        });
        self
    }

    pub fn get<F, Fut, Out>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut, Out>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Out> + Send + 'static,
        Out: IntoResponse + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Methods registered for `path`, in registration order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.routes
            .iter()
            .filter(|route| route.path == path)
            .map(|route| route.method.clone())
            .collect()
    }

    pub async fn handle(&self, req: Request<Incoming>, ctx: &RequestContext) -> Response<BoxBody> {
        let path = req.uri().path().to_string();

        let matched = self
            .routes
            .iter()
            .find(|route| route.method == req.method() && route.path == path);

        if let Some(route) = matched {
            return (route.handler)(req, ctx.clone()).await;
        }

        let allow = self.allowed_methods(&path);
        let err = if allow.is_empty() {
            Error::not_found(format!("no route for {path}"))
        } else {
            Error::method_not_allowed(allow)
        };
        err.with_trace_id(ctx.trace_id.clone()).into_response()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
