//! Middleware chain wrapped around the router.
//!
//! Middlewares run in the order they were added. Each one receives a
//! [`Next`] and decides when, and whether, to call further down the chain.

mod timing;

pub use timing::RequestTimingMiddleware;

use std::sync::Arc;

use hyper::body::Incoming;
use hyper::{Request, Response};

pub use crate::BoxFuture;
use crate::context::RequestContext;
use crate::response::BoxBody;
use crate::router::Router;

pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(
        &'a self,
        req: Request<Incoming>,
        ctx: &'a RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response<BoxBody>>;
}

pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    router: &'a Router,
    ctx: &'a RequestContext,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        middlewares: &'a [Arc<dyn Middleware>],
        router: &'a Router,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            middlewares,
            router,
            ctx,
        }
    }

    pub async fn run(self, req: Request<Incoming>) -> Response<BoxBody> {
        if let Some((current, rest)) = self.middlewares.split_first() {
            let next = Next {
                middlewares: rest,
                router: self.router,
                ctx: self.ctx,
            };
            current.handle(req, self.ctx, next).await
        } else {
            self.router.handle(req, self.ctx).await
        }
    }
}

#[derive(Default)]
pub struct MiddlewareStack {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: Middleware>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    pub async fn execute(
        &self,
        req: Request<Incoming>,
        router: &Router,
        ctx: &RequestContext,
    ) -> Response<BoxBody> {
        Next::new(&self.middlewares, router, ctx).run(req).await
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RequestMetrics;

    #[test]
    fn test_stack_starts_empty() {
        let stack = MiddlewareStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_stack_add() {
        let mut stack = MiddlewareStack::default();
        stack.add(RequestTimingMiddleware::new(RequestMetrics::new()));
        stack.add(RequestTimingMiddleware::new(RequestMetrics::new()));
        assert_eq!(stack.len(), 2);
    }
}
