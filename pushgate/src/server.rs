//! Accept loop with graceful shutdown.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::context::RequestContext;
use crate::middleware::MiddlewareStack;
use crate::router::Router;

/// Serves connections from `listener` until `shutdown` resolves, then waits
/// for in-flight connections to finish.
pub async fn serve<F>(
    router: Router,
    middlewares: MiddlewareStack,
    listener: TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let router = Arc::new(router);
    let middlewares = Arc::new(middlewares);
    let graceful = GracefulShutdown::new();
    let addr = listener.local_addr()?;
    info!(%addr, "listening");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let router = router.clone();
                let middlewares = middlewares.clone();
                let service = service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    let middlewares = middlewares.clone();
                    async move {
                        let ctx = RequestContext::new();
                        let response = middlewares.execute(req, &router, &ctx).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                let conn = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    drop(listener);
    graceful.shutdown().await;
    Ok(())
}
