use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::error;

use crate::middleware::{Middleware, MiddlewareStack};
use crate::router::Router;
use crate::server::serve;

/// A router plus the middlewares wrapped around it.
pub struct App {
    pub(crate) router: Router,
    pub(crate) middlewares: MiddlewareStack,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            middlewares: MiddlewareStack::new(),
        }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.add(middleware);
        self
    }

    /// Binds `addr` and serves until Ctrl-C.
    pub async fn listen(self, addr: &str) -> std::io::Result<()> {
        let addr: SocketAddr = addr.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid listen address '{addr}': {e}"),
            )
        })?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_on(tokio::signal::ctrl_c())).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        serve(self.router, self.middlewares, listener, shutdown).await
    }
}

/// Resolves when `signal` fires. If the signal handler cannot be installed
/// the server keeps running until the process is killed.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
