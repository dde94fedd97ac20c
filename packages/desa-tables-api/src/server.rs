//! Hyper server setup, graceful shutdown, and request logging.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::{Request, Response, Result as HyperResult};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use crate::router::Router;

/// HTTP server for the data table API.
pub struct Server {
    addr: SocketAddr,
    router: Arc<Router>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to
    /// * `router` - Request router
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self {
            addr,
            router: Arc::new(router),
        }
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// See [`Server::serve_listener`] for the shutdown sequence.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
        drain_timeout: Duration,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, shutdown, drain_timeout).await
    }

    /// Serves connections from `listener` until `shutdown` resolves.
    ///
    /// On shutdown the listener is closed, open connections finish their
    /// in-flight requests, and connections still open after `drain_timeout`
    /// are abandoned. Returns once draining ends, so the caller can flush
    /// knowing no request is still being answered.
    pub async fn serve_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
        drain_timeout: Duration,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        let builder = ConnectionBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let router = Arc::clone(&self.router);
                    let connection = builder.serve_connection(
                        TokioIo::new(stream),
                        hyper::service::service_fn(move |req| handle_request(req, router.clone())),
                    );
                    let connection = graceful.watch(connection.into_owned());
                    tokio::spawn(async move {
                        if let Err(err) = connection.await {
                            tracing::warn!("Error serving connection from {}: {}", peer, err);
                        }
                    });
                }
                _ = &mut shutdown => break,
            }
        }

        drop(listener);
        tracing::info!("Stopped accepting connections, draining open ones");
        tokio::select! {
            _ = graceful.shutdown() => tracing::info!("All connections closed"),
            _ = tokio::time::sleep(drain_timeout) => {
                tracing::warn!("Connections still open after {:?}, closing anyway", drain_timeout);
            }
        }
        Ok(())
    }
}

/// Routes one request and logs its outcome.
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
) -> HyperResult<Response<Full<Bytes>>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match router.route(req).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!("{} {} failed: {}", method, path, err);
            Response::from(err)
        }
    };
    tracing::debug!("{} {} -> {}", method, path, response.status());
    Ok(response.map(Full::new))
}
