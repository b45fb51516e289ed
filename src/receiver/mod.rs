//! Sample receiver.
//!
//! Accepts samples from the monitoring agent over HTTP (collectd
//! `write_http` JSON) and hands each one to the forwarder's write callback.

pub mod http;

use crate::application::Forwarder;
use crate::core::{FlushdError, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

/// Default address the receiver binds to
pub const DEFAULT_LISTEN: &str = "127.0.0.1:25826";

/// HTTP sample receiver bound to one address.
pub struct SampleReceiver {
    addr: SocketAddr,
    forwarder: Arc<Forwarder>,
}

impl SampleReceiver {
    /// Create a receiver feeding `forwarder`
    pub fn new(addr: SocketAddr, forwarder: Arc<Forwarder>) -> Self {
        Self { addr, forwarder }
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = http::create_http_router(Arc::clone(&self.forwarder));

        let listener = tokio::net::TcpListener::bind(self.addr).await.map_err(|e| {
            FlushdError::http(format!("Failed to bind HTTP server to {}: {}", self.addr, e))
        })?;

        tracing::info!("Sample receiver listening on {}", self.addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| FlushdError::http(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}
