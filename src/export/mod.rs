//! Delivery of flushed batches to the remote collector.
//!
//! Delivery is at most once: a batch that cannot be sent is logged and
//! dropped. Nothing is retried or requeued.

pub mod auth;

pub use auth::{BasicAuthSigner, NoAuth, OAuth1Signer, RequestSigner};

use crate::core::config::EndpointConfig;
use crate::core::{FlushdError, NormalizedRecord, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use std::time::Duration;

/// Sends batches to the collector over HTTP.
pub struct Dispatcher {
    client: Client,
    url: Url,
    signer: Box<dyn RequestSigner>,
    timeout: Duration,
}

impl Dispatcher {
    /// Build a dispatcher for `endpoint`.
    ///
    /// The credential is resolved into a signer here, once.
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(endpoint.timeout)
            .danger_accept_invalid_certs(!endpoint.verify_ssl)
            .user_agent(concat!("flushd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlushdError::config(format!("Failed to build HTTP client: {}", e)))?;

        if !endpoint.verify_ssl {
            tracing::warn!("TLS certificate verification is disabled for {}", endpoint.url);
        }

        Ok(Self {
            client,
            url: endpoint.url.clone(),
            signer: endpoint.auth.signer(),
            timeout: endpoint.timeout,
        })
    }

    /// Collector URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Authentication scheme in use
    pub fn auth_scheme(&self) -> &'static str {
        self.signer.scheme()
    }

    /// POST `batch` as a JSON array.
    ///
    /// An empty batch is a no-op. Non-2xx responses, timeouts and transport
    /// failures come back as errors; the batch is consumed either way.
    pub async fn transmit(&self, batch: Vec<NormalizedRecord>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = serde_json::to_vec(&batch)?;
        let request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let request = self.signer.sign(request, &Method::POST, &self.url)?;

        let response = request.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlushdError::Transmit {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Posted {} records to {} ({})", batch.len(), self.url, status);
        Ok(())
    }

    /// Transmit `batch`, logging and swallowing any failure.
    ///
    /// Returns true if the collector accepted the batch.
    pub async fn flush(&self, batch: Vec<NormalizedRecord>) -> bool {
        let count = batch.len();
        match self.transmit(batch).await {
            Ok(()) => {
                if count > 0 {
                    tracing::info!("Flushed {} records to {}", count, self.url);
                }
                true
            },
            Err(FlushdError::Transmit { status, body }) => {
                tracing::warn!(
                    "Failed to post metrics to '{}': Code: {}. Response: {}",
                    self.url,
                    status,
                    body
                );
                false
            },
            Err(e) => {
                tracing::warn!("Failed to post metrics to '{}': {}", self.url, e);
                false
            },
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> FlushdError {
        if err.is_timeout() {
            FlushdError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            FlushdError::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthCredential;

    fn endpoint(url: &str) -> EndpointConfig {
        EndpointConfig {
            url: Url::parse(url).unwrap(),
            auth: AuthCredential::None,
            verify_ssl: true,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        // Nothing listens on port 9; an actual request would fail
        let dispatcher = Dispatcher::new(&endpoint("http://127.0.0.1:9/metrics")).unwrap();
        assert!(dispatcher.transmit(Vec::new()).await.is_ok());
        assert!(dispatcher.flush(Vec::new()).await);
    }

    #[test]
    fn test_dispatcher_reports_scheme() {
        let dispatcher = Dispatcher::new(&endpoint("http://127.0.0.1:9/metrics")).unwrap();
        assert_eq!(dispatcher.auth_scheme(), "none");
        assert_eq!(dispatcher.url().path(), "/metrics");
    }
}
