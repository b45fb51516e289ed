//! HTTP endpoints of the sample receiver.

use crate::application::Forwarder;
use crate::core::RawSample;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Forwarder samples are written to
    pub forwarder: Arc<Forwarder>,
}

/// Request body: one sample or an array of samples.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SamplePayload {
    Batch(Vec<RawSample>),
    Single(RawSample),
}

impl SamplePayload {
    fn into_samples(self) -> Vec<RawSample> {
        match self {
            SamplePayload::Batch(samples) => samples,
            SamplePayload::Single(sample) => vec![sample],
        }
    }
}

/// Response to a sample submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// Samples that passed validation
    pub accepted: usize,
    /// Samples dropped by validation
    pub rejected: usize,
}

/// Create the receiver router.
pub fn create_http_router(forwarder: Arc<Forwarder>) -> Router {
    let state = HttpState { forwarder };

    Router::new()
        .route("/v1/samples", post(handle_samples))
        .route("/health", get(health_check))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Write every sample of the request through the forwarder.
async fn handle_samples(
    State(state): State<HttpState>,
    body: Bytes,
) -> std::result::Result<Json<WriteSummary>, HttpError> {
    tracing::debug!("Received sample submission, {} bytes", body.len());

    let payload: SamplePayload = serde_json::from_slice(&body)
        .map_err(|e| HttpError::BadRequest(format!("Invalid JSON: {}", e)))?;

    let mut summary = WriteSummary {
        accepted: 0,
        rejected: 0,
    };
    for sample in payload.into_samples() {
        match state.forwarder.write(&sample).await {
            Ok(_) => summary.accepted += 1,
            Err(_) => summary.rejected += 1,
        }
    }

    Ok(Json(summary))
}

async fn health_check(State(state): State<HttpState>) -> impl IntoResponse {
    let forwarder = &state.forwarder;
    Json(serde_json::json!({
        "status": "ok",
        "buffered": forwarder.buffered(),
        "types": forwarder.catalog().len(),
        "stats": forwarder.stats(),
    }))
}

/// Errors returned by the HTTP handlers.
#[derive(Debug)]
pub enum HttpError {
    /// The request could not be understood
    BadRequest(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_single_or_batch() {
        let single: SamplePayload =
            serde_json::from_str(r#"{"type": "cpu", "values": [1.0]}"#).unwrap();
        assert_eq!(single.into_samples().len(), 1);

        let batch: SamplePayload = serde_json::from_str(
            r#"[{"type": "cpu", "values": [1.0]}, {"type": "load", "values": [1, 2, 3]}]"#,
        )
        .unwrap();
        let samples = batch.into_samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[1].values,
            vec![crate::core::counter(1), crate::core::counter(2), crate::core::counter(3)]
        );
    }

    #[test]
    fn test_payload_rejects_garbage() {
        assert!(serde_json::from_str::<SamplePayload>(r#"{"values": "nope"}"#).is_err());
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError::BadRequest("Invalid JSON".to_string());
        assert_eq!(err.to_string(), "Bad Request: Invalid JSON");
    }
}
