//! # HTTP Server
//!
//! HTTP server exposing the conversion endpoint, metrics, and probes.
//!
//! Provides endpoints:
//! - `POST /api/convert` - Convert Secret manifests to ExternalSecret manifests
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe (returns 200 when the server is ready)
//!
//! The server runs on port 8080 by default, the port the browser form in
//! front of this service posts to. CORS is permissive for the same reason.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::convert::{convert, ConvertRequest};
use crate::error::ConvertError;

#[derive(Debug)]
pub struct ServerState {
    pub is_ready: Arc<AtomicBool>,
}

/// Error payload returned for every failed request: a stable kind plus a
/// human-readable message, so callers never have to scrape `result`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: String,
    message: String,
}

impl ErrorBody {
    fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                kind: kind.to_string(),
                message: message.into(),
            },
        }
    }
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/convert", post(convert_handler))
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, state: Arc<ServerState>) -> Result<(), anyhow::Error> {
    let is_ready = Arc::clone(&state.is_ready);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {addr}");
    is_ready.store(true, Ordering::Relaxed);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Field-presence validation matching what the browser form relies on:
/// all missing required fields are reported together.
fn missing_fields(request: &ConvertRequest) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if request.content.is_empty() {
        missing.push("content");
    }
    if request.store_type.is_empty() {
        missing.push("storeType");
    }
    if request.store_name.is_empty() {
        missing.push("storeName");
    }
    if request.creation_policy.is_empty() {
        missing.push("creationPolicy");
    }
    missing
}

async fn convert_handler(Json(payload): Json<Value>) -> impl IntoResponse {
    let request: ConvertRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::to_value(ErrorBody::new(
                    "InvalidRequest",
                    format!("invalid JSON input: {err}"),
                ))
                .unwrap_or_default()),
            );
        }
    };

    let missing = missing_fields(&request);
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(
                serde_json::to_value(ErrorBody::new(
                    "MissingFields",
                    format!("Missing required fields: {}", missing.join(", ")),
                ))
                .unwrap_or_default(),
            ),
        );
    }

    if request.resolve && request.env_vars.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(
                serde_json::to_value(ErrorBody::new(
                    "InvalidRequest",
                    "resolve is set to true but no environment variables provided",
                ))
                .unwrap_or_default(),
            ),
        );
    }

    match convert(&request) {
        Ok(response) => (
            StatusCode::OK,
            Json(serde_json::to_value(response).unwrap_or_default()),
        ),
        Err(err) => {
            let status = match &err {
                ConvertError::InputTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ConvertError::EmptyInput | ConvertError::InvalidOptions(_) => {
                    StatusCode::BAD_REQUEST
                }
                ConvertError::Cancelled | ConvertError::Serialize(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(
                    serde_json::to_value(ErrorBody::new(err.kind(), err.to_string()))
                        .unwrap_or_default(),
                ),
            )
        }
    }
}

async fn metrics_handler() -> impl IntoResponse {
    use crate::observability::metrics::REGISTRY;

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if state.is_ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
