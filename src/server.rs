//! Status server.
//!
//! Exposes liveness, readiness and the engine status snapshot over HTTP.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::sync::watch;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::engine::EngineStatus;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Latest engine status, published by the engine after every change.
    pub status: watch::Receiver<EngineStatus>,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<String>,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/status", get(status_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state)
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        engine: None,
    })
}

/// Readiness probe: ready while the engine is running.
async fn readyz_handler(State(state): State<AppState>) -> Response {
    let engine_state = state.status.borrow().state;

    if engine_state.is_running() {
        Json(HealthResponse {
            status: "ok".to_string(),
            engine: Some(engine_state.to_string()),
        })
        .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready".to_string(),
                engine: Some(engine_state.to_string()),
            }),
        )
            .into_response()
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.status.borrow().clone())
}
