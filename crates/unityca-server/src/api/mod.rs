//! API module for the UnityCA server

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Rotation protocol
        .route("/host", post(handlers::rotate_host_key))
        // CA key material
        .route("/host_ca.pub", get(handlers::host_ca_key))
        .route("/user_ca.pub", get(handlers::user_ca_key))
        // Revocation read path
        .route("/revoked", get(handlers::list_revoked))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
