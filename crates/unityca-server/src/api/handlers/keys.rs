//! CA public key handlers
//!
//! Serve the CA's own public key material verbatim so hosts and users can
//! pin the authority.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::path::Path;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;

/// GET /host_ca.pub
pub async fn host_ca_key(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    serve_key_file(&state.config.host_ca_pub()).await
}

/// GET /user_ca.pub
pub async fn user_ca_key(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    serve_key_file(&state.config.user_ca_pub()).await
}

async fn serve_key_file(path: &Path) -> Result<impl IntoResponse, ApiError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|_| ApiError::NotFound(format!("CA public key unavailable: {}", path.display())))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        contents,
    ))
}
