//! Revocation listing handler

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;

/// GET /revoked
///
/// Aggregated listing of every revoked key/certificate line in the
/// revocation directory, sorted by reversed domain labels.
pub async fn list_revoked(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let listing = state.revocations.list().await.map_err(ApiError::Rotation)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        listing,
    ))
}
