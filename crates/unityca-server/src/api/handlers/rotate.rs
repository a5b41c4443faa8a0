//! Host key rotation handler
//!
//! The submission endpoint of the rotation protocol: raw two-section body
//! in, certificate text out.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use unityca_core::RotationRequest;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;

/// Rotate a host's key and issue a certificate
///
/// POST /host
///
/// Body: `<signed-section>\n\n<unsigned-section>`. The request is parsed
/// and authenticated (dual signatures over the signed section), then
/// reconciled against the on-file key for every hostname it covers. On
/// acceptance the response is the freshly signed certificate as plain
/// text; a continuity conflict is a 409 that leaves only a proposed-key
/// side file behind.
pub async fn rotate_host_key(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let request = RotationRequest::parse(&body, state.verifier.as_ref()).await?;

    info!(
        hostname = %request.hostname(),
        identity = %request.identity(),
        "rotation request authenticated"
    );

    let certificate = state.service.process(&request).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        certificate,
    ))
}
