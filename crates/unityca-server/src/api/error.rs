//! API error types and responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use unityca_core::RotationError;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error("not found: {0}")]
    NotFound(String),
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Rotation(err) => match err {
                RotationError::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST"),
                RotationError::UnsupportedAlgorithm(_) => {
                    (StatusCode::BAD_REQUEST, "UNSUPPORTED_ALGORITHM")
                }
                RotationError::InvalidSignature(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
                RotationError::KeyConflict { .. } => (StatusCode::CONFLICT, "KEY_CONFLICT"),
                RotationError::SigningFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SIGNING_FAILURE")
                }
                RotationError::Subprocess(_) | RotationError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        };

        let message = self.to_string();
        if status.is_server_error() {
            error!(code, %message, "request failed");
        } else {
            warn!(code, %message, "rejecting request");
        }

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unityca_core::KeySlot;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            status_of(RotationError::MalformedRequest("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RotationError::UnsupportedAlgorithm("rsa".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RotationError::InvalidSignature(KeySlot::New).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RotationError::KeyConflict { hostname: "a".into() }.into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_server_errors_map_to_5xx() {
        assert_eq!(
            status_of(RotationError::SigningFailure("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(RotationError::Subprocess("spawn".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_uniform_status_for_both_signature_slots() {
        assert_eq!(
            status_of(RotationError::InvalidSignature(KeySlot::New).into()),
            status_of(RotationError::InvalidSignature(KeySlot::Old).into()),
        );
    }
}
