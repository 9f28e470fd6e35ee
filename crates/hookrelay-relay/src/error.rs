//! Error types for the relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Relay error variants.
///
/// Protocol errors are recovered locally and surfaced to the caller as a 400
/// with no state mutation. Transport failures on outbound forwards never reach
/// this type: the dispatcher classifies and absorbs them, buffering the
/// delivery instead of failing the request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Bad request. {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Downstream service rejected the delivery")]
    UpstreamRejected,

    #[error("Internal relay error: {0}")]
    Internal(String),
}

/// JSON error response returned by relay endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            RelayError::Protocol(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            RelayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            RelayError::UpstreamRejected => (StatusCode::BAD_GATEWAY, "upstream_rejected"),
            RelayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
