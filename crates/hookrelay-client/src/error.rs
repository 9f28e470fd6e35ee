//! Error types for the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Client error variants.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request. {0}")]
    Protocol(String),

    #[error("Relay rejected the registration with status {status}")]
    RegistrationRejected { status: u16 },

    #[error("Could not reach the relay after {attempts} attempts")]
    HandshakeExhausted { attempts: u32 },

    #[error("Failed to bind local listener: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Internal client error: {0}")]
    Internal(String),
}

/// JSON error response returned by intake endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClientError::Protocol(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
