//! Error types for the lookup service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cpr_client::{CprError, TransportError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Service error types.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lookup(#[from] CprError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ServiceError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::Lookup(CprError::InvalidIdentifier) => {
                (StatusCode::BAD_REQUEST, "INVALID_CPR")
            }
            ServiceError::Lookup(CprError::Transport(TransportError::Timeout { .. })) => {
                (StatusCode::GATEWAY_TIMEOUT, "REGISTRY_TIMEOUT")
            }
            ServiceError::Lookup(CprError::Transport(_)) => {
                (StatusCode::BAD_GATEWAY, "REGISTRY_ERROR")
            }
            ServiceError::Lookup(CprError::MalformedResponse(_)) => {
                (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE")
            }
            ServiceError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Upstream details are never returned; they may carry registry data.
    fn public_message(&self) -> String {
        match self {
            ServiceError::Lookup(CprError::InvalidIdentifier) => "Invalid CPR!".to_string(),
            ServiceError::Lookup(CprError::Transport(TransportError::Timeout { .. })) => {
                "CPR registry did not respond in time".to_string()
            }
            ServiceError::Lookup(CprError::Transport(_)) => "CPR registry call failed".to_string(),
            ServiceError::Lookup(CprError::MalformedResponse(_)) => {
                "Unexpected response from CPR registry".to_string()
            }
            ServiceError::RateLimitExceeded => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(code, error = %self, "Lookup failed");
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
