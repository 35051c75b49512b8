//! Error types for the verification bridge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use code_ledger::LedgerError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to API callers and bot users.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Telegram username {0} not found. Send /start to the bot first")]
    NotRegistered(String),

    #[error(transparent)]
    Verification(#[from] LedgerError),

    #[error("Failed to send Telegram message: {0}")]
    Dispatch(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Too many attempts for {0}, try again later")]
    RateLimitExceeded(String),
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl BridgeError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            BridgeError::MissingField(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BridgeError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BridgeError::NotRegistered(_) => (StatusCode::BAD_REQUEST, "NOT_REGISTERED"),
            BridgeError::Verification(LedgerError::NotFound(_)) => {
                (StatusCode::BAD_REQUEST, "NOT_FOUND")
            }
            BridgeError::Verification(LedgerError::Expired(_)) => {
                (StatusCode::BAD_REQUEST, "EXPIRED")
            }
            BridgeError::Verification(LedgerError::Mismatch) => {
                (StatusCode::BAD_REQUEST, "MISMATCH")
            }
            BridgeError::Dispatch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DISPATCH_FAILURE"),
            BridgeError::Registration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REGISTRATION_FAILURE")
            }
            BridgeError::RateLimitExceeded(_) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for BridgeError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        BridgeError::InvalidBody(rejection.body_text())
    }
}
