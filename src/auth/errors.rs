//! Session Errors
//! Mission: One taxonomy for every way a request can fail authentication

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the claims codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("failed to sign claims: {0}")]
    Encoding(String),
}

/// Authentication failures surfaced to the request pipeline.
///
/// `NoToken`, `BadToken` and `Unauthorized` are request-local and never
/// retried. `Internal` means the deployment is misconfigured.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("missing or malformed bearer token")]
    NoToken,
    #[error("invalid or superseded session token")]
    BadToken,
    #[error("insufficient rights")]
    Unauthorized,
    #[error("internal session error: {0}")]
    Internal(String),
}

impl SessionError {
    fn code(&self) -> &'static str {
        match self {
            SessionError::NoToken => "no_token",
            SessionError::BadToken => "bad_token",
            SessionError::Unauthorized => "unauthorized",
            SessionError::Internal(_) => "internal",
        }
    }
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed(_) | CodecError::InvalidSignature => SessionError::BadToken,
            CodecError::Encoding(msg) => SessionError::Internal(msg),
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Internal(detail) => {
                error!(detail = %detail, "Session subsystem failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        };

        // Internal details stay in the log.
        let message = match &self {
            SessionError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
