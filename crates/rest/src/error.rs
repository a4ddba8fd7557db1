//! Error types for the Bookshelf HTTP API.
//!
//! # Error Mapping
//!
//! | Storage Error | HTTP Status |
//! |--------------|-------------|
//! | Validation (unsafe identifier, unsupported field, missing field) | 400 |
//! | Backend (connection, query, write, not connected) | 502 |
//! | Cancelled / DeadlineExceeded | 504 |
//! | Configuration / internal | 500 |
//!
//! Every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bookshelf_persistence::StorageError;
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

/// The error type returned by every handler.
#[derive(Debug)]
pub enum RestError {
    /// Malformed request: a missing query parameter or an unreadable body (HTTP 400).
    BadRequest { message: String },

    /// Storage rejected the caller's input (HTTP 400).
    Validation { message: String },

    /// A backend could not serve a valid request (HTTP 502).
    BadGateway { message: String },

    /// The request was cancelled or ran past its deadline (HTTP 504).
    Timeout { message: String },

    /// Anything else (HTTP 500).
    InternalError { message: String },
}

impl RestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest {
            message: message.into(),
        }
    }

    /// Shorthand for a required query parameter that was not supplied.
    pub fn missing_param(name: &str) -> Self {
        Self::bad_request(format!("Missing required query parameter '{}'", name))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::BadRequest { .. } | RestError::Validation { .. } => StatusCode::BAD_REQUEST,
            RestError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            RestError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            RestError::BadRequest { message }
            | RestError::Validation { message }
            | RestError::BadGateway { message }
            | RestError::Timeout { message }
            | RestError::InternalError { message } => message,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::Validation { message } => write!(f, "Invalid input: {}", message),
            RestError::BadGateway { message } => write!(f, "Storage unavailable: {}", message),
            RestError::Timeout { message } => write!(f, "Timed out: {}", message),
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        } else {
            warn!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        if err.is_client_error() {
            RestError::Validation { message }
        } else if err.is_timeout() {
            RestError::Timeout { message }
        } else if err.is_unavailable() {
            RestError::BadGateway { message }
        } else {
            RestError::InternalError { message }
        }
    }
}

/// Result type for handlers.
pub type RestResult<T> = Result<T, RestError>;
