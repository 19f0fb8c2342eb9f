//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request
//! tracking. Core errors map onto the HTTP surface here; storage faults
//! surface as 500s without being swallowed.

use crate::errors::WordmintError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (NOT_FOUND, BAD_REQUEST, CONFLICT, etc.)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error types with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    InternalError(String),
}

impl ApiError {
    pub fn not_found(request_id: String, message: String) -> Self {
        Self { kind: ApiErrorKind::NotFound(message), request_id }
    }

    pub fn bad_request(request_id: String, message: String) -> Self {
        Self { kind: ApiErrorKind::BadRequest(message), request_id }
    }

    pub fn conflict(request_id: String, message: String) -> Self {
        Self { kind: ApiErrorKind::Conflict(message), request_id }
    }

    pub fn unauthorized(request_id: String, message: String) -> Self {
        Self { kind: ApiErrorKind::Unauthorized(message), request_id }
    }

    pub fn forbidden(request_id: String, message: String) -> Self {
        Self { kind: ApiErrorKind::Forbidden(message), request_id }
    }

    pub fn internal_error(request_id: String, message: String) -> Self {
        Self { kind: ApiErrorKind::InternalError(message), request_id }
    }

    /// Map a core error onto the HTTP surface.
    pub fn from_core(request_id: String, err: WordmintError) -> Self {
        match err {
            WordmintError::InvalidInput(msg) => Self::bad_request(request_id, msg),
            WordmintError::NotFound(msg) => Self::not_found(request_id, msg),
            WordmintError::InvalidState(msg) => Self::conflict(request_id, msg),
            WordmintError::InsufficientBalance { .. } => {
                Self::bad_request(request_id, err.to_string())
            }
            WordmintError::Storage(e) => {
                tracing::error!(request_id = %request_id, "Storage error: {}", e);
                Self::internal_error(request_id, "Internal storage error".to_string())
            }
            WordmintError::Configuration(e) => {
                tracing::error!(request_id = %request_id, "Configuration error: {}", e);
                Self::internal_error(request_id, "Internal configuration error".to_string())
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::NotFound(msg) => write!(f, "[{}] Not Found: {}", self.request_id, msg),
            ApiErrorKind::BadRequest(msg) => write!(f, "[{}] Bad Request: {}", self.request_id, msg),
            ApiErrorKind::Conflict(msg) => write!(f, "[{}] Conflict: {}", self.request_id, msg),
            ApiErrorKind::Unauthorized(msg) => {
                write!(f, "[{}] Unauthorized: {}", self.request_id, msg)
            }
            ApiErrorKind::Forbidden(msg) => write!(f, "[{}] Forbidden: {}", self.request_id, msg),
            ApiErrorKind::InternalError(msg) => {
                write!(f, "[{}] Internal Error: {}", self.request_id, msg)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.kind {
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiErrorKind::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiErrorKind::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiErrorKind::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            ApiErrorKind::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ApiErrorKind::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody { code: code.to_string(), message },
        });

        (status, body).into_response()
    }
}
