//! Error type system for the shop API
//!
//! This module provides:
//! - A single error enum shared by the store, auth core and handlers
//! - HTTP status code mapping
//! - JSON error bodies carrying the request trace ID

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crate::api::middleware::current_trace_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main error type for the shop API
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    // Startup errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Storage errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    // Request errors
    #[error("Invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    AuthenticationError(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl ShopError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ShopError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShopError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ShopError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            ShopError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ShopError::NotFound(_) => StatusCode::NOT_FOUND,
            ShopError::Conflict(_) => StatusCode::CONFLICT,
            ShopError::InitializationError(_)
            | ShopError::ConfigError(_)
            | ShopError::DatabaseError(_)
            | ShopError::TaskError(_)
            | ShopError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ShopError::InitializationError(_) => "InitializationError",
            ShopError::ConfigError(_) => "ConfigError",
            ShopError::DatabaseError(_) => "DatabaseError",
            ShopError::TaskError(_) => "TaskError",
            ShopError::InternalError(_) => "InternalError",
            ShopError::ValidationError { .. } => "ValidationError",
            ShopError::Conflict(_) => "Conflict",
            ShopError::AuthenticationError(_) => "AuthenticationError",
            ShopError::PermissionDenied(_) => "PermissionDenied",
            ShopError::NotFound(_) => "NotFound",
        }
    }

    /// Message safe to hand back to the client.
    ///
    /// Server-side failures are reported generically; the full error only goes
    /// to the log.
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Structured details attached to the response body, if any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ShopError::ValidationError { field, message } => Some(serde_json::json!({
                "field": field,
                "reason": message,
            })),
            _ => None,
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Trace ID of the failed request, matching its `X-Trace-Id` header
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response tagged with the current request's trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            details: None,
            trace_id: request_trace_id(),
        }
    }

    /// Create an error response from a ShopError
    pub fn from_error(error: &ShopError) -> Self {
        Self {
            error: error.error_type().to_string(),
            message: error.public_message(),
            details: error.details(),
            trace_id: request_trace_id(),
        }
    }
}

/// The request's trace ID, or a fresh one outside request handling
fn request_trace_id() -> String {
    current_trace_id()
        .map(|id| id.0)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

/// Implement IntoResponse for ShopError to enable automatic error handling in Axum
impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::debug!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        let mut response = (status_code, Json(error_response)).into_response();
        if status_code == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type alias for operations that can fail with ShopError
pub type Result<T> = std::result::Result<T, ShopError>;
