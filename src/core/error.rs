//! Typed errors for the user query endpoint
//!
//! The pipeline itself has no failure states of its own. Errors come from its
//! collaborators and are surfaced to HTTP clients through a single JSON
//! envelope:
//!
//! ```json
//! { "code": "rest_forbidden", "message": "...", "details": { "status": 403 } }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors surfaced by the user query endpoint
#[derive(Debug, thiserror::Error)]
pub enum UserQueryError {
    /// The permission hook refused the request
    #[error("Sorry, you are not allowed to do that.")]
    Forbidden,

    /// The query engine failed; never retried
    #[error("User query failed: {message}")]
    Query { message: String },

    /// Configuration could not be loaded or applied
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl UserQueryError {
    /// Wrap a query engine failure, keeping the whole cause chain
    pub fn query(err: anyhow::Error) -> Self {
        UserQueryError::Query {
            message: format!("{:#}", err),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserQueryError::Forbidden => StatusCode::FORBIDDEN,
            UserQueryError::Query { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            UserQueryError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            UserQueryError::Forbidden => "rest_forbidden",
            UserQueryError::Query { .. } => "user_query_failed",
            UserQueryError::Config { .. } => "config_error",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: Some(serde_json::json!({ "status": self.status_code().as_u16() })),
        }
    }
}

impl IntoResponse for UserQueryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<serde_yaml::Error> for UserQueryError {
    fn from(err: serde_yaml::Error) -> Self {
        UserQueryError::Config {
            message: err.to_string(),
        }
    }
}
