// HTTP API Error Types
use axum::{extract::rejection::QueryRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StoreError;
use crate::services::ServiceError;
use crate::validation::Issue;

/// Generic message returned for unexpected failures outside development
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Returned when query parameters do not deserialize
pub const INVALID_QUERY_MESSAGE: &str = "Invalid query parameters";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest {
        message: String,
        details: Option<Vec<Issue>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error (message is the real cause, only shown in development)
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the underlying message (not necessarily client-safe for 500s)
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Message shown to the caller. Known kinds are surfaced verbatim; internal
    /// failures only when `expose_internal` is set.
    pub fn public_message(&self, expose_internal: bool) -> &str {
        match self {
            ApiError::InternalServerError(msg) if expose_internal => msg,
            ApiError::InternalServerError(_) => INTERNAL_ERROR_MESSAGE,
            other => other.message(),
        }
    }

    /// Get error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body: `{ error, details? }`
    pub fn to_json(&self, expose_internal: bool) -> Value {
        let mut body = json!({ "error": self.public_message(expose_internal) });
        if let ApiError::BadRequest { details: Some(details), .. } = self {
            body["details"] = json!(details);
        }
        body
    }

    fn log(&self) {
        match self {
            ApiError::InternalServerError(msg) => {
                tracing::error!(code = self.error_code(), "request failed: {}", msg);
            }
            ApiError::BadRequest { details: Some(details), .. } => {
                tracing::warn!(code = self.error_code(), issues = details.len(), "{}", self.message());
            }
            _ => {
                tracing::warn!(code = self.error_code(), "{}", self.message());
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_failed(details: Vec<Issue>) -> Self {
        ApiError::BadRequest {
            message: "Validation failed".to_string(),
            details: Some(details),
        }
    }

    pub fn invalid_json() -> Self {
        ApiError::bad_request("Invalid JSON body")
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert other error types to ApiError
impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        tracing::debug!("query rejected: {}", err.body_text());
        ApiError::bad_request(INVALID_QUERY_MESSAGE)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Store(store_err) => store_err.into(),
            ServiceError::Reorder { failed } => ApiError::internal_server_error(format!(
                "Failed to reorder sections: {}",
                failed
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum. Runs inside the request span,
// so the log line carries method and path.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        let body = self.to_json(crate::config::config().expose_internal_errors());
        (self.status_code(), Json(body)).into_response()
    }
}
