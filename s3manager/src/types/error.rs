//! Universal error handling for the HTTP surface

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StorageError;

/// API error response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(
        status: StatusCode,
        code: &'static str,
        msg: impl Into<String>,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code,
                    message: msg.into(),
                },
            },
        }
    }

    /// A 400 response for malformed client input
    #[must_use]
    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg, false)
    }

    /// A non-retryable 500 response
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, false)
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        match err {
            JsonRejection::MissingJsonContentType(_) => Self::bad_request(
                "invalid_content_type",
                "Missing Content-Type: application/json header",
            ),
            other => Self::bad_request("invalid_json", other.body_text()),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        Self::internal(format!("error rendering template: {err}"))
    }
}

/// Convert storage errors to application errors
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        use StorageError::{
            AccessDenied, Config, Conflict, Decode, InvalidInput, NotFound, S3Error, Transport,
            UpstreamError,
        };

        let message = err.to_string();
        match err {
            NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", message, false),
            Conflict(_) => Self::new(StatusCode::CONFLICT, "conflict", message, false),
            AccessDenied(_) => Self::new(StatusCode::FORBIDDEN, "access_denied", message, false),
            InvalidInput(_) => Self::bad_request("invalid_input", message),
            UpstreamError(_) | Transport(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_error",
                message,
                true,
            ),
            S3Error(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                true,
            ),
            Config(_) | Decode(_) => Self::internal(message),
        }
    }
}
