//! Error types for the dispatch pipeline.
//!
//! [`AppError`] is the HTTP-facing error: it knows its status code and renders
//! itself through Axum's `IntoResponse`. Strategy rejections, handler errors
//! and pipeline failures all end up here unless an endpoint maps them first.

use axum::{
    Json,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use rest_toolkit_auth::Unauthorized;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Application error type for endpoint dispatch.
///
/// Handlers and middleware may return an `AppError` (wrapped in
/// `anyhow::Error`) to answer with a specific status, e.g.
/// [`AppError::forbidden`].
///
/// # Examples
///
/// ```ignore
/// fn get_task(request: &ApiRequest) -> anyhow::Result<Outcome> {
///     let id: u64 = request.param("task_id")?;
///     let task = find(id).ok_or_else(|| AppError::not_found("Task", id))?;
///     Ok(Reply::from_value(&task)?.into())
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 413 Payload Too Large error.
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            message.into(),
            "PAYLOAD_TOO_LARGE".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<Unauthorized> for AppError {
    fn from(_: Unauthorized) -> Self {
        Self::unauthorized("Authentication required")
    }
}

/// Convert `anyhow::Error` to `AppError`.
///
/// An `AppError` or `Unauthorized` travelling inside the `anyhow::Error` keeps
/// its meaning; anything else is an internal error.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<Self>() {
            Ok(app_error) => return app_error,
            Err(err) => err,
        };
        if let Some(unauthorized) = err.downcast_ref::<Unauthorized>() {
            return Self::from(*unauthorized);
        }
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Errors raised while building an [`Api`](crate::Api) route table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The same method and path were registered twice.
    #[error("Route {method} {path} is already registered")]
    DuplicateRoute {
        /// Conflicting method
        method: Method,
        /// Full path including the version prefix
        path: String,
    },

    /// Axum cannot route this method.
    #[error("Method {0} cannot be routed")]
    UnsupportedMethod(Method),

    /// The endpoint was built without any HTTP method.
    #[error("Endpoint {0} has no HTTP methods")]
    EmptyMethods(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Task", "7");
        assert_eq!(err.to_string(), "[NOT_FOUND] Task with id 7 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let err = AppError::from(Unauthorized);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_anyhow_keeps_app_error() {
        let err = AppError::from(anyhow::Error::new(AppError::forbidden("nope")));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_anyhow_keeps_unauthorized() {
        let err = AppError::from(anyhow::Error::new(Unauthorized));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_anyhow_other_errors_are_internal() {
        let err = AppError::from(anyhow::Error::new(Boom));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::forbidden("nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
