//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every error renders
//! as a JSON `{ "code", "message" }` body; server errors are logged with their
//! internal source, which never reaches the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use storefront_core::error::OrderError;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```
/// use storefront_web::AppError;
/// use axum::http::StatusCode;
///
/// let err = AppError::not_found("Order", "order-42");
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// assert_eq!(err.code(), "NOT_FOUND");
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

    fn coded(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self::new(status, message.into(), code.to_string())
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::coded(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::coded(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::coded(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::coded(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} with id {id} not found"),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::coded(StatusCode::CONFLICT, "CONFLICT", message)
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::coded(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::coded(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::coded(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            message,
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
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed with server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed with server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Map order failures onto status codes.
///
/// | Error | Status |
/// |---|---|
/// | `OrderNotFound`, `ProductNotFound` | 404 |
/// | `AlreadyPaid`, `AlreadyDelivered`, `NotYetPaid`, `InsufficientStock` | 409 |
/// | `EmptyCart`, `InvalidLineItem`, `InvalidPaymentEvidence` | 422 |
/// | `Forbidden` | 403 |
/// | `StoreUnavailable` | 503 |
impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::OrderNotFound { .. } => {
                Self::coded(StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", message)
            },
            OrderError::ProductNotFound { .. } => {
                Self::coded(StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND", message)
            },
            OrderError::AlreadyPaid { .. } => {
                Self::coded(StatusCode::CONFLICT, "ALREADY_PAID", message)
            },
            OrderError::AlreadyDelivered { .. } => {
                Self::coded(StatusCode::CONFLICT, "ALREADY_DELIVERED", message)
            },
            OrderError::NotYetPaid { .. } => {
                Self::coded(StatusCode::CONFLICT, "NOT_YET_PAID", message)
            },
            OrderError::InsufficientStock { .. } => {
                Self::coded(StatusCode::CONFLICT, "INSUFFICIENT_STOCK", message)
            },
            OrderError::EmptyCart => {
                Self::coded(StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_CART", message)
            },
            OrderError::InvalidLineItem { .. } => {
                Self::coded(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_LINE_ITEM", message)
            },
            OrderError::InvalidPaymentEvidence { .. } => Self::coded(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_PAYMENT_EVIDENCE",
                message,
            ),
            OrderError::Forbidden { .. } => Self::coded(StatusCode::FORBIDDEN, "FORBIDDEN", message),
            OrderError::StoreUnavailable { reason } => {
                Self::unavailable("Service temporarily unavailable")
                    .with_source(anyhow::anyhow!(reason))
            },
        }
    }
}
