//! Axum integration for the storefront.
//!
//! The order core is a set of plain async functions over injected stores; this
//! crate is the imperative shell's shared vocabulary:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, bearer tokens
//! │  - Request parsing (ApiJson)            │  ← Correlation ids, tracing
//! │  - Error mapping (AppError)             │  ← Health and readiness
//! ├─────────────────────────────────────────┤
//! │         Order Core                      │
//! │  - Pricing, lifecycle rules             │  ← Pure, testable in memory
//! │  - Store traits                         │  ← Postgres or in-memory
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Middleware** assigns a correlation id and opens an `http_request` span
//! 2. **Extractors** authenticate the bearer token and parse the JSON body
//! 3. **Handler** calls the order service
//! 4. **`OrderError`** converts into [`AppError`] with the matching status code
//! 5. **Response** is serialized as JSON

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
