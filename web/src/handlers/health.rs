//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use storefront_core::store::OrderRepository;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Readiness {
    /// `ready` or `unavailable`
    pub status: &'static str,
    /// Why the service is not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Readiness check (order store reachability).
///
/// # Status Codes
///
/// - 200 OK: the order store answered
/// - 503 Service Unavailable: the order store failed
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness_check(
    State(orders): State<Arc<dyn OrderRepository>>,
) -> (StatusCode, Json<Readiness>) {
    match orders.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Readiness {
                status: "ready",
                reason: None,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    status: "unavailable",
                    reason: Some(err.to_string()),
                }),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_testing::InMemoryOrderRepository;

    #[tokio::test]
    async fn liveness_is_ok() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn readiness_follows_store() {
        let repo = InMemoryOrderRepository::new();
        let orders: Arc<dyn OrderRepository> = Arc::new(repo.clone());

        let (status, Json(body)) = readiness_check(State(Arc::clone(&orders))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");

        repo.set_unavailable(true);
        let (status, Json(body)) = readiness_check(State(orders)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.reason.is_some());
    }
}
