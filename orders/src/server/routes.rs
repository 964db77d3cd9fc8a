//! Router configuration for the storefront.

use super::state::AppState;
use crate::api::{orders, products};
use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, put},
};
use std::time::Duration;
use storefront_web::handlers::{health_check, readiness_check};
use storefront_web::correlation_id_layer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Lets browsers read the correlation id echoed by the middleware.
const EXPOSED_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Build the complete Axum router.
///
/// - `/health`, `/ready` (no authentication)
/// - `/api/orders/...` (bearer authentication)
/// - `/api/products/...` (public, read-only)
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Orders
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/orders/mine", get(orders::list_my_orders))
        .route(
            "/orders/:id",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/orders/:id/pay", put(orders::pay_order))
        .route("/orders/:id/deliver", put(orders::mark_delivered))
        // Catalog (read-only)
        .route("/products", get(products::list_products))
        .route("/products/:id", get(products::get_product));

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([EXPOSED_CORRELATION_ID])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(correlation_id_layer())
        .with_state(state)
}

fn allowed_origins(origins: &[HeaderValue]) -> AllowOrigin {
    if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    }
}
