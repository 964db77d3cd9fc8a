//! Application state for the storefront HTTP server.
//!
//! Holds the services handlers call into and the handles extractors and the
//! readiness probe pull out through [`FromRef`].

use crate::auth::Authenticator;
use crate::catalog::CatalogQueries;
use crate::checkout::CheckoutService;
use axum::extract::FromRef;
use axum::http::HeaderValue;
use std::sync::Arc;
use storefront_core::store::OrderRepository;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Order lifecycle operations
    pub checkout: CheckoutService,

    /// Read-only product queries
    pub catalog: CatalogQueries,

    /// Order store, probed by the readiness check
    pub orders: Arc<dyn OrderRepository>,

    /// Bearer token resolution
    pub authenticator: Arc<dyn Authenticator>,

    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<HeaderValue>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        checkout: CheckoutService,
        catalog: CatalogQueries,
        orders: Arc<dyn OrderRepository>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            checkout,
            catalog,
            orders,
            authenticator,
            cors_origins: Vec::new(),
        }
    }

    /// Allow cross-origin browser requests from these origins.
    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<HeaderValue>) -> Self {
        self.cors_origins = origins;
        self
    }
}

impl FromRef<AppState> for Arc<dyn Authenticator> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.authenticator)
    }
}

impl FromRef<AppState> for Arc<dyn OrderRepository> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.orders)
    }
}
