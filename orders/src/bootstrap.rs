//! Resource setup for the server.
//!
//! Store handles are built once at startup and passed down explicitly.
//! With `DATABASE_URL` set the stores are `PostgreSQL` backed (migrations run
//! on connect); without it the server runs on in-memory stores seeded with a
//! demo catalog and demo users.

use crate::auth::{Authenticator, StaticTokenAuthenticator};
use crate::catalog::CatalogQueries;
use crate::checkout::{CheckoutEnvironment, CheckoutService};
use crate::config::Config;
use crate::server::AppState;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::environment::{SystemClock, UuidGenerator};
use storefront_core::error::StoreError;
use storefront_core::store::{OrderRepository, ProductCatalog, UserDirectory};
use storefront_postgres::{
    PoolSettings, PostgresOrderRepository, PostgresProductCatalog, PostgresUserDirectory,
};
use storefront_testing::fixtures::{demo_catalog, demo_users};
use storefront_testing::{InMemoryOrderRepository, InMemoryProductCatalog, InMemoryUserDirectory};
use tracing::{info, warn};

/// Store handles shared by the whole process.
#[derive(Clone)]
pub struct Resources {
    /// Product catalog
    pub catalog: Arc<dyn ProductCatalog>,
    /// Order documents
    pub orders: Arc<dyn OrderRepository>,
    /// Customer lookup
    pub users: Arc<dyn UserDirectory>,
    /// Database pool, `None` for in-memory stores
    pub pool: Option<PgPool>,
}

impl Resources {
    /// Connect to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be reached or migrated.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        match &config.database.url {
            Some(url) => Self::postgres(url, config).await,
            None => {
                warn!("DATABASE_URL not set, using in-memory stores with demo data");
                Ok(Self::in_memory())
            },
        }
    }

    async fn postgres(url: &str, config: &Config) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL...");
        let pool = storefront_postgres::connect(
            url,
            &PoolSettings {
                max_connections: config.database.max_connections,
                connect_timeout: Duration::from_secs(config.database.connect_timeout),
            },
        )
        .await?;
        info!("✓ Connected to PostgreSQL");

        info!("Running migrations...");
        storefront_postgres::migrate(&pool).await?;
        info!("✓ Migrations complete");

        Ok(Self {
            catalog: Arc::new(PostgresProductCatalog::new(pool.clone())),
            orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
            users: Arc::new(PostgresUserDirectory::new(pool.clone())),
            pool: Some(pool),
        })
    }

    /// In-memory stores seeded with the demo catalog and users.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryProductCatalog::with_products(demo_catalog())),
            orders: Arc::new(InMemoryOrderRepository::new()),
            users: Arc::new(InMemoryUserDirectory::with_users(demo_users())),
            pool: None,
        }
    }

    /// Wire the HTTP application state.
    #[must_use]
    pub fn app_state(&self, config: &Config) -> AppState {
        let checkout = CheckoutService::new(
            CheckoutEnvironment {
                catalog: Arc::clone(&self.catalog),
                orders: Arc::clone(&self.orders),
                users: Arc::clone(&self.users),
                clock: Arc::new(SystemClock),
                ids: Arc::new(UuidGenerator),
            },
            &config.checkout,
        );
        let catalog = CatalogQueries::new(Arc::clone(&self.catalog), config.checkout.store_timeout());

        let authenticator = StaticTokenAuthenticator::new(config.auth.tokens.clone());
        if authenticator.is_empty() {
            warn!("AUTH_TOKENS is empty, every authenticated endpoint will answer 401");
        }
        let authenticator: Arc<dyn Authenticator> = Arc::new(authenticator);

        AppState::new(checkout, catalog, Arc::clone(&self.orders), authenticator)
            .with_cors_origins(config.server.cors_origins.clone())
    }

    /// Close the database pool, if any.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            info!("Closing database pool...");
            pool.close().await;
        }
    }
}
