//! `PostgreSQL` document stores for the storefront.
//!
//! Implements the store traits from `storefront-core` on top of sqlx:
//!
//! - [`PostgresProductCatalog`]: products as JSONB documents with scalar
//!   `count_in_stock` and `version` columns for compare-and-set decrements
//! - [`PostgresOrderRepository`]: orders as JSONB documents with scalar
//!   `status`, `user_id` and `created_at` columns
//! - [`PostgresUserDirectory`]: read-only user profiles
//!
//! Every call borrows a pooled connection for a single statement or
//! transaction and returns it immediately.
//!
//! # Example
//!
//! ```no_run
//! use storefront_postgres::{PoolSettings, PostgresOrderRepository, connect, migrate};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect("postgres://localhost/storefront", &PoolSettings::default()).await?;
//! migrate(&pool).await?;
//! let orders = PostgresOrderRepository::new(pool);
//! # Ok(())
//! # }
//! ```

mod catalog;
mod orders;
mod users;

pub use catalog::PostgresProductCatalog;
pub use orders::PostgresOrderRepository;
pub use users::PostgresUserDirectory;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use storefront_core::error::StoreError;

/// Connection pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long to wait for a connection
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the database cannot be reached.
pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))
}

/// Run the bundled schema migrations.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Database(format!("{context}: {e}"))
}

fn decode_error(e: &sqlx::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}
