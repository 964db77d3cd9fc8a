//! Store traits for catalog, order and user persistence.
//!
//! # Implementations
//!
//! - `Postgres*` (in `storefront-postgres`): JSONB documents in `PostgreSQL`
//! - `InMemory*` (in `storefront-testing`): fast, deterministic tests and local runs
//!
//! # Dyn Compatibility
//!
//! These traits return explicit `Pin<Box<dyn Future>>` instead of using
//! `async fn` so they can be shared as `Arc<dyn ProductCatalog>` and friends.

use crate::error::StoreError;
use crate::types::{Order, OrderId, OrderStatus, Product, ProductId, User, UserId};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// A stock decrement guarded by the product version it was computed against
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockReservation {
    /// Product to decrement
    pub product_id: ProductId,
    /// Units to remove
    pub quantity: u32,
    /// Version observed when stock was checked
    pub expected_version: u64,
}

/// Units to put back on a product
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockReturn {
    /// Product to restock
    pub product_id: ProductId,
    /// Units to add
    pub quantity: u32,
}

/// Read access to products plus the stock mutations the order core owns.
pub trait ProductCatalog: Send + Sync {
    /// Load a single product.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn get_product<'a>(&'a self, id: &'a ProductId) -> StoreFuture<'a, Option<Product>>;

    /// Load several products. Missing ids are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn get_products<'a>(&'a self, ids: &'a [ProductId]) -> StoreFuture<'a, Vec<Product>>;

    /// List the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn list_products(&self) -> StoreFuture<'_, Vec<Product>>;

    /// Apply every decrement or none of them.
    ///
    /// Each reservation succeeds only if the product is still at
    /// `expected_version` and has enough stock; each applied decrement bumps
    /// the product version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StockConflict`] naming the first product whose
    /// version moved, leaving all stock untouched.
    fn reserve_stock(&self, reservations: Vec<StockReservation>) -> StoreFuture<'_, ()>;

    /// Add stock back (compensation for a failed checkout).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn return_stock(&self, returns: Vec<StockReturn>) -> StoreFuture<'_, ()>;
}

/// Persistence for order documents.
pub trait OrderRepository: Send + Sync {
    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id already exists.
    fn insert(&self, order: Order) -> StoreFuture<'_, ()>;

    /// Load an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn get<'a>(&'a self, id: &'a OrderId) -> StoreFuture<'a, Option<Order>>;

    /// All orders, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn list_all(&self) -> StoreFuture<'_, Vec<Order>>;

    /// Orders owned by a user, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn list_by_user<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, Vec<Order>>;

    /// Replace the stored order only if its status is still `expected`.
    ///
    /// Returns `false` when the order is missing or its status moved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn replace_if_status(&self, order: Order, expected: OrderStatus) -> StoreFuture<'_, bool>;

    /// Permanently remove an order. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn delete<'a>(&'a self, id: &'a OrderId) -> StoreFuture<'a, bool>;

    /// Cheap round trip used by readiness checks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend is unreachable.
    fn ping(&self) -> StoreFuture<'_, ()>;
}

/// Read access to user profiles owned by the auth collaborator.
pub trait UserDirectory: Send + Sync {
    /// Load the users with the given ids. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn get_users<'a>(&'a self, ids: &'a [UserId]) -> StoreFuture<'a, Vec<User>>;
}

/// Run a store future with a deadline.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] when the deadline passes, otherwise the
/// future's own result.
pub async fn with_timeout<T, F>(limit: Duration, future: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
