//! In-memory store implementations.
//!
//! Provides fast, deterministic backends for tests and for running the server
//! without a database:
//! - [`InMemoryProductCatalog`]: `HashMap` catalog with versioned stock
//! - [`InMemoryOrderRepository`]: `HashMap` order documents with failure injection
//! - [`InMemoryUserDirectory`]: `HashMap` user profiles
//!
//! Each store guards its map with a single lock, so a compare-and-set over many
//! products happens under one write guard and is atomic.

use storefront_core::error::StoreError;
use storefront_core::store::{
    OrderRepository, ProductCatalog, StockReservation, StockReturn, StoreFuture, UserDirectory,
};
use storefront_core::types::{Order, OrderId, OrderStatus, Product, ProductId, User, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory product catalog.
///
/// # Example
///
/// ```
/// use storefront_testing::InMemoryProductCatalog;
/// use storefront_testing::fixtures::ProductBuilder;
///
/// let catalog = InMemoryProductCatalog::with_products([
///     ProductBuilder::new("p-1").price_cents(5000).stock(3).build(),
/// ]);
/// assert_eq!(catalog.stock_of("p-1"), Some(3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    forced_conflicts: Arc<AtomicUsize>,
}

impl InMemoryProductCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given products
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.insert(product);
        }
        catalog
    }

    /// Insert or replace a product
    pub fn insert(&self, product: Product) {
        write(&self.products).insert(product.id.clone(), product);
    }

    /// Current stock of a product, `None` if it does not exist
    #[must_use]
    pub fn stock_of(&self, id: &str) -> Option<u32> {
        read(&self.products)
            .get(&ProductId::new(id))
            .map(|product| product.count_in_stock)
    }

    /// Current version of a product
    #[must_use]
    pub fn version_of(&self, id: &str) -> Option<u64> {
        read(&self.products)
            .get(&ProductId::new(id))
            .map(|product| product.version)
    }

    /// Make the next `count` reservations fail with a stock conflict.
    ///
    /// Useful for exercising retry and exhaustion paths.
    pub fn force_conflicts(&self, count: usize) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn apply_reservations(&self, reservations: &[StockReservation]) -> Result<(), StoreError> {
        let mut products = write(&self.products);

        let mut requested: HashMap<&ProductId, u32> = HashMap::new();
        for reservation in reservations {
            let total = requested.entry(&reservation.product_id).or_default();
            *total = total.saturating_add(reservation.quantity);
        }

        for reservation in reservations {
            let wanted = requested.get(&reservation.product_id).copied().unwrap_or(0);
            let fits = products.get(&reservation.product_id).is_some_and(|product| {
                product.version == reservation.expected_version && product.count_in_stock >= wanted
            });
            if !fits {
                return Err(StoreError::StockConflict {
                    product_id: reservation.product_id.clone(),
                });
            }
        }

        for reservation in reservations {
            if let Some(product) = products.get_mut(&reservation.product_id) {
                product.count_in_stock = product.count_in_stock.saturating_sub(reservation.quantity);
                product.version += 1;
            }
        }

        Ok(())
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get_product<'a>(&'a self, id: &'a ProductId) -> StoreFuture<'a, Option<Product>> {
        Box::pin(async move { Ok(read(&self.products).get(id).cloned()) })
    }

    fn get_products<'a>(&'a self, ids: &'a [ProductId]) -> StoreFuture<'a, Vec<Product>> {
        Box::pin(async move {
            let products = read(&self.products);
            Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
        })
    }

    fn list_products(&self) -> StoreFuture<'_, Vec<Product>> {
        Box::pin(async move {
            let mut products: Vec<Product> = read(&self.products).values().cloned().collect();
            products.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(products)
        })
    }

    fn reserve_stock(&self, reservations: Vec<StockReservation>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if self.take_forced_conflict() {
                let product_id = reservations
                    .first()
                    .map_or_else(|| ProductId::new(""), |r| r.product_id.clone());
                return Err(StoreError::StockConflict { product_id });
            }
            self.apply_reservations(&reservations)
        })
    }

    fn return_stock(&self, returns: Vec<StockReturn>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut products = write(&self.products);
            for item in returns {
                if let Some(product) = products.get_mut(&item.product_id) {
                    product.count_in_stock = product.count_in_stock.saturating_add(item.quantity);
                    product.version += 1;
                }
            }
            Ok(())
        })
    }
}

/// In-memory order repository.
///
/// Supports failure injection: [`set_unavailable`](Self::set_unavailable)
/// makes every call fail, [`set_latency`](Self::set_latency) delays every call.
#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    unavailable: Arc<AtomicBool>,
    latency_ms: Arc<AtomicU64>,
}

impl InMemoryOrderRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.orders).len()
    }

    /// Whether no orders are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.orders).is_empty()
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent call
    #[allow(clippy::cast_possible_truncation)] // test latencies are far below u64::MAX ms
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn gate(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "order store is unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: Order) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.gate().await?;
            let mut orders = write(&self.orders);
            if orders.contains_key(&order.id) {
                return Err(StoreError::Duplicate(order.id.to_string()));
            }
            orders.insert(order.id.clone(), order);
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a OrderId) -> StoreFuture<'a, Option<Order>> {
        Box::pin(async move {
            self.gate().await?;
            Ok(read(&self.orders).get(id).cloned())
        })
    }

    fn list_all(&self) -> StoreFuture<'_, Vec<Order>> {
        Box::pin(async move {
            self.gate().await?;
            Ok(read(&self.orders).values().cloned().collect())
        })
    }

    fn list_by_user<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, Vec<Order>> {
        Box::pin(async move {
            self.gate().await?;
            Ok(read(&self.orders)
                .values()
                .filter(|order| &order.user_id == user_id)
                .cloned()
                .collect())
        })
    }

    fn replace_if_status(&self, order: Order, expected: OrderStatus) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.gate().await?;
            let mut orders = write(&self.orders);
            match orders.get_mut(&order.id) {
                Some(stored) if stored.status() == expected => {
                    *stored = order;
                    Ok(true)
                },
                _ => Ok(false),
            }
        })
    }

    fn delete<'a>(&'a self, id: &'a OrderId) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.gate().await?;
            Ok(write(&self.orders).remove(id).is_some())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.gate().await })
    }
}

/// In-memory user directory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding the given users
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.insert(user);
        }
        directory
    }

    /// Insert or replace a user
    pub fn insert(&self, user: User) {
        write(&self.users).insert(user.id.clone(), user);
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get_users<'a>(&'a self, ids: &'a [UserId]) -> StoreFuture<'a, Vec<User>> {
        Box::pin(async move {
            let users = read(&self.users);
            Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
        })
    }
}
