//! Inventory reconciliation.
//!
//! Turns a cart into priced line-item snapshots while committing the stock
//! decrements against the catalog. A reservation is one all-or-nothing
//! compare-and-set over the versions of every product in the cart, made only
//! after the snapshots have been priced. When a concurrent checkout moves a
//! version first, the products are reloaded and the whole reservation is
//! re-validated, re-priced and retried with backoff.

use crate::metrics::record_stock_conflict;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use storefront_core::error::{OrderError, Result, StoreError};
use storefront_core::pricing::{self, PricingConfig};
use storefront_core::retry::{RetryPolicy, retry_with_predicate};
use storefront_core::store::{ProductCatalog, StockReservation, StockReturn, with_timeout};
use storefront_core::types::{
    CartItem, LineItem, PriceBreakdown, Product, ProductId, ShippingAddress,
};

/// Validates and commits stock for checkout.
#[derive(Clone)]
pub struct InventoryReconciler {
    catalog: Arc<dyn ProductCatalog>,
    retry: RetryPolicy,
    timeout: Duration,
}

/// Stock committed for a cart, with the snapshots it was priced from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    /// One snapshot per cart line, in cart order
    pub items: Vec<LineItem>,
    /// Prices computed from `items`
    pub prices: PriceBreakdown,
}

/// Outcome of a single reservation attempt that did not succeed.
#[derive(Debug)]
enum AttemptError {
    /// A product version moved underneath us; reload and retry.
    Conflict(ProductId),
    /// Anything else is final.
    Failed(OrderError),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict(product_id) => write!(f, "stock conflict on product {product_id}"),
            Self::Failed(err) => write!(f, "{err}"),
        }
    }
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StockConflict { product_id } => Self::Conflict(product_id),
            other => Self::Failed(other.into()),
        }
    }
}

impl From<OrderError> for AttemptError {
    fn from(err: OrderError) -> Self {
        Self::Failed(err)
    }
}

impl InventoryReconciler {
    /// Create a reconciler over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            catalog,
            retry,
            timeout,
        }
    }

    /// Price the cart against current catalog snapshots and reserve its stock.
    ///
    /// One line item is produced per cart line, in cart order, carrying the
    /// catalog's name, image and unit price. Quantities for a product that
    /// appears on several lines are summed before checking stock. Stock is
    /// only committed once pricing has succeeded, so a failed reservation
    /// never leaves stock to give back.
    ///
    /// # Errors
    ///
    /// - [`OrderError::InvalidLineItem`] if a quantity is zero, a catalog
    ///   price is negative, or pricing overflows
    /// - [`OrderError::ProductNotFound`] if a product does not exist
    /// - [`OrderError::InsufficientStock`] if a product has too little stock
    /// - [`OrderError::StoreUnavailable`] on store failure, timeout, or when
    ///   version conflicts persist past the retry budget
    pub async fn reserve(
        &self,
        cart: &[CartItem],
        destination: &ShippingAddress,
        pricing: &PricingConfig,
    ) -> Result<Reservation> {
        let requested = aggregate(cart)?;

        retry_with_predicate(
            &self.retry,
            || self.attempt(cart, &requested, destination, pricing),
            |err: &AttemptError| matches!(err, AttemptError::Conflict(_)),
        )
        .await
        .map_err(|err| match err {
            AttemptError::Conflict(product_id) => {
                tracing::warn!(%product_id, "Stock reservation gave up after repeated conflicts");
                OrderError::StoreUnavailable {
                    reason: format!("stock for product {product_id} kept changing concurrently"),
                }
            },
            AttemptError::Failed(err) => err,
        })
    }

    /// Return stock taken by a reservation.
    ///
    /// Used as compensation when a later checkout step fails.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::StoreUnavailable`] if the catalog cannot be updated.
    pub async fn release(&self, items: &[LineItem]) -> Result<()> {
        let mut returns: Vec<StockReturn> = Vec::new();
        for item in items {
            match returns.iter_mut().find(|r| r.product_id == item.product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => returns.push(StockReturn {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                }),
            }
        }
        if returns.is_empty() {
            return Ok(());
        }

        with_timeout(self.timeout, self.catalog.return_stock(returns)).await?;
        tracing::debug!(lines = items.len(), "Released reserved stock");
        Ok(())
    }

    /// Load, validate, price and try to commit the whole reservation once.
    async fn attempt(
        &self,
        cart: &[CartItem],
        requested: &[(ProductId, u32)],
        destination: &ShippingAddress,
        pricing: &PricingConfig,
    ) -> std::result::Result<Reservation, AttemptError> {
        let ids: Vec<ProductId> = requested.iter().map(|(id, _)| id.clone()).collect();
        let products: HashMap<ProductId, Product> =
            with_timeout(self.timeout, self.catalog.get_products(&ids))
                .await?
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect();

        let mut reservations = Vec::with_capacity(requested.len());
        for (product_id, quantity) in requested {
            let product = products
                .get(product_id)
                .ok_or_else(|| OrderError::ProductNotFound {
                    product_id: product_id.clone(),
                })?;

            if product.count_in_stock < *quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: *quantity,
                    available: product.count_in_stock,
                }
                .into());
            }

            reservations.push(StockReservation {
                product_id: product_id.clone(),
                quantity: *quantity,
                expected_version: product.version,
            });
        }

        let items = snapshot(cart, &products)?;
        let prices = pricing::price(&items, destination, pricing)?;

        match with_timeout(self.timeout, self.catalog.reserve_stock(reservations)).await {
            Ok(()) => Ok(Reservation { items, prices }),
            Err(StoreError::StockConflict { product_id }) => {
                record_stock_conflict();
                tracing::debug!(%product_id, "Stock version moved, reloading");
                Err(AttemptError::Conflict(product_id))
            },
            Err(err) => Err(err.into()),
        }
    }
}

/// One catalog snapshot per cart line.
fn snapshot(cart: &[CartItem], products: &HashMap<ProductId, Product>) -> Result<Vec<LineItem>> {
    cart.iter()
        .map(|line| {
            products
                .get(&line.product_id)
                .map(|product| LineItem::snapshot(product, line.quantity))
                .ok_or_else(|| OrderError::ProductNotFound {
                    product_id: line.product_id.clone(),
                })
        })
        .collect()
}

/// Sum quantities per product, keeping first-seen order.
fn aggregate(cart: &[CartItem]) -> Result<Vec<(ProductId, u32)>> {
    let mut totals: Vec<(ProductId, u32)> = Vec::new();
    for line in cart {
        if line.quantity < 1 {
            return Err(OrderError::InvalidLineItem {
                product_id: line.product_id.clone(),
                reason: "quantity must be at least 1".to_string(),
            });
        }
        match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(line.quantity)
                    .ok_or_else(|| OrderError::InvalidLineItem {
                        product_id: line.product_id.clone(),
                        reason: "quantity overflows".to_string(),
                    })?;
            },
            None => totals.push((line.product_id.clone(), line.quantity)),
        }
    }
    Ok(totals)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use storefront_core::types::Money;
    use storefront_testing::InMemoryProductCatalog;
    use storefront_testing::fixtures::{ProductBuilder, sample_address};

    fn reconciler(catalog: &InMemoryProductCatalog, max_retries: usize) -> InventoryReconciler {
        InventoryReconciler::new(
            Arc::new(catalog.clone()),
            RetryPolicy::builder()
                .max_retries(max_retries)
                .initial_delay(Duration::from_millis(1))
                .max_delay(Duration::from_millis(2))
                .build(),
            Duration::from_secs(1),
        )
    }

    async fn reserve(reconciler: &InventoryReconciler, cart: &[CartItem]) -> Result<Reservation> {
        reconciler
            .reserve(cart, &sample_address(), &PricingConfig::default())
            .await
    }

    fn catalog() -> InMemoryProductCatalog {
        InMemoryProductCatalog::with_products([
            ProductBuilder::new("p-1").name("Airpods").price_cents(5000).stock(5).build(),
            ProductBuilder::new("p-2").price_cents(1999).stock(1).build(),
        ])
    }

    #[tokio::test]
    async fn reserve_snapshots_catalog_and_decrements() {
        let catalog = catalog();
        let Reservation { items, prices } =
            reserve(&reconciler(&catalog, 3), &[CartItem::new("p-1", 2), CartItem::new("p-2", 1)])
                .await
                .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(prices.items_price, Money::from_cents(11_999));
        assert_eq!(items[0].name, "Airpods");
        assert_eq!(items[0].unit_price, Money::from_cents(5000));
        assert_eq!(items[1].quantity, 1);
        assert_eq!(catalog.stock_of("p-1"), Some(3));
        assert_eq!(catalog.stock_of("p-2"), Some(0));
    }

    #[tokio::test]
    async fn repeated_lines_are_summed_before_checking() {
        let catalog = catalog();
        let err = reserve(&reconciler(&catalog, 3), &[CartItem::new("p-1", 3), CartItem::new("p-1", 3)])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            OrderError::InsufficientStock {
                product_id: ProductId::new("p-1"),
                requested: 6,
                available: 5,
            }
        );
        assert_eq!(catalog.stock_of("p-1"), Some(5));
    }

    #[tokio::test]
    async fn missing_product_fails_without_touching_stock() {
        let catalog = catalog();
        let err = reserve(&reconciler(&catalog, 3), &[CartItem::new("p-1", 1), CartItem::new("ghost", 1)])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            OrderError::ProductNotFound {
                product_id: ProductId::new("ghost")
            }
        );
        assert_eq!(catalog.stock_of("p-1"), Some(5));
    }

    #[tokio::test]
    async fn zero_quantity_is_invalid() {
        let err = reserve(&reconciler(&catalog(), 3), &[CartItem::new("p-1", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidLineItem { .. }));
    }

    #[tokio::test]
    async fn conflicts_are_retried() {
        let catalog = catalog();
        catalog.force_conflicts(2);

        let reservation = reserve(&reconciler(&catalog, 3), &[CartItem::new("p-1", 1)])
            .await
            .unwrap();

        assert_eq!(reservation.items.len(), 1);
        assert_eq!(catalog.stock_of("p-1"), Some(4));
    }

    #[tokio::test]
    async fn persistent_conflicts_become_unavailable() {
        let catalog = catalog();
        catalog.force_conflicts(10);

        let err = reserve(&reconciler(&catalog, 2), &[CartItem::new("p-1", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::StoreUnavailable { .. }));
        assert_eq!(catalog.stock_of("p-1"), Some(5));
    }

    #[tokio::test]
    async fn release_restores_stock() {
        let catalog = catalog();
        let reconciler = reconciler(&catalog, 3);
        let reservation = reserve(&reconciler, &[CartItem::new("p-1", 2), CartItem::new("p-1", 1)])
            .await
            .unwrap();
        assert_eq!(catalog.stock_of("p-1"), Some(2));

        reconciler.release(&reservation.items).await.unwrap();
        assert_eq!(catalog.stock_of("p-1"), Some(5));
    }

    #[tokio::test]
    async fn pricing_failure_commits_no_stock() {
        let catalog = catalog();
        catalog.insert(ProductBuilder::new("p-bad").price_cents(-100).stock(3).build());

        let err = reserve(
            &reconciler(&catalog, 3),
            &[CartItem::new("p-1", 1), CartItem::new("p-bad", 1)],
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InvalidLineItem { ref product_id, .. } if product_id.as_str() == "p-bad"
        ));
        assert_eq!(catalog.stock_of("p-1"), Some(5));
        assert_eq!(catalog.stock_of("p-bad"), Some(3));
        assert_eq!(catalog.version_of("p-1"), Some(0));
    }
}
