//! Read-only catalog queries served to shoppers.

use std::sync::Arc;
use std::time::Duration;
use storefront_core::error::{OrderError, Result};
use storefront_core::store::{ProductCatalog, with_timeout};
use storefront_core::types::{Product, ProductId};

/// Product lookups with the store timeout applied.
#[derive(Clone)]
pub struct CatalogQueries {
    catalog: Arc<dyn ProductCatalog>,
    timeout: Duration,
}

impl CatalogQueries {
    /// Create a query facade over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    /// Every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::StoreUnavailable`] on store failure or timeout.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(with_timeout(self.timeout, self.catalog.list_products()).await?)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// - [`OrderError::ProductNotFound`] if the id does not resolve
    /// - [`OrderError::StoreUnavailable`] on store failure or timeout
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product> {
        with_timeout(self.timeout, self.catalog.get_product(product_id))
            .await?
            .ok_or_else(|| OrderError::ProductNotFound {
                product_id: product_id.clone(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use storefront_testing::InMemoryProductCatalog;
    use storefront_testing::fixtures::demo_catalog;

    #[tokio::test]
    async fn lists_and_fetches_products() {
        let queries = CatalogQueries::new(
            Arc::new(InMemoryProductCatalog::with_products(demo_catalog())),
            Duration::from_secs(1),
        );

        let products = queries.list_products().await.unwrap();
        assert_eq!(products.len(), 6);

        let airpods = queries.get_product(&ProductId::new("airpods")).await.unwrap();
        assert_eq!(airpods.count_in_stock, 10);

        let err = queries.get_product(&ProductId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound { .. }));
    }
}
