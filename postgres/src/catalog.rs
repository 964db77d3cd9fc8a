//! `PostgreSQL` product catalog.

use crate::{db_error, decode_error};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use storefront_core::error::StoreError;
use storefront_core::store::{ProductCatalog, StockReservation, StockReturn, StoreFuture};
use storefront_core::types::{Product, ProductId};

/// Product catalog backed by the `products` table.
///
/// The scalar `count_in_stock` and `version` columns are authoritative; the
/// same fields inside the JSONB document are overwritten on read.
#[derive(Clone, Debug)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    /// Create a catalog over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product or replace its document and stock.
    ///
    /// Used for seeding; product writes otherwise belong to the catalog service.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the write fails.
    pub async fn upsert(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO products (id, document, count_in_stock, version)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET document = EXCLUDED.document,
                count_in_stock = EXCLUDED.count_in_stock,
                version = products.version + 1
            ",
        )
        .bind(product.id.as_str())
        .bind(Json(product))
        .bind(to_i32(product.count_in_stock)?)
        .bind(to_i64(product.version)?)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to upsert product"))?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product, StoreError> {
        let Json(mut product): Json<Product> =
            row.try_get("document").map_err(|e| decode_error(&e))?;
        let stock: i32 = row.try_get("count_in_stock").map_err(|e| decode_error(&e))?;
        let version: i64 = row.try_get("version").map_err(|e| decode_error(&e))?;

        product.count_in_stock = u32::try_from(stock).map_err(|_| {
            StoreError::Serialization(format!("Negative stock for product {}", product.id))
        })?;
        product.version = u64::try_from(version).map_err(|_| {
            StoreError::Serialization(format!("Negative version for product {}", product.id))
        })?;
        Ok(product)
    }
}

fn to_i32(quantity: u32) -> Result<i32, StoreError> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::Serialization(format!("Quantity {quantity} out of range")))
}

fn to_i64(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version)
        .map_err(|_| StoreError::Serialization(format!("Version {version} out of range")))
}

impl ProductCatalog for PostgresProductCatalog {
    fn get_product<'a>(&'a self, id: &'a ProductId) -> StoreFuture<'a, Option<Product>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT document, count_in_stock, version FROM products WHERE id = $1",
            )
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load product"))?;

            row.as_ref().map(Self::row_to_product).transpose()
        })
    }

    fn get_products<'a>(&'a self, ids: &'a [ProductId]) -> StoreFuture<'a, Vec<Product>> {
        Box::pin(async move {
            let keys: Vec<String> = ids.iter().map(ToString::to_string).collect();
            let rows = sqlx::query(
                "SELECT document, count_in_stock, version FROM products WHERE id = ANY($1)",
            )
            .bind(keys)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to load products"))?;

            rows.iter().map(Self::row_to_product).collect()
        })
    }

    fn list_products(&self) -> StoreFuture<'_, Vec<Product>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT document, count_in_stock, version FROM products ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list products"))?;

            rows.iter().map(Self::row_to_product).collect()
        })
    }

    fn reserve_stock(&self, reservations: Vec<StockReservation>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(db_error("Failed to start transaction"))?;

            for reservation in &reservations {
                let result = sqlx::query(
                    r"
                    UPDATE products
                    SET count_in_stock = count_in_stock - $2,
                        version = version + 1
                    WHERE id = $1 AND version = $3 AND count_in_stock >= $2
                    ",
                )
                .bind(reservation.product_id.as_str())
                .bind(to_i32(reservation.quantity)?)
                .bind(to_i64(reservation.expected_version)?)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to decrement stock"))?;

                if result.rows_affected() == 0 {
                    let _ = tx.rollback().await;
                    tracing::debug!(
                        product_id = %reservation.product_id,
                        expected_version = reservation.expected_version,
                        "Stock reservation lost a version race"
                    );
                    return Err(StoreError::StockConflict {
                        product_id: reservation.product_id.clone(),
                    });
                }
            }

            tx.commit()
                .await
                .map_err(db_error("Failed to commit stock reservation"))
        })
    }

    fn return_stock(&self, returns: Vec<StockReturn>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(db_error("Failed to start transaction"))?;

            for item in &returns {
                sqlx::query(
                    r"
                    UPDATE products
                    SET count_in_stock = count_in_stock + $2,
                        version = version + 1
                    WHERE id = $1
                    ",
                )
                .bind(item.product_id.as_str())
                .bind(to_i32(item.quantity)?)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to return stock"))?;
            }

            tx.commit()
                .await
                .map_err(db_error("Failed to commit stock return"))
        })
    }
}
