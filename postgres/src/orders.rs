//! `PostgreSQL` order repository.

use crate::{db_error, decode_error};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use storefront_core::error::StoreError;
use storefront_core::store::{OrderRepository, StoreFuture};
use storefront_core::types::{Order, OrderId, OrderStatus, UserId};

/// Order repository backed by the `orders` table.
#[derive(Clone, Debug)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: &PgRow) -> Result<Order, StoreError> {
        let Json(order): Json<Order> = row.try_get("document").map_err(|e| decode_error(&e))?;
        Ok(order)
    }
}

impl OrderRepository for PostgresOrderRepository {
    fn insert(&self, order: Order) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO orders (id, user_id, status, created_at, document)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order.id.as_str())
            .bind(order.user_id.as_str())
            .bind(order.status().as_str())
            .bind(order.created_at)
            .bind(Json(&order))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return StoreError::Duplicate(order.id.to_string());
                    }
                }
                StoreError::Database(format!("Failed to insert order: {e}"))
            })?;
            Ok(())
        })
    }

    fn get<'a>(&'a self, id: &'a OrderId) -> StoreFuture<'a, Option<Order>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to load order"))?;

            row.as_ref().map(Self::row_to_order).transpose()
        })
    }

    fn list_all(&self) -> StoreFuture<'_, Vec<Order>> {
        Box::pin(async move {
            let rows = sqlx::query("SELECT document FROM orders ORDER BY created_at DESC, id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to list orders"))?;

            rows.iter().map(Self::row_to_order).collect()
        })
    }

    fn list_by_user<'a>(&'a self, user_id: &'a UserId) -> StoreFuture<'a, Vec<Order>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT document FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
            )
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list user orders"))?;

            rows.iter().map(Self::row_to_order).collect()
        })
    }

    fn replace_if_status(&self, order: Order, expected: OrderStatus) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE orders
                SET status = $2,
                    document = $3
                WHERE id = $1 AND status = $4
                ",
            )
            .bind(order.id.as_str())
            .bind(order.status().as_str())
            .bind(Json(&order))
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update order"))?;

            Ok(result.rows_affected() == 1)
        })
    }

    fn delete<'a>(&'a self, id: &'a OrderId) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to delete order"))?;

            Ok(result.rows_affected() == 1)
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(db_error("Database unreachable"))?;
            Ok(())
        })
    }
}
