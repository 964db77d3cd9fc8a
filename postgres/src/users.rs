//! `PostgreSQL` user directory.

use crate::{db_error, decode_error};
use sqlx::{PgPool, Row};
use storefront_core::error::StoreError;
use storefront_core::store::{StoreFuture, UserDirectory};
use storefront_core::types::{User, UserId};

/// Read-only view over the `users` table.
///
/// Password hashes stay in the table; only profile columns are selected.
#[derive(Clone, Debug)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Create a directory over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user profile or update its name, email and admin flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the email belongs to another user.
    pub async fn upsert(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, is_admin)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                is_admin = EXCLUDED.is_admin
            ",
        )
        .bind(user.id.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_admin)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return StoreError::Duplicate(user.email.clone());
                }
            }
            StoreError::Database(format!("Failed to upsert user: {e}"))
        })?;
        Ok(())
    }
}

impl UserDirectory for PostgresUserDirectory {
    fn get_users<'a>(&'a self, ids: &'a [UserId]) -> StoreFuture<'a, Vec<User>> {
        Box::pin(async move {
            let keys: Vec<String> = ids.iter().map(ToString::to_string).collect();
            let rows = sqlx::query("SELECT id, name, email, is_admin FROM users WHERE id = ANY($1)")
                .bind(keys)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to load users"))?;

            rows.iter()
                .map(|row| {
                    Ok(User {
                        id: UserId::new(row.try_get::<String, _>("id").map_err(|e| decode_error(&e))?),
                        name: row.try_get("name").map_err(|e| decode_error(&e))?,
                        email: row.try_get("email").map_err(|e| decode_error(&e))?,
                        is_admin: row.try_get("is_admin").map_err(|e| decode_error(&e))?,
                    })
                })
                .collect()
        })
    }
}
