//! Cart repository.

use sqlx::{PgConnection, PgPool};

use avoi_core::{CartItemId, UserId, VariantId};

use super::RepositoryError;
use crate::models::{CartItem, CartLine};

const CART_LINE_SELECT: &str = "SELECT ci.id, ci.quantity, ci.added_at, \
     v.id AS variant_id, v.name AS variant_name, v.sku, \
     p.id AS product_id, p.name AS product_name, p.base_price, v.price_adjustment, \
     COALESCE(i.quantity_available, 0) AS quantity_available \
     FROM cart_items ci \
     JOIN product_variants v ON v.id = ci.variant_id \
     JOIN products p ON p.id = v.product_id \
     LEFT JOIN inventory i ON i.variant_id = v.id";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All cart lines for a user, joined with variant, product, and stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(&format!(
            "{CART_LINE_SELECT} WHERE ci.user_id = $1 ORDER BY ci.added_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    /// Get a single cart line only if it belongs to the given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_line_owned(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(&format!(
            "{CART_LINE_SELECT} WHERE ci.id = $1 AND ci.user_id = $2"
        ))
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(line)
    }

    /// The quantity already in the cart for a (user, variant), if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_quantity(
        &self,
        user_id: UserId,
        variant_id: VariantId,
    ) -> Result<Option<i32>, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT quantity FROM cart_items WHERE user_id = $1 AND variant_id = $2",
        )
        .bind(user_id)
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(q,)| q))
    }

    /// Add to the cart, incrementing the quantity when a line for the
    /// variant already exists. The (user, variant) unique constraint
    /// makes this upsert the authoritative duplicate handling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_item(
        &self,
        user_id: UserId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (user_id, variant_id, quantity) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, variant_id) \
             DO UPDATE SET quantity = cart_items.quantity + $3 \
             RETURNING id, user_id, variant_id, quantity, added_at",
        )
        .bind(user_id)
        .bind(variant_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(item)
    }

    /// Set the quantity on an owned cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or
    /// isn't owned by the user.
    pub async fn set_quantity(
        &self,
        item_id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $1 WHERE id = $2 AND user_id = $3",
        )
        .bind(quantity)
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove an owned cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or
    /// isn't owned by the user.
    pub async fn remove(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Empty a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Empty a user's cart inside an open transaction (order placement).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_in_tx(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Number of lines in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }
}
