//! Wishlist repository.

use sqlx::PgPool;

use avoi_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::wishlist::{WishlistEntry, WishlistItem};

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's wishlist, newest first, joined with product data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, WishlistEntry>(
            "SELECT w.id, w.added_at, p.id AS product_id, p.name AS product_name, p.sku, \
             p.base_price, p.short_description, p.is_active \
             FROM wishlist_items w \
             JOIN products p ON p.id = w.product_id \
             WHERE w.user_id = $1 ORDER BY w.added_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product is already on
    /// the user's wishlist.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistItem, RepositoryError> {
        let item = sqlx::query_as::<_, WishlistItem>(
            "INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2) \
             RETURNING id, user_id, product_id, added_at",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product already on wishlist"))?;

        Ok(item)
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't on the
    /// user's wishlist.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
