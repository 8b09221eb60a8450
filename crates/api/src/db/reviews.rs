//! Review repository.

use sqlx::PgPool;

use avoi_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// Review columns plus the reviewer byline ("First L.") joined from the
/// user row.
const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, r.rating, r.title, r.comment, \
     r.is_verified_purchase, r.is_approved, r.helpful_votes, r.created_at, \
     u.first_name || ' ' || left(u.last_name, 1) || '.' AS reviewer_name \
     FROM reviews r \
     JOIN users u ON u.id = r.user_id";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Page through a product's approved reviews, newest first, with an
    /// optional exact-rating filter. Returns the page and the filtered
    /// match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn page_for_product(
        &self,
        product_id: ProductId,
        rating: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} \
             WHERE r.product_id = $1 AND r.is_approved = TRUE \
             AND ($2::integer IS NULL OR r.rating = $2) \
             ORDER BY r.created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(product_id)
        .bind(rating)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reviews \
             WHERE product_id = $1 AND is_approved = TRUE \
             AND ($2::integer IS NULL OR rating = $2)",
        )
        .bind(product_id)
        .bind(rating)
        .fetch_one(self.pool)
        .await?;

        Ok((reviews, total))
    }

    /// Per-star counts over ALL approved reviews for a product,
    /// independent of any page or rating filter being displayed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rating_counts(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<(i32, i64)>, RepositoryError> {
        let counts: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT rating, COUNT(*) FROM reviews \
             WHERE product_id = $1 AND is_approved = TRUE \
             GROUP BY rating",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(counts)
    }

    /// Whether the user already reviewed the product. A pre-check for a
    /// friendly message; the unique constraint remains authoritative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_for(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE product_id = $1 AND user_id = $2)",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Create a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed
    /// this product.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i32,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO reviews (product_id, user_id, rating, title, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "product already reviewed by this user"))?;

        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(review)
    }
}
