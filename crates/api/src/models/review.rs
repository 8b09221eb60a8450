//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use avoi_core::{ProductId, ReviewId, UserId};

/// A product review, one per (user, product).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub is_verified_purchase: bool,
    pub is_approved: bool,
    pub helpful_votes: i32,
    pub created_at: DateTime<Utc>,
    /// Reviewer byline, e.g. "Amara O."; joined from the user row.
    pub reviewer_name: String,
}

/// Aggregate statistics over ALL approved reviews for a product,
/// independent of whatever page or rating filter is being displayed.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewStats {
    pub total_reviews: i64,
    /// Average rating to one decimal place; 0 when there are no reviews.
    pub average_rating: f64,
    /// Count of reviews per star, keys "1" through "5".
    pub rating_distribution: BTreeMap<String, i64>,
}

impl ReviewStats {
    /// Compute stats from (rating, count) pairs as returned by a
    /// `GROUP BY rating` query.
    #[must_use]
    pub fn from_counts(counts: &[(i32, i64)]) -> Self {
        let mut rating_distribution: BTreeMap<String, i64> =
            (1..=5).map(|star| (star.to_string(), 0)).collect();

        let mut total_reviews = 0_i64;
        let mut rating_sum = 0_i64;
        for &(rating, count) in counts {
            if let Some(slot) = rating_distribution.get_mut(&rating.to_string()) {
                *slot = count;
            }
            total_reviews += count;
            rating_sum += i64::from(rating) * count;
        }

        #[allow(clippy::cast_precision_loss)] // review counts are far below f64 precision
        let average_rating = if total_reviews > 0 {
            let avg = rating_sum as f64 / total_reviews as f64;
            (avg * 10.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            total_reviews,
            average_rating,
            rating_distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_counts() {
        let stats = ReviewStats::from_counts(&[(5, 3), (4, 1), (1, 1)]);
        assert_eq!(stats.total_reviews, 5);
        // (15 + 4 + 1) / 5 = 4.0
        assert!((stats.average_rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(stats.rating_distribution.get("5"), Some(&3));
        assert_eq!(stats.rating_distribution.get("4"), Some(&1));
        assert_eq!(stats.rating_distribution.get("3"), Some(&0));
        assert_eq!(stats.rating_distribution.get("1"), Some(&1));
    }

    #[test]
    fn test_stats_empty_has_zero_average() {
        let stats = ReviewStats::from_counts(&[]);
        assert_eq!(stats.total_reviews, 0);
        assert!((stats.average_rating - 0.0).abs() < f64::EPSILON);
        assert_eq!(stats.rating_distribution.len(), 5);
    }

    #[test]
    fn test_stats_rounds_to_one_decimal() {
        // (5 + 4) / 2 = 4.5; (5*2 + 4) / 3 = 4.666... -> 4.7
        let stats = ReviewStats::from_counts(&[(5, 2), (4, 1)]);
        assert!((stats.average_rating - 4.7).abs() < f64::EPSILON);
    }
}
