//! Wishlist domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use avoi_core::currency::round2;
use avoi_core::{CurrencyCode, ProductId, UserId, WishlistItemId};

/// A user-to-product wishlist link.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub added_at: DateTime<Utc>,
}

/// A wishlist row joined with its product, as read from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub added_at: DateTime<Utc>,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub base_price: Decimal,
    pub short_description: Option<String>,
    pub is_active: bool,
}

/// A wishlist entry priced in a display currency.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistEntryView {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub short_description: Option<String>,
    pub is_active: bool,
    pub added_at: DateTime<Utc>,
}

impl WishlistEntryView {
    /// Price an entry for display.
    #[must_use]
    pub fn price(entry: WishlistEntry, rate: Decimal, currency: CurrencyCode) -> Self {
        Self {
            id: entry.id,
            product_id: entry.product_id,
            product_name: entry.product_name,
            sku: entry.sku,
            price: round2(entry.base_price * rate),
            currency,
            short_description: entry.short_description,
            is_active: entry.is_active,
            added_at: entry.added_at,
        }
    }
}
