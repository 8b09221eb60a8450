//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use avoi_core::currency::round2;
use avoi_core::{CartItemId, CurrencyCode, ProductId, UserId, VariantId};

/// A bare cart row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

/// A cart row joined with its variant, product, and live stock.
///
/// This is what the cart service prices; `base_price` and
/// `price_adjustment` are in the reference currency.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
    pub variant_id: VariantId,
    pub variant_name: String,
    pub sku: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub base_price: Decimal,
    pub price_adjustment: Decimal,
    pub quantity_available: i32,
}

/// A cart line priced in the user's currency.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartItemId,
    pub variant_id: VariantId,
    pub variant_name: String,
    pub sku: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub quantity_available: i32,
    pub added_at: DateTime<Utc>,
    pub currency: CurrencyCode,
}

impl CartLineView {
    /// Price a line: unit price and line total are each rounded to 2dp.
    #[must_use]
    pub fn price(line: CartLine, rate: Decimal, currency: CurrencyCode) -> Self {
        let unit_price = round2((line.base_price + line.price_adjustment) * rate);
        let line_total = round2(unit_price * Decimal::from(line.quantity));
        Self {
            id: line.id,
            variant_id: line.variant_id,
            variant_name: line.variant_name,
            sku: line.sku,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price,
            line_total,
            quantity_available: line.quantity_available,
            added_at: line.added_at,
            currency,
        }
    }
}
