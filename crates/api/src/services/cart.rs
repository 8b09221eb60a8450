//! Cart service.
//!
//! Quantity rules and inventory checks on top of the cart repository,
//! plus display pricing in the user's currency.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use avoi_core::currency::round2;
use avoi_core::{CartItemId, CurrencyCode, UserId, VariantId};

use crate::db::{CartRepository, CatalogRepository, InventoryRepository, RepositoryError};
use crate::models::{CartItem, CartLine, CartLineView};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be a positive integer.
    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    /// Not enough stock to satisfy the requested quantity.
    #[error("insufficient inventory")]
    InsufficientInventory,

    /// The referenced variant doesn't exist.
    #[error("product variant not found")]
    VariantNotFound,

    /// The referenced cart item doesn't exist or isn't owned by the user.
    #[error("cart item not found")]
    ItemNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A priced cart: lines plus the rounded subtotal.
#[derive(Debug)]
pub struct CartTotals {
    pub lines: Vec<CartLineView>,
    pub subtotal: Decimal,
    pub currency: CurrencyCode,
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    catalog: CatalogRepository<'a>,
    inventory: InventoryRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            catalog: CatalogRepository::new(pool),
            inventory: InventoryRepository::new(pool),
        }
    }

    /// Add a variant to the cart. An existing line for the same variant
    /// is incremented instead of duplicated; the combined quantity is
    /// checked against live stock before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1,
    /// `CartError::VariantNotFound` for unknown variants, and
    /// `CartError::InsufficientInventory` when stock can't cover the
    /// combined quantity.
    pub async fn add(
        &self,
        user_id: UserId,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<CartItem, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let variant = self
            .catalog
            .get_variant(variant_id)
            .await?
            .ok_or(CartError::VariantNotFound)?;

        let existing = self
            .carts
            .existing_quantity(user_id, variant_id)
            .await?
            .unwrap_or(0);

        // Check the combined quantity against the live inventory count.
        let available = self.inventory.available(variant.id).await?;
        let combined = existing + quantity;
        if available < combined {
            return Err(CartError::InsufficientInventory);
        }

        let item = self.carts.upsert_item(user_id, variant_id, quantity).await?;
        Ok(item)
    }

    /// Set the quantity on a cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity`, `CartError::ItemNotFound`,
    /// or `CartError::InsufficientInventory` as for [`Self::add`].
    pub async fn update(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .carts
            .get_line_owned(item_id, user_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;

        if line.quantity_available < quantity {
            return Err(CartError::InsufficientInventory);
        }

        self.carts.set_quantity(item_id, user_id, quantity).await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line doesn't exist or
    /// isn't owned by the user.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartError> {
        self.carts.remove(item_id, user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => CartError::ItemNotFound,
            other => CartError::Repository(other),
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        self.carts.clear(user_id).await?;
        Ok(())
    }

    /// Number of lines in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, CartError> {
        let count = self.carts.count(user_id).await?;
        Ok(count)
    }

    /// The cart priced in the given display currency.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn totals(
        &self,
        user_id: UserId,
        rate: Decimal,
        currency: CurrencyCode,
    ) -> Result<CartTotals, CartError> {
        let lines = self.carts.lines_for_user(user_id).await?;
        Ok(price_lines(lines, rate, currency))
    }
}

/// Price cart lines in a display currency.
///
/// Unit prices and line totals are rounded to 2dp per line, and the
/// subtotal is rounded again over the rounded line totals.
#[must_use]
pub fn price_lines(lines: Vec<CartLine>, rate: Decimal, currency: CurrencyCode) -> CartTotals {
    let views: Vec<CartLineView> = lines
        .into_iter()
        .map(|line| CartLineView::price(line, rate, currency.clone()))
        .collect();

    let subtotal = round2(views.iter().map(|v| v.line_total).sum());

    CartTotals {
        lines: views,
        subtotal,
        currency,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    use avoi_core::ProductId;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(id: i32, base: &str, adjustment: &str, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            quantity,
            added_at: Utc::now(),
            variant_id: VariantId::new(id),
            variant_name: "50ml".to_owned(),
            sku: format!("SKU-{id}"),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            base_price: dec(base),
            price_adjustment: dec(adjustment),
            quantity_available: 100,
        }
    }

    #[test]
    fn test_price_lines_applies_rate_per_line() {
        let ngn = CurrencyCode::parse("NGN").unwrap();
        let totals = price_lines(vec![line(1, "25.00", "0", 2)], dec("750.0"), ngn);

        assert_eq!(totals.lines.len(), 1);
        // 25.00 * 750 = 18750.00 per unit
        assert_eq!(totals.lines[0].unit_price, dec("18750.00"));
        assert_eq!(totals.lines[0].line_total, dec("37500.00"));
        assert_eq!(totals.subtotal, dec("37500.00"));
    }

    #[test]
    fn test_price_lines_includes_adjustment() {
        let usd = CurrencyCode::usd();
        let totals = price_lines(vec![line(1, "25.00", "5.00", 1)], Decimal::ONE, usd);

        assert_eq!(totals.lines[0].unit_price, dec("30.00"));
        assert_eq!(totals.subtotal, dec("30.00"));
    }

    #[test]
    fn test_price_lines_sums_lines_into_subtotal() {
        let usd = CurrencyCode::usd();
        let totals = price_lines(
            vec![line(1, "25.00", "0", 2), line(2, "35.00", "0", 1)],
            Decimal::ONE,
            usd,
        );

        assert_eq!(totals.subtotal, dec("85.00"));
        let summed: Decimal = totals.lines.iter().map(|l| l.line_total).sum();
        assert_eq!(totals.subtotal, round2(summed));
    }

    #[test]
    fn test_price_lines_rounds_each_level() {
        // Rate chosen so the raw unit price has more than 2 decimals:
        // 9.99 * 1.3333 = 13.3196... -> 13.32 per unit, 39.96 for 3
        let usd = CurrencyCode::usd();
        let totals = price_lines(vec![line(1, "9.99", "0", 3)], dec("1.3333"), usd);

        assert_eq!(totals.lines[0].unit_price, dec("13.32"));
        assert_eq!(totals.lines[0].line_total, dec("39.96"));
        assert_eq!(totals.subtotal, dec("39.96"));
    }

    #[test]
    fn test_price_lines_empty_cart() {
        let totals = price_lines(vec![], Decimal::ONE, CurrencyCode::usd());
        assert!(totals.lines.is_empty());
        assert_eq!(totals.subtotal, Decimal::ZERO);
    }
}
