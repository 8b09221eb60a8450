//! Order placement and lifecycle.
//!
//! Placement validates the cart against live stock and addresses, locks
//! the exchange rate once for the whole order, then commits the order,
//! its line items, the inventory decrements, the initial status-history
//! entry, a pending payment record, and the cart clear inside a single
//! transaction. Any failure rolls the whole sequence back.
//!
//! Stock is taken with a conditional `UPDATE ... WHERE
//! quantity_available >= $n`; the precondition check earlier in the flow
//! only exists for a friendly error message. Two checkouts racing over
//! the last unit therefore end with exactly one order.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use avoi_core::currency::round2;
use avoi_core::{AddressId, MovementKind, OrderId, OrderStatus, VariantId};

use crate::db::cart::CartRepository;
use crate::db::inventory::InventoryRepository;
use crate::db::orders::{NewOrder, OrderRepository};
use crate::db::{AddressRepository, RepositoryError};
use crate::models::{CartLine, Order, OrderStatusEntry, User};
use crate::services::currency::CurrencyConverter;

/// Flat shipping charge applied when the caller doesn't supply one.
fn default_shipping_cost() -> Decimal {
    Decimal::new(500, 2) // 5.00
}

/// Flat tax rate (7.5%), not jurisdiction-aware.
fn tax_rate() -> Decimal {
    Decimal::new(75, 3) // 0.075
}

/// Errors that can occur while placing or transitioning an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// An address ID doesn't reference an address owned by the caller.
    #[error("address not found")]
    AddressNotFound,

    /// The cart has no lines to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Not enough stock for a cart line.
    #[error("insufficient inventory for {product} - {variant}")]
    InsufficientInventory { product: String, variant: String },

    /// The order exists but can't make the requested transition.
    #[error("order cannot be cancelled from status '{from}'")]
    InvalidTransition { from: OrderStatus },

    /// The order doesn't exist or isn't owned by the caller.
    #[error("order not found")]
    OrderNotFound,

    /// The commit sequence failed and was rolled back.
    #[error("order creation failed: {0}")]
    CreationFailed(#[source] RepositoryError),

    /// Repository/database error outside the commit sequence.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Caller-supplied parameters for placing an order.
#[derive(Debug)]
pub struct PlaceOrder {
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    /// Overrides the flat default shipping charge.
    pub shipping_cost: Option<Decimal>,
    /// Recorded on the payment row; defaults to "card".
    pub payment_method: Option<String>,
}

/// A cart line priced for the order, in the locked currency.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Monetary summary of an order before it is written.
#[derive(Debug)]
pub struct OrderPricing {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Price cart lines at a locked exchange rate and apply shipping + tax.
///
/// Unit prices and line totals round to 2dp per line; subtotal, tax, and
/// total round again at the aggregate level.
#[must_use]
pub fn compute_pricing(lines: &[CartLine], rate: Decimal, shipping_cost: Option<Decimal>) -> OrderPricing {
    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|line| {
            let unit_price = round2((line.base_price + line.price_adjustment) * rate);
            let total_price = round2(unit_price * Decimal::from(line.quantity));
            PricedLine {
                variant_id: line.variant_id,
                product_name: line.product_name.clone(),
                variant_name: line.variant_name.clone(),
                quantity: line.quantity,
                unit_price,
                total_price,
            }
        })
        .collect();

    let subtotal = round2(priced.iter().map(|l| l.total_price).sum());
    let shipping_cost = shipping_cost.unwrap_or_else(default_shipping_cost);
    let tax_amount = round2(subtotal * tax_rate());
    let total_amount = round2(subtotal + shipping_cost + tax_amount);

    OrderPricing {
        lines: priced,
        subtotal,
        shipping_cost,
        tax_amount,
        total_amount,
    }
}

/// Generate a unique order number: date stamp plus a random suffix,
/// e.g. `AVOI-20250807-9F2C41AB`.
#[must_use]
pub fn generate_order_number() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("AVOI-{date}-{suffix}")
}

/// Order placement and lifecycle service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    converter: &'a CurrencyConverter,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, converter: &'a CurrencyConverter) -> Self {
        Self { pool, converter }
    }

    /// Place an order from the user's cart.
    ///
    /// Preconditions are checked in a fixed sequence, each with its own
    /// failure mode: address ownership, cart non-emptiness, then stock
    /// per line. The exchange rate for the user's preferred currency is
    /// resolved once and locked for every monetary field on the order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AddressNotFound`, `OrderError::EmptyCart`,
    /// or `OrderError::InsufficientInventory` for failed preconditions;
    /// `OrderError::CreationFailed` if the commit sequence fails (fully
    /// rolled back).
    pub async fn place_order(&self, user: &User, request: PlaceOrder) -> Result<Order, OrderError> {
        let addresses = AddressRepository::new(self.pool);
        let carts = CartRepository::new(self.pool);

        // 1. Both addresses must exist and belong to the caller.
        let shipping = addresses
            .get_owned(request.shipping_address_id, user.id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;
        let billing = addresses
            .get_owned(request.billing_address_id, user.id)
            .await?
            .ok_or(OrderError::AddressNotFound)?;

        // 2. The cart must have something in it.
        let lines = carts.lines_for_user(user.id).await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        // 3. Friendly per-line stock check; the conditional decrement
        //    below remains the authoritative guard.
        for line in &lines {
            if line.quantity_available < line.quantity {
                return Err(OrderError::InsufficientInventory {
                    product: line.product_name.clone(),
                    variant: line.variant_name.clone(),
                });
            }
        }

        // Price lock: one rate for the whole order.
        let rate = self.converter.rate_for(&user.preferred_currency).await;
        let pricing = compute_pricing(&lines, rate, request.shipping_cost);
        let order_number = generate_order_number();
        let payment_method = request.payment_method.as_deref().unwrap_or("card");

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let order = OrderRepository::insert_order_in_tx(
            &mut *tx,
            NewOrder {
                user_id: user.id,
                order_number: &order_number,
                subtotal: pricing.subtotal,
                shipping_cost: pricing.shipping_cost,
                tax_amount: pricing.tax_amount,
                total_amount: pricing.total_amount,
                currency: &user.preferred_currency,
                shipping_address_id: shipping.id,
                billing_address_id: billing.id,
            },
        )
        .await
        .map_err(OrderError::CreationFailed)?;

        for line in &pricing.lines {
            OrderRepository::insert_item_in_tx(
                &mut *tx,
                order.id,
                line.variant_id,
                line.quantity,
                line.unit_price,
                line.total_price,
            )
            .await
            .map_err(OrderError::CreationFailed)?;

            // Conditional decrement: zero rows means another checkout
            // got there first, and the whole order rolls back.
            let inventory_id =
                InventoryRepository::try_decrement(&mut *tx, line.variant_id, line.quantity)
                    .await
                    .map_err(OrderError::CreationFailed)?
                    .ok_or_else(|| OrderError::InsufficientInventory {
                        product: line.product_name.clone(),
                        variant: line.variant_name.clone(),
                    })?;

            InventoryRepository::record_movement(
                &mut *tx,
                inventory_id,
                MovementKind::Sale,
                -line.quantity,
                Some(&order_number),
                None,
            )
            .await
            .map_err(OrderError::CreationFailed)?;
        }

        OrderRepository::insert_history_in_tx(
            &mut *tx,
            order.id,
            OrderStatus::Pending,
            Some("Order created"),
            Some(&format!("user {}", user.id)),
        )
        .await
        .map_err(OrderError::CreationFailed)?;

        OrderRepository::insert_payment_in_tx(
            &mut *tx,
            order.id,
            payment_method,
            "manual",
            pricing.total_amount,
            &user.preferred_currency,
        )
        .await
        .map_err(OrderError::CreationFailed)?;

        CartRepository::clear_in_tx(&mut *tx, user.id)
            .await
            .map_err(OrderError::CreationFailed)?;

        tx.commit()
            .await
            .map_err(|e| OrderError::CreationFailed(RepositoryError::Database(e)))?;

        // Post-commit, best-effort: flag variants the sale pushed to or
        // below their reorder threshold.
        let inventory = InventoryRepository::new(self.pool);
        for line in &pricing.lines {
            match inventory.get_for_variant(line.variant_id).await {
                Ok(Some(stock)) if stock.needs_reorder() => {
                    tracing::warn!(
                        variant_id = %line.variant_id,
                        available = stock.quantity_available,
                        reorder_level = stock.reorder_level,
                        "variant at or below reorder level"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(error = %err, "reorder-level check skipped");
                }
            }
        }

        Ok(order)
    }

    /// Cancel an order, restoring each line's stock and settling the
    /// payment status. Only `pending` and `processing` orders qualify.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` for unknown/unowned orders and
    /// `OrderError::InvalidTransition` outside the cancellation window.
    pub async fn cancel_order(&self, user: &User, order_id: OrderId) -> Result<Order, OrderError> {
        let orders = OrderRepository::new(self.pool);

        let order = orders
            .get_owned(order_id, user.id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        if !order.status.is_cancellable() {
            return Err(OrderError::InvalidTransition { from: order.status });
        }

        let items = orders.items_for_order(order.id).await?;
        let payment_status = order.payment_status.on_order_cancelled();

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        for item in &items {
            let inventory_id =
                InventoryRepository::restore(&mut *tx, item.variant_id, item.quantity).await?;

            InventoryRepository::record_movement(
                &mut *tx,
                inventory_id,
                MovementKind::Return,
                item.quantity,
                Some(&order.order_number),
                Some("Order cancelled"),
            )
            .await?;
        }

        let cancelled =
            OrderRepository::mark_cancelled_in_tx(&mut *tx, order.id, payment_status).await?;

        OrderRepository::insert_history_in_tx(
            &mut *tx,
            order.id,
            OrderStatus::Cancelled,
            Some("Order cancelled by customer"),
            Some(&format!("user {}", user.id)),
        )
        .await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(cancelled)
    }

    /// Current status plus the full history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` for unknown/unowned orders.
    pub async fn order_status(
        &self,
        user: &User,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderStatusEntry>), OrderError> {
        let orders = OrderRepository::new(self.pool);

        let order = orders
            .get_owned(order_id, user.id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let history = orders.history_for_order(order.id).await?;
        Ok((order, history))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use avoi_core::{CartItemId, ProductId};
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(id: i32, base: &str, adjustment: &str, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            quantity,
            added_at: Utc::now(),
            variant_id: VariantId::new(id),
            variant_name: format!("variant-{id}"),
            sku: format!("SKU-{id}"),
            product_id: ProductId::new(id),
            product_name: format!("product-{id}"),
            base_price: dec(base),
            price_adjustment: dec(adjustment),
            quantity_available: 100,
        }
    }

    #[test]
    fn test_pricing_locks_one_rate_for_all_lines() {
        // Nigeria example: 25.00 USD at 750.0 displays as 18750.00 NGN.
        let lines = vec![line(1, "25.00", "0", 1)];
        let pricing = compute_pricing(&lines, dec("750.0"), None);

        assert_eq!(pricing.lines[0].unit_price, dec("18750.00"));
        assert_eq!(pricing.subtotal, dec("18750.00"));
    }

    #[test]
    fn test_pricing_line_items_sum_to_subtotal() {
        let lines = vec![
            line(1, "25.00", "0", 2),
            line(2, "35.00", "5.00", 1),
            line(3, "22.00", "0", 3),
        ];
        let pricing = compute_pricing(&lines, Decimal::ONE, None);

        assert_eq!(pricing.lines.len(), 3);
        let summed: Decimal = pricing.lines.iter().map(|l| l.total_price).sum();
        assert_eq!(pricing.subtotal, round2(summed));
        // 50 + 40 + 66 = 156
        assert_eq!(pricing.subtotal, dec("156.00"));
    }

    #[test]
    fn test_pricing_defaults_shipping_and_applies_tax() {
        let lines = vec![line(1, "100.00", "0", 1)];
        let pricing = compute_pricing(&lines, Decimal::ONE, None);

        assert_eq!(pricing.shipping_cost, dec("5.00"));
        // 7.5% of 100.00
        assert_eq!(pricing.tax_amount, dec("7.50"));
        assert_eq!(pricing.total_amount, dec("112.50"));
    }

    #[test]
    fn test_pricing_honors_explicit_shipping() {
        let lines = vec![line(1, "100.00", "0", 1)];
        let pricing = compute_pricing(&lines, Decimal::ONE, Some(dec("12.00")));

        assert_eq!(pricing.shipping_cost, dec("12.00"));
        assert_eq!(pricing.total_amount, dec("119.50"));
    }

    #[test]
    fn test_pricing_rounds_tax_at_aggregate() {
        // Subtotal 10.01 -> raw tax 0.75075 -> rounded 0.75
        let lines = vec![line(1, "10.01", "0", 1)];
        let pricing = compute_pricing(&lines, Decimal::ONE, Some(Decimal::ZERO));

        assert_eq!(pricing.tax_amount, dec("0.75"));
        assert_eq!(pricing.total_amount, dec("10.76"));
    }

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "AVOI");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_order_numbers_are_unique() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert_ne!(a, b);
    }
}
