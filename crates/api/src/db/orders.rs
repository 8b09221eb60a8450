//! Order repository.
//!
//! Order placement and cancellation are multi-statement operations; the
//! order service owns the transaction and passes its connection into the
//! `*_in_tx` functions here.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use avoi_core::{
    AddressId, CurrencyCode, OrderId, OrderStatus, PaymentStatus, UserId, VariantId,
};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderStatusEntry, Payment};

const ORDER_COLUMNS: &str = "id, user_id, order_number, status, payment_status, subtotal, \
     shipping_cost, tax_amount, total_amount, currency, shipping_address_id, \
     billing_address_id, created_at, updated_at";

/// Monetary fields and references for a new order row.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub order_number: &'a str,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: &'a CurrencyCode,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Page through a user's orders, newest first, optionally filtered by
    /// status. Returns the page and the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders \
             WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Get an order only if it belongs to the given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Line items for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, variant_id, quantity, unit_price, total_price \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Status history for an order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderStatusEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, OrderStatusEntry>(
            "SELECT order_id, status, note, changed_by, created_at \
             FROM order_status_history WHERE order_id = $1 ORDER BY created_at DESC",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Payment records for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn payments_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT id, order_id, method, gateway, gateway_transaction_id, amount, currency, \
             status, created_at, processed_at \
             FROM payments WHERE order_id = $1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(payments)
    }

    // =========================================================================
    // Transactional pieces of order placement / cancellation
    // =========================================================================

    /// Insert the order row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on an order-number collision.
    pub async fn insert_order_in_tx(
        conn: &mut PgConnection,
        new: NewOrder<'_>,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, order_number, subtotal, shipping_cost, tax_amount, \
             total_amount, currency, shipping_address_id, billing_address_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(new.order_number)
        .bind(new.subtotal)
        .bind(new.shipping_cost)
        .bind(new.tax_amount)
        .bind(new.total_amount)
        .bind(new.currency)
        .bind(new.shipping_address_id)
        .bind(new.billing_address_id)
        .fetch_one(conn)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "order number already exists"))?;

        Ok(order)
    }

    /// Insert a snapshot line item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item_in_tx(
        conn: &mut PgConnection,
        order_id: OrderId,
        variant_id: VariantId,
        quantity: i32,
        unit_price: Decimal,
        total_price: Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_items (order_id, variant_id, quantity, unit_price, total_price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(variant_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(total_price)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Append a status-history entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_history_in_tx(
        conn: &mut PgConnection,
        order_id: OrderId,
        status: OrderStatus,
        note: Option<&str>,
        changed_by: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_status_history (order_id, status, note, changed_by) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(status)
        .bind(note)
        .bind(changed_by)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Record a payment attempt. No gateway is invoked; the row documents
    /// the method the customer chose.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_payment_in_tx(
        conn: &mut PgConnection,
        order_id: OrderId,
        method: &str,
        gateway: &str,
        amount: Decimal,
        currency: &CurrencyCode,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO payments (order_id, method, gateway, amount, currency) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(method)
        .bind(gateway)
        .bind(amount)
        .bind(currency)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Flip an order to `cancelled` and settle its payment status; stored
    /// payment rows follow the order's payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an update fails.
    pub async fn mark_cancelled_in_tx(
        conn: &mut PgConnection,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = 'cancelled', payment_status = $1, updated_at = now() \
             WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(payment_status)
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "UPDATE payments SET status = $1, processed_at = now() WHERE order_id = $2",
        )
        .bind(payment_status)
        .bind(order_id)
        .execute(conn)
        .await?;

        Ok(order)
    }
}
