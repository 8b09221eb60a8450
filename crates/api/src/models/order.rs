//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use avoi_core::{
    AddressId, CurrencyCode, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentStatus, UserId,
    VariantId,
};

/// An order with its locked monetary fields.
///
/// All amounts are in `currency`, fixed at creation time; later exchange
/// rate changes never touch an existing order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchased line, frozen at order-creation time.
///
/// `unit_price` and `total_price` are snapshots; they are never
/// re-derived from the variant's current price.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub variant_id: VariantId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// One entry in an order's append-only status trail.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderStatusEntry {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub changed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recorded payment attempt. Gateway fields are stored but no gateway
/// is ever called in this system.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: String,
    pub gateway: String,
    pub gateway_transaction_id: Option<String>,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
