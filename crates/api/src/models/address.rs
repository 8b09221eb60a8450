//! Address domain types.

use serde::Serialize;

use avoi_core::{AddressId, AddressKind, UserId};

/// A user's shipping or billing address.
///
/// Addresses referenced by an order cannot be deleted; the repository
/// refuses the delete while any order points at the row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub kind: AddressKind,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}
