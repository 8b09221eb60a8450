//! Inventory domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use avoi_core::{InventoryId, VariantId};

/// Stock record for a variant. The single source of truth for quantity;
/// variants themselves store none.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Inventory {
    pub id: InventoryId,
    pub variant_id: VariantId,
    pub quantity_available: i32,
    pub quantity_reserved: i32,
    pub reorder_level: i32,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// Whether stock has fallen to or below the reorder threshold.
    #[must_use]
    pub const fn needs_reorder(&self) -> bool {
        self.quantity_available <= self.reorder_level
    }
}

