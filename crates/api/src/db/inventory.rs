//! Inventory repository.
//!
//! Stock mutations during checkout and cancellation run inside the order
//! transaction, so those operations take a `PgConnection` rather than
//! borrowing the pool.

use sqlx::{PgConnection, PgPool};

use avoi_core::{InventoryId, MovementKind, VariantId};

use super::RepositoryError;
use crate::models::inventory::Inventory;

const INVENTORY_COLUMNS: &str =
    "id, variant_id, quantity_available, quantity_reserved, reorder_level, updated_at";

/// Repository for inventory database operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the inventory record for a variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_variant(
        &self,
        variant_id: VariantId,
    ) -> Result<Option<Inventory>, RepositoryError> {
        let inventory = sqlx::query_as::<_, Inventory>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE variant_id = $1"
        ))
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(inventory)
    }

    /// Live available quantity for a variant; 0 when no record exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn available(&self, variant_id: VariantId) -> Result<i32, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT quantity_available FROM inventory WHERE variant_id = $1",
        )
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map_or(0, |(quantity,)| quantity))
    }

    /// Create the inventory record for a variant. Used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the variant already has one.
    pub async fn create_for_variant(
        &self,
        variant_id: VariantId,
        quantity_available: i32,
        reorder_level: i32,
    ) -> Result<Inventory, RepositoryError> {
        let inventory = sqlx::query_as::<_, Inventory>(&format!(
            "INSERT INTO inventory (variant_id, quantity_available, reorder_level) \
             VALUES ($1, $2, $3) RETURNING {INVENTORY_COLUMNS}"
        ))
        .bind(variant_id)
        .bind(quantity_available)
        .bind(reorder_level)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "variant already has inventory"))?;

        Ok(inventory)
    }

    /// Atomically take `quantity` units from a variant's stock.
    ///
    /// The decrement only happens when enough stock remains
    /// (`quantity_available >= quantity` is part of the UPDATE predicate),
    /// so two concurrent checkouts can never drive the count negative:
    /// the slower one matches zero rows and the caller aborts.
    ///
    /// Returns the inventory ID on success, `None` when stock was
    /// insufficient (or the variant has no inventory record).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn try_decrement(
        conn: &mut PgConnection,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<Option<InventoryId>, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE inventory \
             SET quantity_available = quantity_available - $2, updated_at = now() \
             WHERE variant_id = $1 AND quantity_available >= $2 \
             RETURNING id",
        )
        .bind(variant_id)
        .bind(quantity)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(|(id,)| InventoryId::new(id)))
    }

    /// Put `quantity` units back onto a variant's stock (cancellation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant has no
    /// inventory record.
    pub async fn restore(
        conn: &mut PgConnection,
        variant_id: VariantId,
        quantity: i32,
    ) -> Result<InventoryId, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE inventory \
             SET quantity_available = quantity_available + $2, updated_at = now() \
             WHERE variant_id = $1 \
             RETURNING id",
        )
        .bind(variant_id)
        .bind(quantity)
        .fetch_optional(conn)
        .await?;

        row.map(|(id,)| InventoryId::new(id))
            .ok_or(RepositoryError::NotFound)
    }

    /// Append an audit movement for a stock change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_movement(
        conn: &mut PgConnection,
        inventory_id: InventoryId,
        kind: MovementKind,
        quantity_change: i32,
        reference: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO inventory_movements (inventory_id, kind, quantity_change, reference, note) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(inventory_id)
        .bind(kind)
        .bind(quantity_change)
        .bind(reference)
        .bind(note)
        .execute(conn)
        .await?;

        Ok(())
    }
}
