//! Address repository.

use sqlx::PgPool;

use avoi_core::{AddressId, AddressKind, UserId};

use super::RepositoryError;
use crate::models::Address;

const ADDRESS_COLUMNS: &str =
    "id, user_id, kind, street_address, city, state, postal_code, country, is_default";

/// Fields for creating an address.
#[derive(Debug)]
pub struct NewAddress<'a> {
    pub kind: AddressKind,
    pub street_address: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub country: &'a str,
    pub is_default: bool,
}

/// Fields an address update may change. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct AddressUpdate<'a> {
    pub street_address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub country: Option<&'a str>,
    pub make_default: bool,
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All addresses belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Get an address only if it belongs to the given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }

    /// Create an address for a user.
    ///
    /// When the new address is marked default, prior defaults of the same
    /// kind are cleared in the same transaction so the partial unique
    /// index never trips.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create(
        &self,
        user_id: UserId,
        new: NewAddress<'_>,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if new.is_default {
            sqlx::query(
                "UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND kind = $2",
            )
            .bind(user_id)
            .bind(new.kind)
            .execute(&mut *tx)
            .await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO addresses \
             (user_id, kind, street_address, city, state, postal_code, country, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new.kind)
        .bind(new.street_address)
        .bind(new.city)
        .bind(new.state)
        .bind(new.postal_code)
        .bind(new.country)
        .bind(new.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(address)
    }

    /// Update an owned address, optionally promoting it to default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// isn't owned by the user.
    pub async fn update(
        &self,
        address_id: AddressId,
        user_id: UserId,
        update: AddressUpdate<'_>,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if update.make_default {
            sqlx::query(
                "UPDATE addresses SET is_default = FALSE \
                 WHERE user_id = $1 \
                 AND kind = (SELECT kind FROM addresses WHERE id = $2 AND user_id = $1)",
            )
            .bind(user_id)
            .bind(address_id)
            .execute(&mut *tx)
            .await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE addresses SET \
             street_address = COALESCE($1, street_address), \
             city = COALESCE($2, city), \
             state = COALESCE($3, state), \
             postal_code = COALESCE($4, postal_code), \
             country = COALESCE($5, country), \
             is_default = is_default OR $6 \
             WHERE id = $7 AND user_id = $8 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(update.street_address)
        .bind(update.city)
        .bind(update.state)
        .bind(update.postal_code)
        .bind(update.country)
        .bind(update.make_default)
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(address)
    }

    /// Delete an owned address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any order references the
    /// address. Returns `RepositoryError::NotFound` if it doesn't exist
    /// or isn't owned by the user.
    pub async fn delete(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let (referenced,): (bool,) = sqlx::query_as(
            "SELECT EXISTS( \
             SELECT 1 FROM orders \
             WHERE shipping_address_id = $1 OR billing_address_id = $1)",
        )
        .bind(address_id)
        .fetch_one(self.pool)
        .await?;

        if referenced {
            return Err(RepositoryError::Conflict(
                "address is used by existing orders".to_owned(),
            ));
        }

        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
