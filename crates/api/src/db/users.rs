//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use avoi_core::{CurrencyCode, Email, UserId};

use super::RepositoryError;
use crate::models::User;
use crate::models::user::USER_COLUMNS;

/// Fields accepted at registration time.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: Option<&'a str>,
    pub nationality: &'a str,
    pub preferred_currency: &'a CurrencyCode,
    pub verification_token: &'a str,
}

/// Profile fields a user may change. `None` leaves a field untouched.
#[derive(Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub nationality: Option<&'a str>,
    pub preferred_currency: Option<&'a CurrencyCode>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user (unverified, with a pending verification token).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: NewUser<'_>) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, phone_number, \
             nationality, preferred_currency, email_verification_token, \
             email_verification_sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now()) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.phone_number)
        .bind(new_user.nationality)
        .bind(new_user.preferred_currency)
        .bind(new_user.verification_token)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "email already registered"))?;

        Ok(user)
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if no user exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, (i32, String)>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, password_hash)) = row else {
            return Ok(None);
        };

        let user = self
            .get_by_id(UserId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(Some((user, password_hash)))
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Fetch the pending verification token for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn verification_token(
        &self,
        user_id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT email_verification_token FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.and_then(|(token,)| token))
    }

    /// Store a fresh verification token and stamp the send time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_verification_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET email_verification_token = $1, \
             email_verification_sent_at = now(), updated_at = now() WHERE id = $2",
        )
        .bind(token)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Mark a user's email as verified and clear the token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn verify_email(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET email_verified = TRUE, email_verified_at = now(), \
             email_verification_token = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_login(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Apply a profile update and return the fresh row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate<'_>,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             first_name = COALESCE($1, first_name), \
             last_name = COALESCE($2, last_name), \
             phone_number = COALESCE($3, phone_number), \
             nationality = COALESCE($4, nationality), \
             preferred_currency = COALESCE($5, preferred_currency), \
             updated_at = now() \
             WHERE id = $6 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.phone_number)
        .bind(update.nationality)
        .bind(update.preferred_currency)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(user)
    }
}
