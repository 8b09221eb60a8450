//! Authentication service.
//!
//! Password registration and login, bearer-token issuance, and the
//! email-verification flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use avoi_core::{CurrencyCode, Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, ProfileUpdate, UserRepository};
use crate::models::User;
use crate::services::currency::nationality_currency;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Bearer tokens are valid for seven days.
const TOKEN_TTL_DAYS: i64 = 7;

/// Fields accepted at registration.
#[derive(Debug)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: Option<&'a str>,
    pub nationality: &'a str,
}

/// JWT claims carried by a bearer token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID.
    sub: i32,
    /// Expiry (unix seconds).
    exp: i64,
    /// Issued at (unix seconds).
    iat: i64,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt_secret: &'a SecretString,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt_secret: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt_secret,
        }
    }

    // =========================================================================
    // Registration & login
    // =========================================================================

    /// Register a new user. The preferred currency is derived from the
    /// nationality; the account starts unverified with a pending
    /// verification token, which is returned for emailing.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        registration: Registration<'_>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;

        let password_hash = hash_password(registration.password)?;
        let preferred_currency: CurrencyCode = nationality_currency(registration.nationality);
        let verification_token = generate_verification_token(&email);

        let user = self
            .users
            .create(NewUser {
                email: &email,
                password_hash: &password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                phone_number: registration.phone_number,
                nationality: registration.nationality,
                preferred_currency: &preferred_currency,
                verification_token: &verification_token,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok((user, verification_token))
    }

    /// Login with email and password, returning the user and a fresh
    /// bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::AccountDeactivated` for deactivated accounts.
    /// Returns `AuthError::EmailNotVerified` when verification is pending.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }
        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        self.users.record_login(user.id, Utc::now()).await?;

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    /// Change a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong, `AuthError::WeakPassword` if the new one fails validation.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let (_, password_hash) = self
            .users
            .get_password_hash(&user.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(current_password, &password_hash)?;
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        self.users.set_password_hash(user.id, &new_hash).await?;

        Ok(())
    }

    /// Update a user's profile. A nationality change re-derives the
    /// preferred currency.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate<'_>,
    ) -> Result<User, AuthError> {
        let derived_currency = update.nationality.map(nationality_currency);
        let update = ProfileUpdate {
            first_name: update.first_name,
            last_name: update.last_name,
            phone_number: update.phone_number,
            nationality: update.nationality,
            preferred_currency: derived_currency.as_ref(),
        };

        let user = self.users.update_profile(user_id, update).await?;
        Ok(user)
    }

    // =========================================================================
    // Bearer tokens
    // =========================================================================

    /// Issue a signed bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` if signing fails.
    pub fn issue_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.as_i32(),
            exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp(),
            iat: now.timestamp(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
        )
        .map_err(|_| AuthError::TokenInvalid)
    }

    /// Verify a bearer token and extract the user ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` for expired tokens and
    /// `AuthError::TokenInvalid` for anything else that fails validation.
    pub fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;

        Ok(UserId::new(data.claims.sub))
    }

    // =========================================================================
    // Email verification
    // =========================================================================

    /// Verify a user's email with the token they were sent.
    ///
    /// Returns `true` when the email was already verified (a no-op).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` for unknown emails and
    /// `AuthError::InvalidVerificationToken` on a token mismatch.
    pub async fn verify_email(&self, email: &str, token: &str) -> Result<(User, bool), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verified {
            return Ok((user, true));
        }

        let stored = self.users.verification_token(user.id).await?;
        if stored.as_deref() != Some(token) {
            return Err(AuthError::InvalidVerificationToken);
        }

        self.users.verify_email(user.id).await?;
        Ok((user, false))
    }

    /// Rotate the verification token for an unverified user.
    ///
    /// Returns `None` when the email is already verified, otherwise the
    /// user and the fresh token to send.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` for unknown emails.
    pub async fn resend_verification(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verified {
            return Ok(None);
        }

        let token = generate_verification_token(&user.email);
        self.users.set_verification_token(user.id, &token).await?;

        Ok(Some((user, token)))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Verification token: hex SHA-256 over email, timestamp, and random bytes.
fn generate_verification_token(email: &Email) -> String {
    use rand::RngCore;

    let mut random = [0u8; 32];
    rand::rng().fill_bytes(&mut random);

    let mut hasher = Sha256::new();
    hasher.update(email.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(Utc::now().timestamp().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(random);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verification_tokens_are_unique_hex() {
        let email = Email::parse("user@example.com").unwrap();
        let a = generate_verification_token(&email);
        let b = generate_verification_token(&email);

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = SecretString::from("0123456789abcdef0123456789abcdef");
        let now = Utc::now();
        let claims = Claims {
            sub: 42,
            exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp(),
            iat: now.timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        let decoded = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, 42);
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = SecretString::from("0123456789abcdef0123456789abcdef");
        let now = Utc::now();
        let claims = Claims {
            sub: 7,
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            iat: (now - chrono::Duration::days(8)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .unwrap();

        let result = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            &Validation::default(),
        );
        assert!(matches!(
            result.unwrap_err().kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }
}
