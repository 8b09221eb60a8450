//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use avoi_core::{CurrencyCode, Email, UserId, UserRole};

/// A registered user.
///
/// The password hash is deliberately not part of this type; repositories
/// return it separately where verification needs it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    /// Country the user registered with; drives the preferred currency.
    pub nationality: String,
    pub preferred_currency: CurrencyCode,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name used in emails and review bylines,
    /// e.g. "Amara O." for Amara Obi.
    #[must_use]
    pub fn short_name(&self) -> String {
        match self.last_name.chars().next() {
            Some(initial) => format!("{} {initial}.", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

/// Column list matching [`User`]'s fields, for SELECTs.
pub const USER_COLUMNS: &str = "id, email, first_name, last_name, phone_number, nationality, \
     preferred_currency, email_verified, email_verified_at, last_login, is_active, role, \
     created_at, updated_at";

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("amara@example.com").expect("valid email"),
            first_name: "Amara".to_owned(),
            last_name: "Obi".to_owned(),
            phone_number: None,
            nationality: "Nigeria".to_owned(),
            preferred_currency: CurrencyCode::parse("NGN").expect("valid code"),
            email_verified: true,
            email_verified_at: None,
            last_login: None,
            is_active: true,
            role: UserRole::Customer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_short_name() {
        assert_eq!(sample_user().short_name(), "Amara O.");
    }

    #[test]
    fn test_short_name_empty_last_name() {
        let mut user = sample_user();
        user.last_name = String::new();
        assert_eq!(user.short_name(), "Amara");
    }
}
