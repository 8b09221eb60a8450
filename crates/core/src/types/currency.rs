//! Money types: currency codes and prices.
//!
//! Canonical prices are stored in the base currency (USD) and converted
//! for display at the edge. Currency codes are open-ended rather than an
//! enum: exchange rates arrive for arbitrary ISO 4217 codes at runtime.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CurrencyCodeError {
    /// The code is not exactly three characters.
    #[error("currency code must be exactly 3 letters")]
    WrongLength,
    /// The code contains a non-alphabetic character.
    #[error("currency code must contain only ASCII letters")]
    NotAlphabetic,
}

/// An ISO 4217 currency code (e.g. "USD", "NGN").
///
/// Stored uppercase. Codes are validated structurally only; whether a
/// rate exists for a code is a runtime concern of the currency converter,
/// which resolves unknown codes to a 1:1 rate rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a `CurrencyCode` from a string, normalizing to uppercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        if s.len() != 3 {
            return Err(CurrencyCodeError::WrongLength);
        }
        if !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError::NotAlphabetic);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// The base currency all canonical prices are stored in.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_owned())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the base currency.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.0 == "USD"
    }

    /// Display symbol for this currency, falling back to the code itself.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self.0.as_str() {
            "USD" | "MXN" => "$",
            "NGN" => "\u{20a6}",
            "GBP" => "\u{a3}",
            "EUR" => "\u{20ac}",
            "CAD" => "C$",
            "AUD" => "A$",
            "ZAR" => "R",
            "GHS" => "GH\u{20b5}",
            "KES" => "KSh",
            "JPY" | "CNY" => "\u{a5}",
            "INR" => "\u{20b9}",
            "BRL" => "R$",
            _ => &self.0,
        }
    }

    /// Whether amounts in this currency are conventionally shown without
    /// decimal places.
    #[must_use]
    pub fn is_zero_decimal(&self) -> bool {
        matches!(self.0.as_str(), "JPY" | "KRW")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CurrencyCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CurrencyCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CurrencyCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// A monetary amount with its currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// The price rounded to two decimal places.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        round2(self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.currency.is_zero_decimal() {
            write!(f, "{}{}", self.currency.symbol(), self.amount.trunc())
        } else {
            write!(f, "{}{:.2}", self.currency.symbol(), self.rounded())
        }
    }
}

/// Round a decimal amount to two places, half away from zero.
///
/// Monetary rounding is applied per line and again at aggregate level,
/// matching how totals are computed throughout the API.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_normalizes_case() {
        let code = CurrencyCode::parse("ngn").unwrap();
        assert_eq!(code.as_str(), "NGN");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            CurrencyCode::parse("US"),
            Err(CurrencyCodeError::WrongLength)
        ));
        assert!(matches!(
            CurrencyCode::parse("U$D"),
            Err(CurrencyCodeError::NotAlphabetic)
        ));
    }

    #[test]
    fn test_base_currency() {
        assert!(CurrencyCode::usd().is_base());
        assert!(!CurrencyCode::parse("EUR").unwrap().is_base());
    }

    #[test]
    fn test_symbols() {
        assert_eq!(CurrencyCode::usd().symbol(), "$");
        assert_eq!(CurrencyCode::parse("NGN").unwrap().symbol(), "\u{20a6}");
        // Unknown codes fall back to the code itself
        assert_eq!(CurrencyCode::parse("XOF").unwrap().symbol(), "XOF");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(dec("18750.005")), dec("18750.01"));
        assert_eq!(round2(dec("25.004")), dec("25.00"));
    }

    #[test]
    fn test_price_display() {
        let p = Price::new(dec("19.995"), CurrencyCode::usd());
        assert_eq!(p.to_string(), "$20.00");

        let jpy = Price::new(dec("1500.75"), CurrencyCode::parse("JPY").unwrap());
        assert_eq!(jpy.to_string(), "\u{a5}1500");
    }
}
