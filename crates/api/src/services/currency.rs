//! Currency conversion with a refreshing rate cache.
//!
//! One set of rates is held against the base currency (USD) and
//! refreshed from an external source at most once per interval. Rate
//! lookups never fail: a fetch problem keeps the previous cache, an
//! empty cache falls back to a static table, and unknown codes resolve
//! to a 1:1 rate. Checkout is never blocked on currency data.
//!
//! The converter is owned by application state and injected where
//! needed; it is not process-global.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::RwLock;

use avoi_core::CurrencyCode;
use avoi_core::currency::round2;

use crate::config::RatesConfig;

/// Nationality to currency mapping used at registration.
const NATIONALITY_CURRENCIES: &[(&str, &str)] = &[
    ("Nigeria", "NGN"),
    ("United States", "USD"),
    ("United Kingdom", "GBP"),
    ("Canada", "CAD"),
    ("Australia", "AUD"),
    ("South Africa", "ZAR"),
    ("Ghana", "GHS"),
    ("Kenya", "KES"),
    ("Germany", "EUR"),
    ("France", "EUR"),
    ("Italy", "EUR"),
    ("Spain", "EUR"),
    ("Netherlands", "EUR"),
    ("Japan", "JPY"),
    ("China", "CNY"),
    ("India", "INR"),
    ("Brazil", "BRL"),
    ("Mexico", "MXN"),
];

/// Static fallback rates (approximate), as (code, mantissa, scale).
/// Used only when no fetch has ever succeeded.
const FALLBACK_RATES: &[(&str, i64, u32)] = &[
    ("NGN", 7500, 1),  // 750.0
    ("GBP", 79, 2),    // 0.79
    ("EUR", 85, 2),    // 0.85
    ("CAD", 125, 2),   // 1.25
    ("AUD", 135, 2),   // 1.35
    ("ZAR", 150, 1),   // 15.0
    ("GHS", 60, 1),    // 6.0
    ("KES", 1100, 1),  // 110.0
    ("JPY", 1100, 1),  // 110.0
    ("CNY", 65, 1),    // 6.5
    ("INR", 750, 1),   // 75.0
    ("BRL", 50, 1),    // 5.0
    ("MXN", 200, 1),   // 20.0
    ("USD", 1, 0),
];

/// Currency code for a nationality; unmapped nationalities get the base
/// currency.
#[must_use]
pub fn nationality_currency(nationality: &str) -> CurrencyCode {
    let code = NATIONALITY_CURRENCIES
        .iter()
        .find(|(country, _)| *country == nationality)
        .map_or("USD", |(_, code)| code);

    // The table only holds well-formed codes.
    CurrencyCode::parse(code).unwrap_or_else(|_| CurrencyCode::usd())
}

/// Body shape of the exchange-rate API response.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

#[derive(Debug, Default)]
struct RateCache {
    rates: HashMap<String, Decimal>,
    last_updated: Option<Instant>,
}

/// Exchange-rate provider quoted against the base currency.
pub struct CurrencyConverter {
    client: reqwest::Client,
    url: String,
    refresh_interval: Duration,
    cache: RwLock<RateCache>,
}

impl CurrencyConverter {
    /// Create a converter from rate-source configuration.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client fails to build.
    pub fn new(config: &RatesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            refresh_interval: config.refresh_interval,
            cache: RwLock::new(RateCache::default()),
        })
    }

    /// The exchange rate from the base currency to `currency`.
    ///
    /// The base currency is always exactly 1.0. A stale or empty cache
    /// triggers a refresh first; unknown codes resolve to 1.0.
    pub async fn rate_for(&self, currency: &CurrencyCode) -> Decimal {
        if currency.is_base() {
            return Decimal::ONE;
        }

        if self.needs_refresh().await {
            self.refresh().await;
        }

        let cache = self.cache.read().await;
        cache
            .rates
            .get(currency.as_str())
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    /// Convert an amount from the base currency, rounded to 2dp.
    pub async fn convert(&self, amount: Decimal, currency: &CurrencyCode) -> Decimal {
        if currency.is_base() {
            return round2(amount);
        }
        let rate = self.rate_for(currency).await;
        round2(amount * rate)
    }

    async fn needs_refresh(&self) -> bool {
        let cache = self.cache.read().await;
        match cache.last_updated {
            Some(at) => at.elapsed() > self.refresh_interval,
            None => true,
        }
    }

    /// Fetch fresh rates; on any failure keep the previous cache, or
    /// prime it from the static table when nothing has ever been cached.
    async fn refresh(&self) {
        match self.fetch_rates().await {
            Ok(rates) => {
                let mut cache = self.cache.write().await;
                cache.rates = rates;
                cache.last_updated = Some(Instant::now());
                tracing::debug!(count = cache.rates.len(), "exchange rates refreshed");
            }
            Err(err) => {
                tracing::warn!(error = %err, "exchange rate fetch failed");
                let mut cache = self.cache.write().await;
                if cache.rates.is_empty() {
                    cache.rates = fallback_rates();
                    cache.last_updated = Some(Instant::now());
                }
            }
        }
    }

    async fn fetch_rates(&self) -> Result<HashMap<String, Decimal>, reqwest::Error> {
        let url = format!("{}/USD", self.url);
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<RatesResponse>()
            .await?;

        Ok(response
            .rates
            .into_iter()
            .filter_map(|(code, rate)| Decimal::from_f64_retain(rate).map(|r| (code, r)))
            .collect())
    }
}

fn fallback_rates() -> HashMap<String, Decimal> {
    FALLBACK_RATES
        .iter()
        .map(|&(code, mantissa, scale)| (code.to_owned(), Decimal::new(mantissa, scale)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn converter() -> CurrencyConverter {
        CurrencyConverter::new(&RatesConfig::default()).unwrap()
    }

    /// Prime the cache as if a fetch had just failed against an empty
    /// cache, so tests never touch the network.
    async fn prime_fallback(converter: &CurrencyConverter) {
        let mut cache = converter.cache.write().await;
        cache.rates = fallback_rates();
        cache.last_updated = Some(Instant::now());
    }

    #[test]
    fn test_nationality_currency_mapped() {
        assert_eq!(nationality_currency("Nigeria").as_str(), "NGN");
        assert_eq!(nationality_currency("United Kingdom").as_str(), "GBP");
        assert_eq!(nationality_currency("Germany").as_str(), "EUR");
        assert_eq!(nationality_currency("France").as_str(), "EUR");
    }

    #[test]
    fn test_nationality_currency_unmapped_defaults_to_base() {
        assert_eq!(nationality_currency("Atlantis").as_str(), "USD");
        assert_eq!(nationality_currency("").as_str(), "USD");
    }

    #[tokio::test]
    async fn test_rate_for_base_is_always_one() {
        let converter = converter();
        assert_eq!(converter.rate_for(&CurrencyCode::usd()).await, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_rate_for_uses_cached_rates() {
        let converter = converter();
        prime_fallback(&converter).await;

        let ngn = CurrencyCode::parse("NGN").unwrap();
        assert_eq!(converter.rate_for(&ngn).await, Decimal::new(7500, 1));
    }

    #[tokio::test]
    async fn test_rate_for_unknown_code_is_one() {
        let converter = converter();
        prime_fallback(&converter).await;

        let unknown = CurrencyCode::parse("XXA").unwrap();
        assert_eq!(converter.rate_for(&unknown).await, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_convert_rounds_to_two_places() {
        let converter = converter();
        prime_fallback(&converter).await;

        // 25.00 USD at 750.0 = 18750.00 NGN
        let ngn = CurrencyCode::parse("NGN").unwrap();
        let converted = converter.convert(Decimal::new(2500, 2), &ngn).await;
        assert_eq!(converted, Decimal::new(1_875_000, 2));
    }

    #[test]
    fn test_fallback_table_covers_supported_currencies() {
        let rates = fallback_rates();
        for (_, code) in NATIONALITY_CURRENCIES {
            assert!(rates.contains_key(*code), "missing fallback for {code}");
        }
    }
}
