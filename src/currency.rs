//! Exchange rates for showing prices in a currency other than the one the
//! search was priced in.
//!
//! Rates are quoted against a base currency (USD by default). A live table
//! is fetched from `Config::rates_url` and kept for [`RATES_TTL`]; when the
//! fetch fails the built-in fallback table is used instead.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::fetch::ApiClient;
use crate::model::{Flight, SearchResult};

pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";
pub const RATES_TTL: Duration = Duration::from_secs(3600);

/// Units of each currency per one USD.
pub const FALLBACK_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 151.5),
    ("AUD", 1.52),
    ("CAD", 1.36),
    ("CHF", 0.91),
    ("CNY", 7.23),
    ("INR", 83.5),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExchangeRates {
    #[serde(default = "default_base")]
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

fn default_base() -> String {
    "USD".to_string()
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::fallback()
    }
}

impl ExchangeRates {
    pub fn fallback() -> Self {
        Self {
            base: default_base(),
            rates: FALLBACK_RATES
                .iter()
                .map(|(code, rate)| ((*code).to_string(), *rate))
                .collect(),
        }
    }

    /// Units of `currency` per one unit of the base. Unknown codes and
    /// unusable rates count as 1, so conversion degrades to a relabel.
    pub fn rate(&self, currency: &str) -> f64 {
        let code = currency.to_ascii_uppercase();
        if code == self.base {
            return 1.0;
        }
        self.rates
            .get(&code)
            .copied()
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0)
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        if from.eq_ignore_ascii_case(to) {
            return amount;
        }
        amount / self.rate(from) * self.rate(to)
    }

    pub fn convert_flight(&self, flight: &mut Flight, to: &str) {
        flight.price = self.convert(flight.price, &flight.currency, to);
        flight.currency = to.to_ascii_uppercase();
    }

    /// Re-prices a whole result for display. Filtering and ranking already
    /// happened in the search currency.
    pub fn convert_result(&self, result: &mut SearchResult, to: &str) {
        for flight in &mut result.flights {
            self.convert_flight(flight, to);
        }
        result.currency = to.to_ascii_uppercase();
    }
}

/// Holds the last fetched table and refreshes it once it is older than the
/// TTL.
#[derive(Debug)]
pub struct RateCache {
    rates: ExchangeRates,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(ExchangeRates::fallback(), RATES_TTL)
    }
}

impl RateCache {
    pub fn new(fallback: ExchangeRates, ttl: Duration) -> Self {
        Self {
            rates: fallback,
            fetched_at: None,
            ttl,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.fetched_at.is_none_or(|at| at.elapsed() >= self.ttl)
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    /// Current rates, refetching when stale. A failed fetch keeps whatever
    /// table is already held (the fallback on first use) and retries on the
    /// next call.
    pub async fn current(&mut self, client: &ApiClient) -> &ExchangeRates {
        if self.is_stale() {
            match client.fetch_rates().await {
                Ok(rates) => {
                    tracing::debug!(currencies = rates.rates.len(), "exchange rates refreshed");
                    self.rates = rates;
                    self.fetched_at = Some(Instant::now());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "exchange rate fetch failed, using held rates");
                }
            }
        }
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_table_converts_from_usd() {
        let rates = ExchangeRates::fallback();
        assert!((rates.convert(100.0, "USD", "EUR") - 92.0).abs() < 1e-9);
        assert_eq!(rates.convert(100.0, "usd", "USD"), 100.0);
        assert!((rates.convert(92.0, "EUR", "GBP") - 79.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_currency_counts_as_parity() {
        let rates = ExchangeRates::fallback();
        assert_eq!(rates.rate("XYZ"), 1.0);
        assert_eq!(rates.convert(50.0, "USD", "XYZ"), 50.0);
    }

    #[test]
    fn zero_rate_is_ignored() {
        let mut rates = ExchangeRates::fallback();
        rates.rates.insert("EUR".into(), 0.0);
        assert_eq!(rates.rate("EUR"), 1.0);
    }

    #[test]
    fn result_is_relabelled() {
        let mut result = SearchResult {
            currency: "USD".into(),
            flights: vec![Flight {
                price: 200.0,
                currency: "USD".into(),
                ..Flight::default()
            }],
        };
        ExchangeRates::fallback().convert_result(&mut result, "jpy");
        assert_eq!(result.currency, "JPY");
        assert_eq!(result.flights[0].currency, "JPY");
        assert_eq!(result.flights[0].price, 30300.0);
    }

    #[test]
    fn new_cache_is_stale_and_holds_fallback() {
        let cache = RateCache::default();
        assert!(cache.is_stale());
        assert_eq!(cache.rates(), &ExchangeRates::fallback());
    }
}
