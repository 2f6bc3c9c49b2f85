//! Runtime configuration.
//!
//! Everything the client and the normalizer need from the outside world
//! lives in [`Config`] and is passed down explicitly. Values come from
//! `QUIKWING_*` environment variables (optionally via a `.env` file).

use std::collections::BTreeMap;
use std::time::Duration;

use crate::currency::{ExchangeRates, DEFAULT_RATES_URL};
use crate::error::FlightError;
use crate::normalize::NormalizeOptions;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOGO_URL: &str = "https://images.kiwi.com/airlines/64/{code}.png";
pub const DEFAULT_BOOKING_URL: &str = "https://www.kiwi.com";
pub const DEFAULT_PAGE_SIZE: usize = 15;

pub const ROUND_TRIP_PATH: &str = "/flights/search/round-trip";
pub const ONE_WAY_PATH: &str = "/flights/search/one-way";
pub const AIRPORTS_PATH: &str = "/api/v1/airports/search";
pub const LOGIN_PATH: &str = "/login";

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const AUTOCOMPLETE_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub proxy: Option<String>,
    pub timeout: u64,
    pub token: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: 30,
            token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub currency: String,
    pub page_size: usize,
    pub logo_url_template: String,
    pub booking_base_url: String,
    pub fetch: FetchOptions,
    pub currency_symbols: CurrencySymbols,
    /// Live exchange-rate table, quoted per one USD.
    pub rates_url: String,
    pub fallback_rates: ExchangeRates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            currency: "USD".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            logo_url_template: DEFAULT_LOGO_URL.to_string(),
            booking_base_url: DEFAULT_BOOKING_URL.to_string(),
            fetch: FetchOptions::default(),
            currency_symbols: CurrencySymbols::default(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            fallback_rates: ExchangeRates::fallback(),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::Config`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, FlightError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, so tests can feed a map
    /// instead of touching the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::Config`] when a numeric variable does not parse
    /// or the page size is zero.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlightError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let or_default = |var: &str, default: &str| -> String {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let parse_u64 = |var: &str, default: u64| -> Result<u64, FlightError> {
            match lookup(var).filter(|v| !v.trim().is_empty()) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|e| FlightError::Config {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
                None => Ok(default),
            }
        };

        let page_size = parse_u64("QUIKWING_PAGE_SIZE", DEFAULT_PAGE_SIZE as u64)?;
        if page_size == 0 {
            return Err(FlightError::Config {
                var: "QUIKWING_PAGE_SIZE".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            api_url: or_default("QUIKWING_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            currency: or_default("QUIKWING_CURRENCY", &defaults.currency).to_uppercase(),
            page_size: page_size as usize,
            logo_url_template: or_default("QUIKWING_LOGO_URL", DEFAULT_LOGO_URL),
            booking_base_url: or_default("QUIKWING_BOOKING_URL", DEFAULT_BOOKING_URL)
                .trim_end_matches('/')
                .to_string(),
            fetch: FetchOptions {
                proxy: lookup("QUIKWING_PROXY").filter(|v| !v.trim().is_empty()),
                timeout: parse_u64("QUIKWING_TIMEOUT", defaults.fetch.timeout)?,
                token: lookup("QUIKWING_TOKEN").filter(|v| !v.trim().is_empty()),
            },
            currency_symbols: CurrencySymbols::default(),
            rates_url: or_default("QUIKWING_RATES_URL", DEFAULT_RATES_URL),
            fallback_rates: ExchangeRates::fallback(),
        })
    }

    pub fn normalize_options(&self, currency: &str) -> NormalizeOptions {
        NormalizeOptions {
            currency: currency.to_string(),
            logo_url_template: self.logo_url_template.clone(),
            booking_base_url: self.booking_base_url.clone(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

/// Display symbols per ISO currency code.
#[derive(Debug, Clone)]
pub struct CurrencySymbols(BTreeMap<String, String>);

impl Default for CurrencySymbols {
    fn default() -> Self {
        let table = [
            ("USD", "$"),
            ("EUR", "€"),
            ("GBP", "£"),
            ("JPY", "¥"),
            ("CNY", "¥"),
            ("INR", "₹"),
            ("AUD", "A$"),
            ("CAD", "C$"),
            ("CHF", "CHF "),
        ];
        Self(
            table
                .iter()
                .map(|(code, sym)| ((*code).to_string(), (*sym).to_string()))
                .collect(),
        )
    }
}

impl CurrencySymbols {
    pub fn symbol(&self, currency: &str) -> Option<&str> {
        self.0.get(currency).map(String::as_str)
    }

    /// Whole-unit price with the currency's symbol, or `"{price} {code}"`
    /// when the code is unknown.
    pub fn format_price(&self, price: f64, currency: &str) -> String {
        let p = price.round() as i64;
        match self.symbol(currency) {
            Some(sym) => format!("{sym}{p}"),
            None => format!("{p} {currency}"),
        }
    }
}
