//! Currency precision, rounding, and amount formatting.
//!
//! Every monetary rounding in the crate goes through [`round_to_currency`], so the same
//! amount in the same currency always rounds to the same value. Intermediate results
//! are never rounded.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Environment variable holding `code=precision` overrides, e.g. `usd=2,btc=8`.
pub const CURRENCY_PRECISION_ENV: &str = "PRICING_CURRENCY_PRECISION";

/// Decimal places used for currencies missing from the table.
pub const DEFAULT_CURRENCY_PRECISION: u32 = 2;

/// Lookup of the number of decimal places a currency is rounded to.
///
/// Implemented by [`CurrencyTable`]; services with their own currency registry can
/// implement it and hand it to [`PricingEngine`](crate::PricingEngine).
pub trait CurrencyPrecision {
    /// Decimal places for `currency` (ISO 4217 code, any case).
    fn precision_for(&self, currency: &str) -> u32;
}

/// Round `amount` to the precision of `currency`, half away from zero.
#[must_use]
pub fn round_to_currency<P>(lookup: &P, amount: Decimal, currency: &str) -> Decimal
where
    P: CurrencyPrecision + ?Sized,
{
    amount.round_dp_with_strategy(
        lookup.precision_for(currency),
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Precision and display symbol of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Decimal places of the minor unit.
    pub precision: u32,
    /// Display symbol (e.g. `$`).
    pub symbol: String,
}

impl CurrencyConfig {
    fn new(precision: u32, symbol: &str) -> Self {
        Self {
            precision,
            symbol: symbol.to_string(),
        }
    }
}

/// Per-currency precision table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyTable {
    /// Known currencies keyed by lowercase ISO code.
    #[serde(default, deserialize_with = "lowercase_keys")]
    pub currencies: HashMap<String, CurrencyConfig>,

    /// Precision used for currencies not in the table.
    #[serde(default = "default_precision")]
    pub default_precision: u32,
}

const fn default_precision() -> u32 {
    DEFAULT_CURRENCY_PRECISION
}

fn lowercase_keys<'de, D>(deserializer: D) -> Result<HashMap<String, CurrencyConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, CurrencyConfig>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(code, config)| (code.to_ascii_lowercase(), config))
        .collect())
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let mut currencies = HashMap::new();

        for (code, symbol) in [
            ("usd", "$"),
            ("eur", "€"),
            ("gbp", "£"),
            ("inr", "₹"),
            ("aud", "A$"),
            ("cad", "C$"),
            ("sgd", "S$"),
            ("chf", "CHF"),
            ("cny", "¥"),
            ("brl", "R$"),
            ("mxn", "MX$"),
            ("aed", "AED"),
        ] {
            currencies.insert(code.to_string(), CurrencyConfig::new(2, symbol));
        }

        // Zero-decimal currencies
        for (code, symbol) in [
            ("jpy", "¥"),
            ("krw", "₩"),
            ("vnd", "₫"),
            ("clp", "CLP$"),
            ("isk", "kr"),
        ] {
            currencies.insert(code.to_string(), CurrencyConfig::new(0, symbol));
        }

        // Three-decimal currencies
        for (code, symbol) in [
            ("bhd", "BD"),
            ("kwd", "KD"),
            ("omr", "OMR"),
            ("jod", "JD"),
            ("tnd", "DT"),
        ] {
            currencies.insert(code.to_string(), CurrencyConfig::new(3, symbol));
        }

        Self {
            currencies,
            default_precision: DEFAULT_CURRENCY_PRECISION,
        }
    }
}

impl CurrencyTable {
    /// Create a table with the built-in currencies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the built-in table and apply overrides from `PRICING_CURRENCY_PRECISION`.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(CURRENCY_PRECISION_ENV) {
            Ok(overrides) => Self::default().with_precision_overrides(&overrides),
            Err(_) => Self::default(),
        }
    }

    /// Add or replace a currency.
    #[must_use]
    pub fn with_currency(
        mut self,
        code: impl AsRef<str>,
        precision: u32,
        symbol: impl Into<String>,
    ) -> Self {
        self.currencies.insert(
            code.as_ref().to_ascii_lowercase(),
            CurrencyConfig {
                precision,
                symbol: symbol.into(),
            },
        );
        self
    }

    /// Set the precision used for unknown currencies.
    #[must_use]
    pub fn with_default_precision(mut self, precision: u32) -> Self {
        self.default_precision = precision;
        self
    }

    /// Apply a comma-separated `code=precision` list. Malformed entries are skipped.
    #[must_use]
    pub fn with_precision_overrides(mut self, overrides: &str) -> Self {
        for entry in overrides.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parsed = entry
                .split_once('=')
                .and_then(|(code, precision)| {
                    let code = code.trim().to_ascii_lowercase();
                    let precision = precision.trim().parse::<u32>().ok()?;
                    (!code.is_empty() && precision <= Decimal::MAX_SCALE)
                        .then_some((code, precision))
                });

            let Some((code, precision)) = parsed else {
                tracing::warn!(entry, "Skipping malformed currency precision override");
                continue;
            };

            let symbol = self
                .currencies
                .get(&code)
                .map_or_else(|| code.to_ascii_uppercase(), |c| c.symbol.clone());
            self.currencies
                .insert(code, CurrencyConfig { precision, symbol });
        }
        self
    }

    /// Configuration for `currency`, if it is in the table.
    #[must_use]
    pub fn get(&self, currency: &str) -> Option<&CurrencyConfig> {
        self.currencies.get(&currency.to_ascii_lowercase())
    }

    /// Display symbol for `currency`; the upper-cased code when unknown.
    #[must_use]
    pub fn symbol_for(&self, currency: &str) -> String {
        self.get(currency)
            .map_or_else(|| currency.to_ascii_uppercase(), |c| c.symbol.clone())
    }

    /// Round to currency precision and render with a fixed number of decimals.
    #[must_use]
    pub fn format_amount(&self, amount: Decimal, currency: &str) -> String {
        let mut rounded = round_to_currency(self, amount, currency);
        rounded.rescale(self.precision_for(currency));
        rounded.to_string()
    }

    /// Like [`format_amount`](Self::format_amount), prefixed with the currency symbol.
    #[must_use]
    pub fn display_amount(&self, amount: Decimal, currency: &str) -> String {
        format!(
            "{}{}",
            self.symbol_for(currency),
            self.format_amount(amount, currency)
        )
    }
}

impl CurrencyPrecision for CurrencyTable {
    fn precision_for(&self, currency: &str) -> u32 {
        self.get(currency)
            .map_or(self.default_precision, |c| c.precision)
    }
}
