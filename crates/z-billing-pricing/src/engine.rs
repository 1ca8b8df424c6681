//! Pricing engine façade.

use rust_decimal::Decimal;

use crate::currency::{round_to_currency, CurrencyPrecision, CurrencyTable};

/// Entry point for cost calculation.
///
/// Holds the currency precision lookup used for final rounding. Cost operations are
/// defined next to their components: single quantities in
/// [`calculator`](crate::calculator), bucketed usage in [`buckets`](crate::buckets),
/// and breakups in [`breakup`](crate::breakup).
///
/// The engine holds no mutable state; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine<P = CurrencyTable> {
    currencies: P,
}

impl PricingEngine {
    /// Create an engine with the built-in currency table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the built-in table plus environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_currencies(CurrencyTable::from_env())
    }
}

impl<P: CurrencyPrecision> PricingEngine<P> {
    /// Create an engine with a custom precision lookup.
    #[must_use]
    pub const fn with_currencies(currencies: P) -> Self {
        Self { currencies }
    }

    /// The precision lookup in use.
    #[must_use]
    pub const fn currencies(&self) -> &P {
        &self.currencies
    }

    /// Round `amount` to the precision of `currency`.
    #[must_use]
    pub fn round(&self, amount: Decimal, currency: &str) -> Decimal {
        round_to_currency(&self.currencies, amount, currency)
    }
}
