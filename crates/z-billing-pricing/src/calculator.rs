//! Single-quantity cost calculation.

use rust_decimal::Decimal;

use crate::currency::CurrencyPrecision;
use crate::engine::PricingEngine;
use crate::error::{ensure_non_negative, Result};
use crate::price::{BillingModel, PriceConfig, RoundMode};
use crate::tiers::TierResolver;

/// Unrounded cost of `quantity` under `price`.
///
/// - Flat fee: the price amount, whatever the quantity (including zero).
/// - Package: `amount * round(quantity / divide_by)`.
/// - Tiered: the tier resolution total under the configured tier mode.
///
/// # Errors
///
/// Returns a configuration error for a malformed price,
/// [`PricingError::NegativeQuantity`](crate::PricingError::NegativeQuantity) for negative input, and
/// [`PricingError::Overflow`](crate::PricingError::Overflow) if the cost exceeds the decimal range.
pub fn calculate_cost(price: &PriceConfig, quantity: Decimal) -> Result<Decimal> {
    ensure_non_negative(quantity)?;

    match price.billing_model {
        BillingModel::FlatFee => Ok(price.amount),
        BillingModel::Package => {
            let packages = package_count(price, quantity)?;
            price
                .amount
                .checked_mul(packages)
                .ok_or_else(|| price.overflow())
        }
        BillingModel::Tiered => {
            let resolver = TierResolver::new(price)?;
            Ok(resolver.resolve(quantity)?.total)
        }
    }
}

/// Number of packages billed for `quantity` under a package price.
///
/// # Errors
///
/// Returns [`PricingError::InvalidDivideBy`](crate::PricingError::InvalidDivideBy) when the price has no positive divisor.
pub fn package_count(price: &PriceConfig, quantity: Decimal) -> Result<Decimal> {
    let (divide_by, round) = price.divide_by()?;

    // quantity = whole * divide_by + remainder, with no rounding on either side.
    let remainder = quantity
        .checked_rem(divide_by)
        .ok_or_else(|| price.overflow())?;
    let whole = (quantity - remainder)
        .checked_div(divide_by)
        .ok_or_else(|| price.overflow())?
        .trunc();

    Ok(match round {
        RoundMode::Up if !remainder.is_zero() => whole + Decimal::ONE,
        RoundMode::Up | RoundMode::Down => whole,
    })
}

impl<P: CurrencyPrecision> PricingEngine<P> {
    /// Unrounded cost of `quantity`; see [`calculate_cost`].
    ///
    /// # Errors
    ///
    /// See [`calculate_cost`].
    pub fn calculate_cost(&self, price: &PriceConfig, quantity: Decimal) -> Result<Decimal> {
        calculate_cost(price, quantity)
    }

    /// Cost of `quantity` rounded once to the price's currency precision.
    ///
    /// # Errors
    ///
    /// See [`calculate_cost`].
    pub fn calculate_cost_rounded(&self, price: &PriceConfig, quantity: Decimal) -> Result<Decimal> {
        let cost = calculate_cost(price, quantity)?;
        Ok(self.round(cost, &price.currency))
    }

    /// Rounded cost, charging zero when the price is misconfigured.
    ///
    /// For callers that must keep aggregating unrelated usage when one price is broken.
    /// The configuration error is logged with the price id. Input errors are still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeQuantity`](crate::PricingError::NegativeQuantity) and [`PricingError::Overflow`](crate::PricingError::Overflow).
    pub fn calculate_cost_or_zero(&self, price: &PriceConfig, quantity: Decimal) -> Result<Decimal> {
        match self.calculate_cost_rounded(price, quantity) {
            Err(e) if e.is_configuration() => {
                tracing::error!(
                    price_id = %price.id,
                    billing_model = %price.billing_model,
                    error = %e,
                    "Misconfigured price, charging zero"
                );
                Ok(Decimal::ZERO)
            }
            other => other,
        }
    }
}
