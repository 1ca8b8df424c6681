//! Cost of usage reported as per-bucket maxima.
//!
//! Each bucket value is priced on its own and the per-bucket costs are summed. This
//! is not the same as pricing the sum of the bucket values: with tiers at 1000 and
//! 5000, two buckets of 1200 each fill the first slab tier twice, while a combined
//! 2400 fills it once.

use rust_decimal::Decimal;

use crate::calculator::calculate_cost;
use crate::currency::CurrencyPrecision;
use crate::engine::PricingEngine;
use crate::error::Result;
use crate::price::{BillingModel, PriceConfig};
use crate::tiers::TierResolver;

/// Unrounded sum of the independent per-bucket costs of `bucket_values`.
///
/// An empty sequence costs zero.
///
/// # Errors
///
/// Returns a configuration error for a malformed price, or the first input or
/// overflow error met while pricing a bucket.
pub fn bucketed_cost(price: &PriceConfig, bucket_values: &[Decimal]) -> Result<Decimal> {
    let mut total = Decimal::ZERO;

    match price.billing_model {
        BillingModel::Tiered => {
            let resolver = TierResolver::new(price)?;
            let mode = price.tier_mode()?;
            for &value in bucket_values {
                let cost = resolver.resolve_with(mode, value)?.total;
                total = total.checked_add(cost).ok_or_else(|| price.overflow())?;
            }
        }
        BillingModel::FlatFee | BillingModel::Package => {
            for &value in bucket_values {
                let cost = calculate_cost(price, value)?;
                total = total.checked_add(cost).ok_or_else(|| price.overflow())?;
            }
        }
    }

    Ok(total)
}

impl<P: CurrencyPrecision> PricingEngine<P> {
    /// Cost of bucketed usage, rounded once after summation.
    ///
    /// # Errors
    ///
    /// See [`bucketed_cost`].
    pub fn calculate_bucketed_cost(
        &self,
        price: &PriceConfig,
        bucket_values: &[Decimal],
    ) -> Result<Decimal> {
        let total = bucketed_cost(price, bucket_values)?;

        tracing::debug!(
            price_id = %price.id,
            num_buckets = bucket_values.len(),
            %total,
            "Calculated bucketed cost"
        );

        Ok(self.round(total, &price.currency))
    }
}
