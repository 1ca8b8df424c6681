//! Auditable cost decomposition for invoice lines and price sheets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::calculate_cost;
use crate::currency::CurrencyPrecision;
use crate::engine::PricingEngine;
use crate::error::{ensure_non_negative, Result};
use crate::price::{BillingModel, PriceConfig};
use crate::tiers::TierResolver;

/// How a cost was arrived at.
///
/// Only `final_cost` is ever rounded; the unit figures keep full precision for the
/// display layer to format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakup {
    /// Final cost divided by quantity, or zero when quantity is zero. For flat fees,
    /// the fee itself.
    pub effective_unit_cost: Decimal,

    /// Index of the applied tier in sorted order; `None` when no tier applies.
    pub selected_tier_index: Option<usize>,

    /// Unit amount of the applied tier (package amount per unit for packages).
    pub tier_unit_amount: Decimal,

    /// Total cost.
    pub final_cost: Decimal,
}

impl CostBreakup {
    /// Selected tier index with `-1` standing for "no tier".
    #[must_use]
    pub fn as_signed_index(&self) -> i64 {
        self.selected_tier_index
            .map_or(-1, |i| i64::try_from(i).unwrap_or(i64::MAX))
    }
}

/// Unrounded breakup of the cost of `quantity` under `price`.
///
/// # Errors
///
/// Same as [`calculate_cost`]. In addition, returns
/// [`PricingError::Overflow`](crate::PricingError::Overflow) when the effective unit
/// cost falls outside the decimal range, which can happen for a fixed charge spread
/// over a vanishingly small quantity even though the cost itself is representable.
pub fn cost_breakup(price: &PriceConfig, quantity: Decimal) -> Result<CostBreakup> {
    ensure_non_negative(quantity)?;

    match price.billing_model {
        BillingModel::FlatFee => Ok(CostBreakup {
            effective_unit_cost: price.amount,
            selected_tier_index: None,
            tier_unit_amount: price.amount,
            final_cost: price.amount,
        }),

        BillingModel::Package => {
            let (divide_by, _) = price.divide_by()?;
            let tier_unit_amount = price
                .amount
                .checked_div(divide_by)
                .ok_or_else(|| price.overflow())?;

            if quantity.is_zero() {
                return Ok(CostBreakup {
                    effective_unit_cost: Decimal::ZERO,
                    selected_tier_index: None,
                    tier_unit_amount,
                    final_cost: Decimal::ZERO,
                });
            }

            let final_cost = calculate_cost(price, quantity)?;
            Ok(CostBreakup {
                effective_unit_cost: per_unit(price, final_cost, quantity)?,
                selected_tier_index: None,
                tier_unit_amount,
                final_cost,
            })
        }

        BillingModel::Tiered => {
            let resolution = TierResolver::new(price)?.resolve(quantity)?;
            let selected_tier_index = resolution.selected_tier();
            let tier_unit_amount = selected_tier_index
                .and_then(|i| price.tiers.get(i))
                .map_or(Decimal::ZERO, |tier| tier.unit_amount);

            Ok(CostBreakup {
                effective_unit_cost: per_unit(price, resolution.total, quantity)?,
                selected_tier_index,
                tier_unit_amount,
                final_cost: resolution.total,
            })
        }
    }
}

fn per_unit(price: &PriceConfig, cost: Decimal, quantity: Decimal) -> Result<Decimal> {
    if quantity.is_zero() {
        return Ok(Decimal::ZERO);
    }
    cost.checked_div(quantity).ok_or_else(|| price.overflow())
}

impl<P: CurrencyPrecision> PricingEngine<P> {
    /// Breakup of the cost of `quantity`, with `final_cost` rounded to the currency
    /// precision when `round` is set.
    ///
    /// # Errors
    ///
    /// Same as [`calculate_cost`].
    pub fn calculate_cost_with_breakup(
        &self,
        price: &PriceConfig,
        quantity: Decimal,
        round: bool,
    ) -> Result<CostBreakup> {
        let mut breakup = cost_breakup(price, quantity)?;
        if round {
            breakup.final_cost = self.round(breakup.final_cost, &price.currency);
        }
        Ok(breakup)
    }
}
