//! Tier resolution for tiered prices.
//!
//! [`TierResolver`] attributes a quantity to the sorted tiers of a price and reports
//! each tier's share of the quantity and cost, which is what the breakup builder and
//! invoice rendering need on top of the total.

use rust_decimal::Decimal;

use crate::error::{ensure_non_negative, PricingError, Result};
use crate::price::{PriceConfig, PriceTier, TierMode};

/// Quantity and cost attributed to one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAllocation {
    /// Index of the tier in sorted order.
    pub tier_index: usize,
    /// Units attributed to the tier.
    pub quantity: Decimal,
    /// Cost of those units, including the tier's flat amount.
    pub cost: Decimal,
}

/// Outcome of resolving a quantity against a tier schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierResolution {
    /// Mode used for the resolution.
    pub mode: TierMode,
    /// Tiers that received quantity, in ascending tier order.
    pub allocations: Vec<TierAllocation>,
    /// Sum of allocation costs. Unrounded.
    pub total: Decimal,
    /// Slab quantity beyond the last finite tier when there is no open tier.
    pub unallocated: Decimal,
}

impl TierResolution {
    fn empty(mode: TierMode) -> Self {
        Self {
            mode,
            allocations: Vec::new(),
            total: Decimal::ZERO,
            unallocated: Decimal::ZERO,
        }
    }

    /// Highest-index tier that received a nonzero quantity.
    #[must_use]
    pub fn selected_tier(&self) -> Option<usize> {
        self.allocations
            .iter()
            .rev()
            .find(|a| !a.quantity.is_zero())
            .map(|a| a.tier_index)
    }

    /// Total quantity attributed to tiers.
    #[must_use]
    pub fn allocated_quantity(&self) -> Decimal {
        self.allocations.iter().map(|a| a.quantity).sum()
    }
}

/// Attributes quantities to the tiers of one price.
#[derive(Debug, Clone, Copy)]
pub struct TierResolver<'a> {
    price: &'a PriceConfig,
}

impl<'a> TierResolver<'a> {
    /// Create a resolver for a tiered price.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::EmptyTiers`] if the price has no tiers.
    pub fn new(price: &'a PriceConfig) -> Result<Self> {
        if price.tiers.is_empty() {
            return Err(PricingError::EmptyTiers {
                price_id: price.id.to_string(),
            });
        }
        Ok(Self { price })
    }

    /// Resolve `quantity` under the price's configured tier mode.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::MissingTierMode`] if no tier mode is set, or an error
    /// from [`resolve_with`](Self::resolve_with).
    pub fn resolve(&self, quantity: Decimal) -> Result<TierResolution> {
        self.resolve_with(self.price.tier_mode()?, quantity)
    }

    /// Resolve `quantity` under `mode`.
    ///
    /// A zero quantity allocates nothing and costs nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeQuantity`] for negative input and
    /// [`PricingError::Overflow`] if the cost exceeds the decimal range.
    pub fn resolve_with(&self, mode: TierMode, quantity: Decimal) -> Result<TierResolution> {
        ensure_non_negative(quantity)?;
        if quantity.is_zero() {
            return Ok(TierResolution::empty(mode));
        }

        match mode {
            TierMode::Volume => self.volume(quantity),
            TierMode::Slab => self.slab(quantity),
        }
    }

    /// Index of the tier a volume-priced `quantity` falls into.
    ///
    /// Bounds are inclusive. Quantities above every finite bound fall into the open
    /// tier, or into the highest tier when there is none.
    #[must_use]
    pub fn volume_tier_index(&self, quantity: Decimal) -> usize {
        let tiers = self.price.tiers.as_slice();
        tiers
            .iter()
            .position(|tier| match tier.up_to {
                Some(up_to) => quantity <= Decimal::from(up_to),
                None => true,
            })
            .unwrap_or(tiers.len() - 1)
    }

    fn volume(&self, quantity: Decimal) -> Result<TierResolution> {
        let index = self.volume_tier_index(quantity);
        let tier = self.tier(index)?;
        let cost = tier
            .calculate_amount(quantity)
            .ok_or_else(|| self.price.overflow())?;

        tracing::debug!(
            price_id = %self.price.id,
            %quantity,
            tier_index = index,
            %cost,
            "Resolved volume tier"
        );

        Ok(TierResolution {
            mode: TierMode::Volume,
            allocations: vec![TierAllocation {
                tier_index: index,
                quantity,
                cost,
            }],
            total: cost,
            unallocated: Decimal::ZERO,
        })
    }

    fn slab(&self, quantity: Decimal) -> Result<TierResolution> {
        let mut resolution = TierResolution::empty(TierMode::Slab);
        let mut remaining = quantity;
        let mut previous_bound = Decimal::ZERO;

        for (index, tier) in self.price.tiers.iter().enumerate() {
            if remaining.is_zero() {
                break;
            }

            let allocated = match tier.up_to {
                Some(up_to) => {
                    let bound = Decimal::from(up_to);
                    let capacity = (bound - previous_bound).max(Decimal::ZERO);
                    previous_bound = bound;
                    remaining.min(capacity)
                }
                None => remaining,
            };

            if allocated.is_zero() {
                continue;
            }

            let cost = tier
                .calculate_amount(allocated)
                .ok_or_else(|| self.price.overflow())?;

            tracing::debug!(
                price_id = %self.price.id,
                %quantity,
                tier_index = index,
                %allocated,
                %cost,
                "Allocated slab tier"
            );

            resolution.total = resolution
                .total
                .checked_add(cost)
                .ok_or_else(|| self.price.overflow())?;
            resolution.allocations.push(TierAllocation {
                tier_index: index,
                quantity: allocated,
                cost,
            });
            remaining -= allocated;
        }

        resolution.unallocated = remaining;
        Ok(resolution)
    }

    fn tier(&self, index: usize) -> Result<&'a PriceTier> {
        self.price.tiers.get(index).ok_or_else(|| PricingError::EmptyTiers {
            price_id: self.price.id.to_string(),
        })
    }
}
