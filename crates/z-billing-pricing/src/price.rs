//! Price configuration.
//!
//! A [`PriceConfig`] is read-only once built. Its tiers live in a [`TierSchedule`],
//! which sorts them by upper bound when it is constructed or deserialized and offers
//! no way to reorder them afterwards, so a price can be shared across threads and
//! priced concurrently without any call observing a different tier order.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{PricingError, Result};
use crate::ids::PriceId;

/// Shape of the pricing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingModel {
    /// A fixed amount, regardless of quantity.
    FlatFee,
    /// A fixed amount per package of `divide_by` units.
    Package,
    /// Per-unit amounts that depend on quantity tiers.
    Tiered,
}

impl BillingModel {
    /// Get the billing model name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FlatFee => "flat_fee",
            Self::Package => "package",
            Self::Tiered => "tiered",
        }
    }
}

impl fmt::Display for BillingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tiered price attributes quantity to tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierMode {
    /// The whole quantity is priced at the single tier it falls into.
    Volume,
    /// Quantity fills each tier in turn and is priced tier by tier.
    Slab,
}

impl TierMode {
    /// Get the tier mode name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Slab => "slab",
        }
    }
}

/// Rounding applied to the package count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMode {
    /// Any partial package counts as a whole one.
    #[default]
    Up,
    /// Partial packages are not charged.
    Down,
}

/// Divide-and-round transform applied to raw usage before package pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformQuantity {
    /// Units per package.
    pub divide_by: i64,
    /// Rounding of the package count.
    #[serde(default)]
    pub round: RoundMode,
}

impl TransformQuantity {
    /// Create a transform with the given divisor and rounding.
    #[must_use]
    pub const fn new(divide_by: i64, round: RoundMode) -> Self {
        Self { divide_by, round }
    }
}

/// A single pricing tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Inclusive upper bound of the tier. `None` marks the open, catch-all tier.
    pub up_to: Option<u64>,

    /// Amount charged per unit inside the tier.
    pub unit_amount: Decimal,

    /// One-time amount charged when the tier receives any quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_amount: Option<Decimal>,
}

impl PriceTier {
    /// A tier covering quantities up to and including `up_to`.
    #[must_use]
    pub const fn up_to(up_to: u64, unit_amount: Decimal) -> Self {
        Self {
            up_to: Some(up_to),
            unit_amount,
            flat_amount: None,
        }
    }

    /// The open tier covering all quantities above the finite tiers.
    #[must_use]
    pub const fn open(unit_amount: Decimal) -> Self {
        Self {
            up_to: None,
            unit_amount,
            flat_amount: None,
        }
    }

    /// Set the one-time flat amount of the tier.
    #[must_use]
    pub const fn with_flat_amount(mut self, flat_amount: Decimal) -> Self {
        self.flat_amount = Some(flat_amount);
        self
    }

    /// Returns `true` for the open, catch-all tier.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.up_to.is_none()
    }

    /// `unit_amount * quantity + flat_amount`, or `None` on overflow.
    #[must_use]
    pub fn calculate_amount(&self, quantity: Decimal) -> Option<Decimal> {
        let cost = self.unit_amount.checked_mul(quantity)?;
        match self.flat_amount {
            Some(flat) => cost.checked_add(flat),
            None => Some(cost),
        }
    }

    fn sort_key(&self) -> (bool, u64) {
        (self.is_open(), self.up_to.unwrap_or(u64::MAX))
    }
}

/// Tiers of a price, sorted ascending by upper bound with the open tier last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierSchedule(Vec<PriceTier>);

impl TierSchedule {
    /// Build a schedule, sorting the tiers once.
    #[must_use]
    pub fn new(mut tiers: Vec<PriceTier>) -> Self {
        tiers.sort_by_key(PriceTier::sort_key);
        Self(tiers)
    }

    /// The sorted tiers.
    #[must_use]
    pub fn as_slice(&self) -> &[PriceTier] {
        &self.0
    }

    /// Iterate the tiers in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, PriceTier> {
        self.0.iter()
    }

    /// Tier at `index` in sorted order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PriceTier> {
        self.0.get(index)
    }

    /// Number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no tiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check bound ordering and amounts, returning a reason on failure.
    fn check(&self) -> std::result::Result<(), String> {
        let mut previous: Option<u64> = None;
        let mut open_tiers = 0;

        for (index, tier) in self.0.iter().enumerate() {
            if tier.unit_amount.is_sign_negative() {
                return Err(format!("tier {index} has a negative unit_amount"));
            }
            if tier.flat_amount.is_some_and(|f| f.is_sign_negative()) {
                return Err(format!("tier {index} has a negative flat_amount"));
            }

            match tier.up_to {
                Some(up_to) => {
                    if previous.is_some_and(|p| up_to <= p) {
                        return Err(format!(
                            "tier up_to values must be strictly increasing, found {up_to} after {}",
                            previous.unwrap_or_default()
                        ));
                    }
                    previous = Some(up_to);
                }
                None => open_tiers += 1,
            }
        }

        if open_tiers > 1 {
            return Err(format!("at most one open tier is allowed, found {open_tiers}"));
        }
        Ok(())
    }
}

impl From<Vec<PriceTier>> for TierSchedule {
    fn from(tiers: Vec<PriceTier>) -> Self {
        Self::new(tiers)
    }
}

impl<'de> Deserialize<'de> for TierSchedule {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<PriceTier>::deserialize(deserializer).map(Self::new)
    }
}

impl<'a> IntoIterator for &'a TierSchedule {
    type Item = &'a PriceTier;
    type IntoIter = std::slice::Iter<'a, PriceTier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Immutable description of a pricing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceConfig {
    /// Identifier of the stored price.
    #[serde(default)]
    pub id: PriceId,

    /// Shape of the pricing formula.
    pub billing_model: BillingModel,

    /// Tier attribution for tiered prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_mode: Option<TierMode>,

    /// Unit amount for flat fee and package prices.
    #[serde(default)]
    pub amount: Decimal,

    /// ISO 4217 currency code, lowercase.
    #[serde(deserialize_with = "lowercase")]
    pub currency: String,

    /// Package transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_quantity: Option<TransformQuantity>,

    /// Tiers, sorted.
    #[serde(default)]
    pub tiers: TierSchedule,
}

fn lowercase<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.to_ascii_lowercase())
}

impl PriceConfig {
    fn new(billing_model: BillingModel, currency: &str) -> Self {
        Self {
            id: PriceId::generate(),
            billing_model,
            tier_mode: None,
            amount: Decimal::ZERO,
            currency: currency.to_ascii_lowercase(),
            transform_quantity: None,
            tiers: TierSchedule::default(),
        }
    }

    /// A flat fee of `amount`.
    #[must_use]
    pub fn flat_fee(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            ..Self::new(BillingModel::FlatFee, currency)
        }
    }

    /// `amount` per package of `divide_by` units.
    #[must_use]
    pub fn package(amount: Decimal, currency: &str, divide_by: i64, round: RoundMode) -> Self {
        Self {
            amount,
            transform_quantity: Some(TransformQuantity::new(divide_by, round)),
            ..Self::new(BillingModel::Package, currency)
        }
    }

    /// A tiered price; `tiers` may be given in any order.
    #[must_use]
    pub fn tiered(tier_mode: TierMode, currency: &str, tiers: Vec<PriceTier>) -> Self {
        Self {
            tier_mode: Some(tier_mode),
            tiers: TierSchedule::new(tiers),
            ..Self::new(BillingModel::Tiered, currency)
        }
    }

    /// Set the price identifier.
    #[must_use]
    pub fn with_id(mut self, id: PriceId) -> Self {
        self.id = id;
        self
    }

    /// Validate the configuration as it would be on creation.
    ///
    /// Calculation does not require a validated price; it reports the same
    /// configuration errors when it reaches them.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        if self.amount.is_sign_negative() {
            return Err(self.invalid("amount cannot be negative"));
        }

        match self.billing_model {
            BillingModel::FlatFee => Ok(()),
            BillingModel::Package => self.divide_by().map(|_| ()),
            BillingModel::Tiered => {
                self.tier_mode()?;
                if self.tiers.is_empty() {
                    return Err(PricingError::EmptyTiers {
                        price_id: self.id.to_string(),
                    });
                }
                self.tiers.check().map_err(|reason| self.invalid(reason))
            }
        }
    }

    /// The configured tier mode.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::MissingTierMode`] when none is set.
    pub fn tier_mode(&self) -> Result<TierMode> {
        self.tier_mode.ok_or_else(|| PricingError::MissingTierMode {
            price_id: self.id.to_string(),
        })
    }

    /// The package divisor and rounding, if usable.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidDivideBy`] when the transform is missing or the
    /// divisor is not positive.
    pub fn divide_by(&self) -> Result<(Decimal, RoundMode)> {
        match self.transform_quantity {
            Some(t) if t.divide_by > 0 => Ok((Decimal::from(t.divide_by), t.round)),
            other => Err(PricingError::InvalidDivideBy {
                price_id: self.id.to_string(),
                divide_by: other.map_or(0, |t| t.divide_by),
            }),
        }
    }

    pub(crate) fn overflow(&self) -> PricingError {
        PricingError::Overflow {
            price_id: self.id.to_string(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> PricingError {
        PricingError::InvalidPrice {
            price_id: self.id.to_string(),
            billing_model: self.billing_model,
            reason: reason.into(),
        }
    }
}
