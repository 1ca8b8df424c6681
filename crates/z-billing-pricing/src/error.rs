//! Error types for the pricing engine.

use rust_decimal::Decimal;

use crate::ids::IdError;
use crate::price::BillingModel;

/// Result type for pricing operations.
pub type Result<T> = std::result::Result<T, PricingError>;

/// Errors that can occur while validating a price or calculating a cost.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// A tiered price has no tiers to resolve against.
    #[error("no tiers configured for tiered price {price_id}")]
    EmptyTiers {
        /// The offending price.
        price_id: String,
    },

    /// A tiered price has no tier mode.
    #[error("tier mode is required for tiered price {price_id}")]
    MissingTierMode {
        /// The offending price.
        price_id: String,
    },

    /// A package price has no usable quantity transform.
    #[error("invalid package divisor for price {price_id}: divide_by={divide_by}")]
    InvalidDivideBy {
        /// The offending price.
        price_id: String,
        /// The configured divisor (0 when no transform is configured).
        divide_by: i64,
    },

    /// A price field failed load-time validation.
    #[error("invalid {billing_model} price {price_id}: {reason}")]
    InvalidPrice {
        /// The offending price.
        price_id: String,
        /// Billing model of the price.
        billing_model: BillingModel,
        /// What is wrong with it.
        reason: String,
    },

    /// Quantity passed by the caller was negative.
    #[error("quantity must be non-negative, got {quantity}")]
    NegativeQuantity {
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// Decimal arithmetic overflowed the representable range.
    #[error("arithmetic overflow while pricing {price_id}")]
    Overflow {
        /// The price being calculated.
        price_id: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl PricingError {
    /// Returns `true` when the error is caused by a malformed price rather than by the
    /// caller's input.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyTiers { .. }
                | Self::MissingTierMode { .. }
                | Self::InvalidDivideBy { .. }
                | Self::InvalidPrice { .. }
        )
    }
}

/// Reject negative quantities. Negative zero is accepted as zero.
pub(crate) fn ensure_non_negative(quantity: Decimal) -> Result<()> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(PricingError::NegativeQuantity { quantity });
    }
    Ok(())
}
