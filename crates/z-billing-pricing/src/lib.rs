//! Usage-to-cost calculation engine for z-billing.
//!
//! This crate turns metered usage into money, given a price configuration:
//!
//! - **Prices**: `PriceConfig`, `PriceTier`, `TierSchedule`, `BillingModel`, `TierMode`
//! - **Tiers**: `TierResolver` for volume and slab attribution
//! - **Costs**: `calculate_cost`, `bucketed_cost`, `cost_breakup`, and the
//!   `PricingEngine` that rounds their results
//! - **Currencies**: `CurrencyTable` precision lookup and amount formatting
//! - **Windows**: filling sparse per-window usage for bucketed pricing
//!
//! # Precision
//!
//! All arithmetic uses `rust_decimal::Decimal`. Costs stay unrounded until the final
//! step, and every final rounding goes through `round_to_currency`, so summing many
//! costs never compounds rounding error.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use z_billing_pricing::{PriceConfig, PriceTier, PricingEngine, TierMode};
//!
//! let price = PriceConfig::tiered(
//!     TierMode::Slab,
//!     "usd",
//!     vec![
//!         PriceTier::up_to(1000, Decimal::new(2, 2)),
//!         PriceTier::up_to(5000, Decimal::new(5, 3)),
//!         PriceTier::open(Decimal::new(1, 2)),
//!     ],
//! );
//!
//! let engine = PricingEngine::new();
//! let cost = engine.calculate_cost_rounded(&price, Decimal::from(1500)).unwrap();
//! assert_eq!(cost, Decimal::new(2250, 2));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod breakup;
pub mod buckets;
pub mod calculator;
pub mod currency;
pub mod engine;
pub mod error;
pub mod ids;
pub mod price;
pub mod tiers;
pub mod windows;

pub use breakup::{cost_breakup, CostBreakup};
pub use buckets::bucketed_cost;
pub use calculator::{calculate_cost, package_count};
pub use currency::{
    round_to_currency, CurrencyConfig, CurrencyPrecision, CurrencyTable,
    CURRENCY_PRECISION_ENV, DEFAULT_CURRENCY_PRECISION,
};
pub use engine::PricingEngine;
pub use error::{PricingError, Result};
pub use ids::{IdError, PriceId};
pub use price::{
    BillingModel, PriceConfig, PriceTier, RoundMode, TierMode, TierSchedule, TransformQuantity,
};
pub use tiers::{TierAllocation, TierResolution, TierResolver};
pub use windows::{expected_window_starts, fill_bucketed_usage, WindowSize, WindowUsage};
