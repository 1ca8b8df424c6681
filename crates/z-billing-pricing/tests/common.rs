//! Common test utilities for pricing integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Once;

use serde_json::{json, Value};
use z_billing_pricing::{PriceConfig, PricingEngine};

static TRACING: Once = Once::new();

/// Install a test subscriber so debug events show up with `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "z_billing_pricing=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Test harness holding an engine with the built-in currency table.
pub struct TestHarness {
    /// The engine under test.
    pub engine: PricingEngine,
}

impl TestHarness {
    /// Create a new harness.
    pub fn new() -> Self {
        init_tracing();
        Self {
            engine: PricingEngine::new(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a price the way a stored configuration arrives: as JSON.
pub fn load_price(value: Value) -> PriceConfig {
    serde_json::from_value(value).expect("Failed to load price config")
}

/// The three-tier schedule used throughout: 1000 @ 0.02, 5000 @ 0.005, open @ 0.01.
pub fn standard_tiers() -> Value {
    json!([
        {"up_to": 1000, "unit_amount": "0.02"},
        {"up_to": 5000, "unit_amount": "0.005"},
        {"up_to": null, "unit_amount": "0.01"}
    ])
}

/// A tiered price in `mode` over [`standard_tiers`].
pub fn standard_tiered(mode: &str) -> PriceConfig {
    load_price(json!({
        "billing_model": "tiered",
        "tier_mode": mode,
        "currency": "usd",
        "tiers": standard_tiers()
    }))
}
