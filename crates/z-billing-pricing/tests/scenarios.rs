//! End-to-end pricing scenarios over JSON-loaded prices.

mod common;

use common::{load_price, standard_tiered, TestHarness};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use z_billing_pricing::{PricingError, WindowSize, WindowUsage};

// ============================================================================
// Single quantities
// ============================================================================

#[test]
fn slab_scenario() {
    let harness = TestHarness::new();
    let price = standard_tiered("slab");

    let cost = harness.engine.calculate_cost(&price, dec!(1500)).unwrap();
    assert_eq!(cost, dec!(22.5));
}

#[test]
fn package_scenario() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "package",
        "amount": "10",
        "currency": "usd",
        "transform_quantity": {"divide_by": 100, "round": "up"}
    }));

    let cost = harness.engine.calculate_cost(&price, dec!(150)).unwrap();
    assert_eq!(cost, dec!(20));
}

#[test]
fn package_without_round_mode_rounds_up() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "package",
        "amount": "10",
        "currency": "usd",
        "transform_quantity": {"divide_by": 100}
    }));

    let cost = harness.engine.calculate_cost(&price, dec!(101)).unwrap();
    assert_eq!(cost, dec!(20));
}

#[test]
fn flat_fee_scenario() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "flat_fee",
        "amount": "5",
        "currency": "usd"
    }));

    for quantity in [Decimal::ZERO, dec!(1000000)] {
        let cost = harness.engine.calculate_cost(&price, quantity).unwrap();
        assert_eq!(cost, dec!(5));
    }
}

#[test]
fn volume_scenario() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "tiered",
        "tier_mode": "volume",
        "currency": "usd",
        "tiers": [
            {"up_to": null, "unit_amount": "0.01"},
            {"up_to": 1000, "unit_amount": "0.02"}
        ]
    }));

    let at_bound = harness
        .engine
        .calculate_cost_with_breakup(&price, dec!(1000), true)
        .unwrap();
    assert_eq!(at_bound.selected_tier_index, Some(0));
    assert_eq!(at_bound.final_cost, dec!(20));

    let above = harness
        .engine
        .calculate_cost_with_breakup(&price, dec!(1001), true)
        .unwrap();
    assert_eq!(above.selected_tier_index, Some(1));
    assert_eq!(above.final_cost, dec!(10.01));
}

#[test]
fn rounded_costs_have_at_most_two_decimals_in_usd() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "tiered",
        "tier_mode": "slab",
        "currency": "USD",
        "tiers": [
            {"up_to": 7, "unit_amount": "0.123456"},
            {"up_to": null, "unit_amount": "0.000789", "flat_amount": "0.3333"}
        ]
    }));

    for quantity in [dec!(1), dec!(7), dec!(8.5), dec!(12345.678)] {
        let breakup = harness
            .engine
            .calculate_cost_with_breakup(&price, quantity, true)
            .unwrap();
        assert!(breakup.final_cost.scale() <= 2, "{}", breakup.final_cost);
    }
}

#[test]
fn zero_decimal_currency_rounds_to_whole_units() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "tiered",
        "tier_mode": "volume",
        "currency": "jpy",
        "tiers": [{"up_to": null, "unit_amount": "0.7"}]
    }));

    let cost = harness.engine.calculate_cost_rounded(&price, dec!(5)).unwrap();
    assert_eq!(cost, dec!(4));
}

// ============================================================================
// Bucketed usage
// ============================================================================

#[test]
fn bucketed_and_combined_costs_are_distinct() {
    let harness = TestHarness::new();
    let price = standard_tiered("slab");

    let bucketed = harness
        .engine
        .calculate_bucketed_cost(&price, &[dec!(1200), dec!(1200)])
        .unwrap();
    let combined = harness
        .engine
        .calculate_cost_rounded(&price, dec!(2400))
        .unwrap();

    assert_eq!(bucketed, dec!(42));
    assert_eq!(combined, dec!(27));
    assert_ne!(bucketed, combined);
}

#[test]
fn filled_windows_feed_bucketed_pricing() {
    use chrono::{TimeZone, Utc};

    let harness = TestHarness::new();
    let price = standard_tiered("volume");

    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();
    let results = [WindowUsage {
        window_start: Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap(),
        value: dec!(2000),
    }];

    let buckets = z_billing_pricing::fill_bucketed_usage(start, end, WindowSize::Hour, &results);
    assert_eq!(buckets, vec![dec!(0), dec!(2000), dec!(0)]);

    let cost = harness
        .engine
        .calculate_bucketed_cost(&price, &buckets)
        .unwrap();
    assert_eq!(cost, dec!(10));
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn stored_tiered_price_without_tiers_fails_loudly() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "tiered",
        "tier_mode": "volume",
        "currency": "usd"
    }));

    let err = harness.engine.calculate_cost(&price, dec!(10)).unwrap_err();
    assert!(matches!(err, PricingError::EmptyTiers { .. }));
    assert!(price.validate().is_err());

    let fallback = harness
        .engine
        .calculate_cost_or_zero(&price, dec!(10))
        .unwrap();
    assert_eq!(fallback, Decimal::ZERO);
}

#[test]
fn stored_tiered_price_without_mode_fails_loudly() {
    let harness = TestHarness::new();
    let price = load_price(json!({
        "billing_model": "tiered",
        "currency": "usd",
        "tiers": [{"up_to": null, "unit_amount": "1"}]
    }));

    assert!(matches!(
        harness.engine.calculate_cost(&price, dec!(10)),
        Err(PricingError::MissingTierMode { .. })
    ));
    assert!(matches!(
        harness
            .engine
            .calculate_cost_with_breakup(&price, dec!(10), true),
        Err(PricingError::MissingTierMode { .. })
    ));
}

#[test]
fn unknown_tier_mode_is_rejected_on_load() {
    let result = serde_json::from_value::<z_billing_pricing::PriceConfig>(json!({
        "billing_model": "tiered",
        "tier_mode": "graduated",
        "currency": "usd",
        "tiers": []
    }));
    assert!(result.is_err());
}

#[test]
fn price_id_round_trips_through_config() {
    let id = z_billing_pricing::PriceId::generate();
    let price = load_price(json!({
        "id": id.to_string(),
        "billing_model": "flat_fee",
        "amount": "1",
        "currency": "usd"
    }));
    assert_eq!(price.id, id);
}

// ============================================================================
// Shared configuration
// ============================================================================

#[test]
fn shared_price_prices_identically_across_threads() {
    let harness = TestHarness::new();
    let price = standard_tiered("slab");
    let expected = harness
        .engine
        .calculate_cost_with_breakup(&price, dec!(6543.21), true)
        .unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    harness
                        .engine
                        .calculate_cost_with_breakup(&price, dec!(6543.21), true)
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
