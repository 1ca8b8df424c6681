//! Property tests for tier resolution.

mod common;

use common::standard_tiered;
use proptest::prelude::*;
use rust_decimal::Decimal;
use z_billing_pricing::{
    calculate_cost, cost_breakup, PriceConfig, PriceTier, TierMode, TierResolver,
};

fn quantity() -> impl Strategy<Value = Decimal> {
    // Up to 20_000.00 in hundredths
    (0u64..2_000_000).prop_map(|cents| Decimal::new(i64::try_from(cents).unwrap(), 2))
}

fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..1000).prop_map(|mills| Decimal::new(mills, 3))
}

fn flat_amount() -> impl Strategy<Value = Option<Decimal>> {
    prop::option::of((0i64..50_000).prop_map(|cents| Decimal::new(cents, 2)))
}

/// Slab schedules of up to four bounded tiers and an open tier, some with flat amounts.
fn slab_with_flat_amounts() -> impl Strategy<Value = PriceConfig> {
    (
        prop::collection::vec((1u64..5000, rate(), flat_amount()), 0..4),
        rate(),
        flat_amount(),
    )
        .prop_map(|(bounded, open_rate, open_flat)| {
            let mut bound = 0;
            let mut tiers: Vec<PriceTier> = bounded
                .into_iter()
                .map(|(width, unit, flat)| {
                    bound += width;
                    with_optional_flat(PriceTier::up_to(bound, unit), flat)
                })
                .collect();
            tiers.push(with_optional_flat(PriceTier::open(open_rate), open_flat));
            PriceConfig::tiered(TierMode::Slab, "usd", tiers)
        })
}

fn with_optional_flat(tier: PriceTier, flat: Option<Decimal>) -> PriceTier {
    match flat {
        Some(amount) => tier.with_flat_amount(amount),
        None => tier,
    }
}

proptest! {
    #[test]
    fn volume_cost_is_linear_within_a_tier(a in quantity(), b in quantity()) {
        let price = standard_tiered("volume");
        let resolver = TierResolver::new(&price).unwrap();

        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_tier = resolver.volume_tier_index(low);
        prop_assume!(low_tier == resolver.volume_tier_index(high));

        let rate = price.tiers.get(low_tier).unwrap().unit_amount;
        let low_cost = calculate_cost(&price, low).unwrap();
        let high_cost = calculate_cost(&price, high).unwrap();
        prop_assert!(low_cost <= high_cost);
        prop_assert_eq!(high_cost - low_cost, (high - low) * rate);
    }

    #[test]
    fn slab_allocations_partition_the_quantity(q in quantity()) {
        let price = standard_tiered("slab");
        let resolution = TierResolver::new(&price).unwrap().resolve(q).unwrap();

        prop_assert_eq!(resolution.allocated_quantity(), q);
        prop_assert_eq!(resolution.unallocated, Decimal::ZERO);

        let expected: Decimal = resolution
            .allocations
            .iter()
            .map(|a| {
                let tier = price.tiers.get(a.tier_index).unwrap();
                tier.unit_amount * a.quantity + tier.flat_amount.unwrap_or_default()
            })
            .sum();
        prop_assert_eq!(resolution.total, expected);
    }

    #[test]
    fn slab_flat_amounts_are_charged_once_per_consumed_tier(
        price in slab_with_flat_amounts(),
        q in quantity(),
    ) {
        let resolution = TierResolver::new(&price).unwrap().resolve(q).unwrap();

        prop_assert_eq!(resolution.allocated_quantity(), q);
        prop_assert!(resolution.allocations.iter().all(|a| a.quantity > Decimal::ZERO));

        let units: Decimal = resolution
            .allocations
            .iter()
            .map(|a| price.tiers.get(a.tier_index).unwrap().unit_amount * a.quantity)
            .sum();
        let flats: Decimal = resolution
            .allocations
            .iter()
            .filter_map(|a| price.tiers.get(a.tier_index).unwrap().flat_amount)
            .sum();
        prop_assert_eq!(resolution.total, units + flats);
        prop_assert_eq!(calculate_cost(&price, q).unwrap(), units + flats);
    }

    #[test]
    fn slab_cost_is_monotonic(a in quantity(), b in quantity()) {
        let price = standard_tiered("slab");
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calculate_cost(&price, low).unwrap() <= calculate_cost(&price, high).unwrap());
    }

    #[test]
    fn repeated_calculations_are_identical(q in quantity()) {
        let price = standard_tiered("slab");
        let first = cost_breakup(&price, q).unwrap();
        for _ in 0..3 {
            prop_assert_eq!(&cost_breakup(&price, q).unwrap(), &first);
        }
        prop_assert_eq!(&price.tiers, &standard_tiered("slab").tiers);
    }
}
