//! Property-based tests for aggregation invariants.
//!
//! These tests verify properties that should always hold:
//! - Percentages of each fund sum to 1.0
//! - Duplicating every row leaves every percentage unchanged
//! - Absent social names never reach the grouping stage
//! - Every (fund, asset type) pair of the input appears exactly once

use std::collections::BTreeSet;

use fundos_core::aggregation::{fund_totals, join_fund_totals, normalize_social_names};
use fundos_core::prelude::*;
use proptest::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

const FUNDS: [&str; 4] = [
    "00.017.024/0001-53",
    "00.068.305/0001-35",
    "00.071.477/0001-68",
    "00.073.041/0001-08",
];

const ASSET_TYPES: [&str; 5] = [
    "Titulos Publicos",
    "Acoes",
    "Cotas de Fundos",
    "Debentures",
    "Operacoes Compromissadas",
];

/// Generates N holdings with strictly positive market values.
fn generate_holdings(n: usize, seed: u64) -> Vec<HoldingRecord> {
    (0..n)
        .map(|i| {
            let hash = simple_hash(seed, i as u64);
            let fund = FUNDS[hash as usize % FUNDS.len()];
            let asset = ASSET_TYPES[(hash >> 8) as usize % ASSET_TYPES.len()];
            let cents = 1 + (hash % 10_000_000_000) as i64;

            let record = HoldingRecord::new(fund, asset, Decimal::new(cents, 2));
            if hash % 3 == 0 {
                record
            } else {
                record.with_social_name(format!("FUNDO {}", hash % 97))
            }
        })
        .collect()
}

/// Simple deterministic hash for test data generation.
fn simple_hash(seed: u64, i: u64) -> u64 {
    let mut x = seed.wrapping_add(i).wrapping_mul(0x517cc1b727220a95);
    x ^= x >> 32;
    x = x.wrapping_mul(0x517cc1b727220a95);
    x ^= x >> 32;
    x
}

// =============================================================================
// PROPERTY: PERCENTAGES OF A FUND SUM TO 1
// =============================================================================

#[test]
fn property_fund_percentages_sum_to_one() {
    let config = TransformConfig::canonical();

    for seed in 0..10 {
        for size in [1, 5, 25, 100, 500] {
            let rows = generate_holdings(size, seed);
            let output = aggregate(&rows, &config).unwrap();

            for (fund, total) in conservation_report(&output) {
                assert!(
                    (total - 1.0).abs() < 1e-9,
                    "Fund {} percentages should sum to 1, got {} for size={}, seed={}",
                    fund,
                    total,
                    size,
                    seed
                );
            }
        }
    }
}

// =============================================================================
// PROPERTY: DUPLICATING ROWS LEAVES RATIOS UNCHANGED
// =============================================================================

#[test]
fn property_duplicated_rows_keep_percentages() {
    let config = TransformConfig::canonical();

    for seed in 0..10 {
        let rows = generate_holdings(50, seed);
        let doubled: Vec<HoldingRecord> = rows.iter().chain(rows.iter()).cloned().collect();

        let once = aggregate(&rows, &config).unwrap();
        let twice = aggregate(&doubled, &config).unwrap();

        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.fund_id, b.fund_id);
            assert_eq!(a.asset_type, b.asset_type);
            assert!(
                (a.percentage_of_fund - b.percentage_of_fund).abs() < 1e-12,
                "Ratio for ({}, {:?}) changed from {} to {} for seed={}",
                a.fund_id,
                a.asset_type,
                a.percentage_of_fund,
                b.percentage_of_fund,
                seed
            );
        }
    }
}

#[test]
fn property_duplicated_rows_double_fund_totals() {
    // The numerator and the denominator both double; only the ratio is stable.
    let rows = generate_holdings(40, 7);
    let doubled: Vec<HoldingRecord> = rows.iter().chain(rows.iter()).cloned().collect();

    let normalized_once = normalize_social_names(&rows);
    let normalized_twice = normalize_social_names(&doubled);
    let once = fund_totals(&normalized_once).unwrap();
    let twice = fund_totals(&normalized_twice).unwrap();

    for (fund, total) in &once {
        assert_eq!(twice[fund], *total * Decimal::TWO);
    }
}

// =============================================================================
// PROPERTY: NULL SOCIAL NAMES ARE NORMALIZED
// =============================================================================

#[test]
fn property_no_null_social_name_downstream() {
    let config = TransformConfig::canonical();

    for seed in 0..5 {
        let rows = generate_holdings(60, seed);
        assert!(rows.iter().any(|r| r.social_name.is_none()));

        let normalized = normalize_social_names(&rows);
        let totals = fund_totals(&normalized).unwrap();
        let joined = join_fund_totals(&normalized, &totals, &config).unwrap();

        for (holding, record) in joined.iter().zip(&rows) {
            match &record.social_name {
                Some(name) => assert_eq!(holding.social_name, name.as_str()),
                None => assert_eq!(holding.social_name, MISSING_SOCIAL_NAME),
            }
        }
    }
}

// =============================================================================
// PROPERTY: GROUPS COVER THE INPUT KEYS EXACTLY ONCE
// =============================================================================

#[test]
fn property_one_row_per_input_key() {
    let config = TransformConfig::canonical();

    for seed in 0..10 {
        let rows = generate_holdings(200, seed);
        let expected: BTreeSet<(String, String)> = rows
            .iter()
            .map(|r| (r.fund_id.clone().unwrap(), r.asset_type.clone().unwrap()))
            .collect();

        let output = aggregate(&rows, &config).unwrap();
        let actual: Vec<(String, String)> = output
            .iter()
            .map(|r| (r.fund_id.clone(), r.asset_type.clone().unwrap()))
            .collect();

        // Sorted and without duplicates
        assert_eq!(actual, expected.into_iter().collect::<Vec<_>>());
    }
}

// =============================================================================
// RANDOMIZED INPUTS
// =============================================================================

fn holding_strategy() -> impl Strategy<Value = HoldingRecord> {
    (0..FUNDS.len(), 0..ASSET_TYPES.len(), 1i64..1_000_000_000_000i64).prop_map(
        |(fund, asset, cents)| {
            HoldingRecord::new(FUNDS[fund], ASSET_TYPES[asset], Decimal::new(cents, 2))
        },
    )
}

proptest! {
    #[test]
    fn proptest_conservation(rows in prop::collection::vec(holding_strategy(), 0..200)) {
        let output = aggregate(&rows, &TransformConfig::cvm_default()).unwrap();

        let funds: BTreeSet<&str> = rows.iter().filter_map(|r| r.fund_id.as_deref()).collect();
        let report = conservation_report(&output);
        prop_assert_eq!(report.len(), funds.len());

        for total in report.values() {
            prop_assert!((total - 1.0).abs() < 1e-9);
        }
        for r in &output {
            prop_assert!(r.percentage_of_fund > 0.0 && r.percentage_of_fund <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn proptest_order_does_not_change_output(
        rows in prop::collection::vec(holding_strategy(), 1..100),
        rotate in 0usize..100,
    ) {
        let mut rotated = rows.clone();
        let k = rotate % rotated.len();
        rotated.rotate_left(k);

        let config = TransformConfig::canonical();
        let a = aggregate(&rows, &config).unwrap();
        let b = aggregate(&rotated, &config).unwrap();

        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            prop_assert_eq!(&x.fund_id, &y.fund_id);
            prop_assert_eq!(&x.asset_type, &y.asset_type);
            prop_assert!((x.percentage_of_fund - y.percentage_of_fund).abs() < 1e-12);
        }
    }
}
