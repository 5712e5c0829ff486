//! Property-based tests for normalizer invariants: aligned series, finite
//! ratios, and stable top-N selection.

use proptest::prelude::*;

use super::pipeline::{Aggregation, MetricSpec, Pipeline};
use super::rules::{self, AggFunc, DisplayUnit};
use crate::core::table::{RawTable, Value};

// ──────────────────── strategies ────────────────────

fn arb_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        (-1_000_000_i64..10_000_000).prop_map(Value::Int),
        (-1e7_f64..1e8).prop_map(Value::Float),
    ]
}

fn arb_category() -> impl Strategy<Value = Value> {
    prop_oneof![
        (2019_i64..2026).prop_map(Value::Int),
        prop::sample::select(vec!["Audio", "Laptops", "Smartphones", "Wearables"])
            .prop_map(Value::from),
    ]
}

fn arb_table() -> impl Strategy<Value = RawTable> {
    prop::collection::vec((arb_category(), arb_category(), arb_cell(), arb_cell()), 0..40)
        .prop_map(|rows| {
            RawTable::from_rows(
                &["period", "segment", "amount", "total"],
                rows.into_iter()
                    .map(|(p, s, a, t)| vec![p, s, a, t])
                    .collect(),
            )
            .expect("rows match the column count")
        })
}

fn pipelines() -> Vec<Pipeline> {
    vec![
        Pipeline::columns(
            "period",
            &[
                ("amount_cr", "amount_cr"),
                ("ratio", "ratio"),
                ("growth", "growth"),
            ],
        )
        .scale("amount", DisplayUnit::Crores, "amount_cr")
        .ratio("amount", "total", "ratio")
        .growth("amount", "growth"),
        Pipeline::pivot("period", "segment", "amount"),
        Pipeline::columns("segment", &[("revenue", "revenue"), ("share", "share")])
            .group_by(
                &["segment"],
                vec![Aggregation::new("amount", AggFunc::Sum, "revenue")],
            )
            .share("revenue", "share")
            .top("revenue", 3),
        Pipeline::columns("period", &[("rolling", "rolling")])
            .rolling("amount", 7, "rolling")
            .metric(MetricSpec::aggregate("Mean", "amount", AggFunc::Mean)),
        Pipeline::columns("amount", &[("orders", "orders")]).value_counts("amount", "orders"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every series of every shape is exactly as long as the index.
    #[test]
    fn series_align_with_index(table in arb_table()) {
        for pipeline in pipelines() {
            let result = pipeline.apply("prop", &table).expect("pipeline applies");
            for series in result.series() {
                prop_assert_eq!(series.values.len(), result.index().len());
                prop_assert!(series.values.iter().all(|v| v.is_finite()));
            }
        }
    }

    /// Ratios never produce NaN or infinity, whatever the denominator.
    #[test]
    fn ratios_are_always_finite(part in any::<f64>(), total in any::<f64>()) {
        prop_assert!(rules::derived_ratio(part, total).is_finite());
        prop_assert!(rules::safe_quotient(part, total, 2).is_finite());
    }

    /// Top-N returns min(n, len) rows and nothing outside it outranks a kept row.
    #[test]
    fn top_n_keeps_the_highest(keys in prop::collection::vec(-1e6_f64..1e6, 0..80), n in 0_usize..60) {
        let kept = rules::top_n_indices(&keys, n, true);
        prop_assert_eq!(kept.len(), n.min(keys.len()));
        if let Some(&floor) = kept.last().map(|&i| &keys[i]) {
            for (i, key) in keys.iter().enumerate() {
                if !kept.contains(&i) {
                    prop_assert!(*key <= floor);
                }
            }
        }
    }

    /// Buckets are integral multiples of the granularity.
    #[test]
    fn buckets_land_on_the_grid(value in -1e4_f64..1e4) {
        let b = rules::bucket_discount(value);
        prop_assert_eq!(b.fract(), 0.0);
        prop_assert!((b - value).abs() <= 0.5);
    }
}
