//! Property tests for filtering, aggregation, formatting and config files.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss
)]

use std::collections::BTreeSet;

use flextable::export::{export_config, import_config};
use flextable::filter::{compute_visibility, distinct_values};
use flextable::measure_grouping::MeasureGroupingModel;
use flextable::numfmt::{format_auto, format_number};
use flextable::pivot::{aggregate, group_by_category};
use flextable::types::{
    ColumnFilter, Dataset, FilterState, MeasureGroup, NumberFormat, NumberFormatType, NumberOp,
};
use flextable::value_parser::parse_number;
use proptest::prelude::*;

const REGIONS: [&str; 4] = ["East", "West", "North", "South"];

/// Rows of `(region, amount)` with integer amounts so sums are exact.
fn rows_strategy() -> impl Strategy<Value = Vec<(usize, i32)>> {
    prop::collection::vec((0..REGIONS.len(), -10_000i32..10_000), 1..40)
}

fn dataset(rows: &[(usize, i32)]) -> Dataset {
    Dataset::new(
        vec!["Region".into(), "Amount".into()],
        rows.iter()
            .map(|(r, a)| vec![REGIONS[*r].to_string(), a.to_string()])
            .collect(),
    )
    .unwrap()
}

/// Rows of `(region, fee, spread)` for a two-measure group.
fn measure_rows_strategy() -> impl Strategy<Value = Vec<(usize, i32, i32)>> {
    prop::collection::vec(
        (0..REGIONS.len(), -10_000i32..10_000, -10_000i32..10_000),
        1..40,
    )
}

fn number_filter(op: NumberOp, bound: i32) -> ColumnFilter {
    ColumnFilter::Number {
        op,
        v1: bound.to_string(),
        v2: None,
    }
}

fn op_strategy() -> impl Strategy<Value = NumberOp> {
    prop_oneof![
        Just(NumberOp::Equal),
        Just(NumberOp::NotEqual),
        Just(NumberOp::GreaterThan),
        Just(NumberOp::GreaterOrEqual),
        Just(NumberOp::LessThan),
        Just(NumberOp::LessOrEqual),
    ]
}

proptest! {
    #[test]
    fn filters_compose_as_logical_and(
        rows in rows_strategy(),
        op in op_strategy(),
        bound in -10_000i32..10_000,
        region in 0..REGIONS.len(),
    ) {
        let ds = dataset(&rows);
        let selected: BTreeSet<String> = std::iter::once(REGIONS[region].to_string()).collect();

        let mut numeric = FilterState::new();
        numeric.set_filter(1, number_filter(op, bound));
        let mut discrete = FilterState::new();
        discrete.set_filter(0, ColumnFilter::Discrete { selected: selected.clone() });
        let mut both = numeric.clone();
        both.set_filter(0, ColumnFilter::Discrete { selected });

        let a = compute_visibility(&ds, &numeric, "");
        let b = compute_visibility(&ds, &discrete, "");
        let ab = compute_visibility(&ds, &both, "");
        for i in 0..rows.len() {
            prop_assert_eq!(ab[i], a[i] && b[i]);
        }
    }

    #[test]
    fn visibility_is_idempotent(rows in rows_strategy(), bound in -10_000i32..10_000) {
        let ds = dataset(&rows);
        let mut state = FilterState::new();
        state.set_filter(1, number_filter(NumberOp::GreaterThan, bound));
        state.set_search("e");
        let first = compute_visibility(&ds, &state, state.search());
        state.set_filter(1, number_filter(NumberOp::GreaterThan, bound));
        let second = compute_visibility(&ds, &state, state.search());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn selecting_every_value_shows_every_row(rows in rows_strategy()) {
        let ds = dataset(&rows);
        let all: BTreeSet<String> = distinct_values(&ds, 0).into_iter().collect();
        let mut state = FilterState::new();
        state.set_filter(0, ColumnFilter::Discrete { selected: all });
        prop_assert!(compute_visibility(&ds, &state, "").iter().all(|v| *v));
    }

    #[test]
    fn category_sums_add_up_to_the_total(rows in rows_strategy()) {
        let ds = dataset(&rows);
        let categories = group_by_category(&ds, &[0]);
        let per_category: f64 = categories
            .iter()
            .filter_map(|g| aggregate(&ds, &g.rows)[1])
            .sum();
        let all: Vec<usize> = (0..rows.len()).collect();
        let total = aggregate(&ds, &all)[1].unwrap();
        let expected: i64 = rows.iter().map(|(_, a)| i64::from(*a)).sum();
        prop_assert_eq!(total, expected as f64);
        prop_assert_eq!(per_category, total);
        let grouped: usize = categories.iter().map(|g| g.rows.len()).sum();
        prop_assert_eq!(grouped, rows.len());
    }

    #[test]
    fn measure_group_sums_match_member_aggregates(rows in measure_rows_strategy()) {
        let ds = Dataset::new(
            vec!["Region".into(), "Fee".into(), "Spread".into()],
            rows.iter()
                .map(|(r, f, s)| vec![REGIONS[*r].to_string(), f.to_string(), s.to_string()])
                .collect(),
        )
        .unwrap();
        let group = MeasureGroup::new("Commission", vec!["Fee".into(), "Spread".into()], true);
        for category in group_by_category(&ds, &[0]) {
            let summed: f64 = category
                .rows
                .iter()
                .map(|&i| MeasureGroupingModel::group_sum(&group, &ds.rows()[i], ds.columns()))
                .sum();
            let totals = aggregate(&ds, &category.rows);
            let expected = totals[1].unwrap_or(0.0) + totals[2].unwrap_or(0.0);
            prop_assert_eq!(summed, expected);
        }
    }

    #[test]
    fn auto_format_reads_back(value in -1.0e9f64..1.0e9) {
        let text = format_auto(value);
        let back = parse_number(&text).unwrap();
        prop_assert!((back - value).abs() <= 0.0005 + value.abs() * 1e-12);
    }

    #[test]
    fn number_formatting_is_deterministic(value in -1.0e9f64..1.0e9, decimals in 0u8..6) {
        let fmt = NumberFormat {
            kind: NumberFormatType::Number,
            decimals,
            ..NumberFormat::default()
        };
        prop_assert!(parse_number(&format_number(value.abs(), &fmt).text).is_some());
        prop_assert_eq!(format_number(value, &fmt), format_number(value, &fmt));
    }

    #[test]
    fn config_survives_export_and_import(
        names in prop::collection::vec("[A-Za-z][A-Za-z ]{0,10}", 1..4),
        collapsed in any::<bool>(),
        keys in prop::collection::vec(("[A-Za-z|]{1,8}", any::<bool>()), 0..6),
    ) {
        let groups: Vec<MeasureGroup> = names
            .iter()
            .enumerate()
            .map(|(i, n)| MeasureGroup::new(n.clone(), vec![format!("m{i}a"), format!("m{i}b")], collapsed))
            .collect();
        let json = export_config(&groups, &keys, "2026-01-01T00:00:00Z").unwrap();
        let back = import_config(&json).unwrap();
        prop_assert_eq!(back.measure_groups, groups);
        prop_assert_eq!(back.pivot_state, keys);
    }
}
