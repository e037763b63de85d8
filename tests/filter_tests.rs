//! Column filters and global search over the rendered rows.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;
use std::collections::BTreeSet;

use fixtures::{
    displayed_column, loaded, measures_only, sales, visible_column, visible_count,
    visible_labels, SummaryBuilder,
};
use flextable::types::{
    ColumnFilter, FilterKind, NumberFormatOverride, NumberFormatType, NumberOp,
};
use test_case::test_case;

fn number(op: NumberOp, v1: &str, v2: Option<&str>) -> ColumnFilter {
    ColumnFilter::Number {
        op,
        v1: v1.to_string(),
        v2: v2.map(str::to_string),
    }
}

#[test_case(NumberOp::GreaterThan, "20", None => vec!["30"]; "greater than excludes the boundary")]
#[test_case(NumberOp::GreaterOrEqual, "20", None => vec!["20", "30"]; "greater or equal includes it")]
#[test_case(NumberOp::LessOrEqual, "20", None => vec!["10", "20"]; "less or equal")]
#[test_case(NumberOp::Equal, "20", None => vec!["20"]; "equal")]
#[test_case(NumberOp::NotEqual, "20", None => vec!["10", "30"]; "not equal")]
#[test_case(NumberOp::Between, "10", Some("20") => vec!["10", "20"]; "between is inclusive")]
#[test_case(NumberOp::Between, "30", Some("20") => vec!["20", "30"]; "between accepts reversed bounds")]
fn test_number_filter(op: NumberOp, v1: &str, v2: Option<&str>) -> Vec<String> {
    let mut app = loaded(measures_only());
    app.set_filter(0, number(op, v1, v2));
    visible_column(&app, 0)
}

#[test]
fn test_filters_do_not_rerender() {
    let mut app = loaded(measures_only());
    let renders = app.render_count();
    app.set_filter(0, number(NumberOp::GreaterThan, "15", None));
    app.set_search("3");
    app.clear_filters();
    assert_eq!(app.render_count(), renders);
    assert_eq!(visible_count(&app), 3);
}

#[test]
fn test_filters_and_search_combine() {
    let mut app = loaded(measures_only());
    app.set_filter(0, number(NumberOp::GreaterOrEqual, "20", None));
    assert_eq!(visible_count(&app), 2);
    app.set_search("2");
    assert_eq!(visible_column(&app, 0), vec!["20"]);
    app.set_search("");
    assert_eq!(visible_count(&app), 2);
}

#[test]
fn test_search_tokens_must_all_match() {
    let mut app = loaded(sales());
    app.toggle_category("East").unwrap();
    app.set_search("BOB 200");
    assert_eq!(visible_labels(&app), vec!["Bob"]);
    app.set_search("bob 100");
    assert_eq!(visible_count(&app), 0);
}

#[test]
fn test_text_filter_is_case_insensitive() {
    let mut app = loaded(sales());
    app.set_text_filter(0, "EA");
    assert_eq!(visible_labels(&app), vec!["East"]);
    app.set_text_filter(0, "  ");
    assert!(app.filters().get(0).is_none());
    assert_eq!(visible_count(&app), 2);
}

#[test]
fn test_filter_kinds_follow_the_rendered_columns() {
    let app = loaded(sales());
    let kinds = app.filter_kinds();
    assert!(matches!(kinds[0], FilterKind::Discrete(ref values) if values.len() == 2));
    assert_eq!(kinds[1], FilterKind::Number);
    assert_eq!(kinds[2], FilterKind::Number);
}

#[test]
fn test_discrete_selection_of_everything_is_no_filter() {
    let mut app = loaded(sales());
    let FilterKind::Discrete(values) = app.filter_kinds()[0].clone() else {
        panic!("label column should be discrete");
    };
    let first: BTreeSet<String> = values.iter().take(1).cloned().collect();
    app.set_discrete_filter(0, first);
    assert_eq!(visible_labels(&app), vec!["East"]);

    app.set_discrete_filter(0, values.into_iter().collect());
    assert!(app.filters().get(0).is_none());
    assert_eq!(visible_count(&app), 2);
}

#[test]
fn test_filters_survive_rebuilds() {
    let mut app = loaded(sales());
    app.set_filter(1, number(NumberOp::GreaterOrEqual, "200", None));
    app.toggle_category("East").unwrap();
    assert_eq!(visible_labels(&app), vec!["East", "Bob", "West"]);
    assert!(app.filters().get(1).is_some());
}

#[test]
fn test_filters_follow_moved_columns() {
    let mut app = loaded(sales());
    app.set_filter(1, number(NumberOp::GreaterThan, "250", None));
    assert!(app.move_column("Cost", 2).unwrap());
    assert_eq!(app.row_model().columns(), ["Region", "Cost", "Revenue"]);
    assert!(app.filters().get(1).is_none());
    assert!(app.filters().get(2).is_some());
    assert_eq!(visible_labels(&app), vec!["East"]);
}

#[test]
fn test_filter_on_a_blanked_column_is_dropped() {
    let mut app = loaded(measures_only());
    app.set_filter(1, number(NumberOp::LessThan, "0", None));
    assert_eq!(visible_count(&app), 1);
    app.add_measure_group("Commission", vec!["Fee".into(), "Spread".into()], true)
        .unwrap();
    assert!(app.filters().get(1).is_none());
    assert_eq!(visible_count(&app), 3);
}

#[test]
fn test_number_filter_reads_values_not_formatted_text() {
    let mut app = loaded(
        SummaryBuilder::new("Ledger")
            .columns(&["Id", "Revenue"])
            .row(&["1", "12345.6"])
            .row(&["2", "50"])
            .build(),
    );
    app.set_column_number_format(
        "Revenue",
        NumberFormatOverride {
            kind: Some(NumberFormatType::Scientific),
            decimals: Some(2),
            ..NumberFormatOverride::default()
        },
    )
    .unwrap();
    assert_eq!(displayed_column(&app, 1), vec!["1.23e+4", "5.00e+1"]);

    app.set_filter(1, number(NumberOp::GreaterOrEqual, "12345", None));
    assert_eq!(visible_count(&app), 1);
    assert_eq!(visible_column(&app, 1), vec!["12345.6"]);
}

#[test]
fn test_label_selection_survives_expanding_the_row() {
    let mut app = loaded(sales());
    assert_eq!(
        app.filter_kinds()[0],
        FilterKind::Discrete(vec!["East".to_string(), "West".to_string()])
    );
    let east: BTreeSet<String> = BTreeSet::from(["East".to_string()]);
    app.set_discrete_filter(0, east.clone());
    assert_eq!(visible_labels(&app), vec!["East"]);

    app.toggle_category("East").unwrap();
    assert_eq!(
        app.filters().get(0),
        Some(&ColumnFilter::Discrete { selected: east })
    );
    assert_eq!(visible_labels(&app), vec!["East"]);
    let label = &app.table().unwrap().body[0].cells[1].text;
    assert!(label.starts_with('\u{25bc}'));
}
