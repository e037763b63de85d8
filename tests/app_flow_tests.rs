//! End-to-end controller flows: loading, layout, derived columns and
//! formatting.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;
use fixtures::{
    displayed_column, loaded, loaded_with, measures_only, sales, visible_column, visible_labels,
};
use flextable::preferences::{MemoryPreferences, Preferences, LAYOUT_KEY};
use flextable::render::RowKind;
use flextable::source::CsvDataSource;
use flextable::types::{
    Alignment, Calculation, ConditionalRule, DerivedColumn, FormattingSettings,
    NumberFormatOverride, NumberFormatType, RuleCondition, RuleEffect,
};
use flextable::{AppController, AppState, FetchOutcome};

#[test]
fn test_load_from_csv_source() {
    let csv = b"Region,Rep,Revenue\nEast,Alice,100\nEast,Bob,200\nWest,Carl,50\n".to_vec();
    let mut source = CsvDataSource::new("Sales", csv);
    let mut app = AppController::new(MemoryPreferences::new());
    assert_eq!(app.state(), &AppState::Loading);
    assert_eq!(app.load(&mut source), FetchOutcome::Applied);
    assert_eq!(app.state(), &AppState::Ready);
    assert_eq!(app.worksheet(), Some("Sales"));
    assert_eq!(visible_labels(&app), vec!["East", "West"]);
}

#[test]
fn test_failed_first_load_renders_error_pane() {
    let mut source = CsvDataSource::new("Empty", Vec::new());
    let mut app = AppController::new(MemoryPreferences::new());
    assert_eq!(app.load(&mut source), FetchOutcome::Failed);
    assert!(matches!(app.state(), AppState::Error(_)));
    let html = app.html();
    assert!(html.contains("flextable-error"));
    assert!(html.contains(flextable::app::ERROR_HINT));
}

#[test]
fn test_layout_changes_keep_the_render() {
    let mut app = loaded(sales());
    let renders = app.render_count();

    assert_eq!(app.set_column_width("Revenue", 10), 50);
    assert_eq!(app.set_column_width("Revenue", 140), 140);
    app.set_alignment("Revenue", Alignment::Center);
    app.set_row_numbers(true);
    assert_eq!(app.render_count(), renders);

    let table = app.table().unwrap();
    let slot = table.slot_index("Revenue").unwrap();
    assert_eq!(table.header[1].cells[slot].style.get("width"), Some("140px"));
    assert_eq!(
        table.body[0].cells[slot].style.get("text-align"),
        Some("center")
    );
    assert!(app.preferences().get(LAYOUT_KEY).unwrap().contains("140"));
}

#[test]
fn test_row_numbers_count_visible_rows() {
    let mut app = loaded(sales());
    app.set_row_numbers(true);
    let numbers = |app: &fixtures::TestApp| -> Vec<String> {
        app.table()
            .unwrap()
            .body
            .iter()
            .map(|r| r.cells[0].text.clone())
            .collect()
    };
    assert_eq!(numbers(&app), vec!["1", "2"]);
    assert_eq!(app.table().unwrap().header[1].cells[0].text, "#");

    app.set_search("west");
    assert_eq!(numbers(&app), vec!["", "1"]);

    app.set_row_numbers(false);
    assert!(app.table().unwrap().slots[0].hidden);
}

#[test]
fn test_hidden_measure_keeps_its_slot() {
    let mut app = loaded(sales());
    app.set_column_hidden("Cost", true).unwrap();
    let table = app.table().unwrap();
    let slot = table.slot_index("Cost").unwrap();
    assert!(table.slots[slot].hidden);
    assert!(table.body.iter().all(|r| r.cells[slot].hidden));
    assert_eq!(app.row_model().column_count(), 3);

    app.show_all_columns().unwrap();
    assert!(!app.table().unwrap().slots[slot].hidden);
}

#[test]
fn test_hidden_dimension_aggregates_rows() {
    let mut app = loaded(sales());
    app.set_column_hidden("Rep", true).unwrap();
    assert_eq!(app.view().columns(), ["Region", "Revenue", "Cost"]);
    assert_eq!(app.hierarchy(), &[0]);
    assert_eq!(visible_labels(&app), vec!["East", "West"]);
    assert_eq!(visible_column(&app, 1), vec!["300", "200"]);
    let table = app.table().unwrap();
    assert!(table.body.iter().all(|r| r.pivot_key.is_none()));
    assert!(table.body.iter().all(|r| r.kind == RowKind::Category));
}

#[test]
fn test_reset_layout_forgets_order_and_widths() {
    let mut app = loaded(sales());
    app.move_column("Cost", 2).unwrap();
    app.set_column_width("Cost", 90);
    app.set_column_hidden("Cost", true).unwrap();
    app.reset_layout().unwrap();
    assert_eq!(app.view().columns(), ["Region", "Rep", "Revenue", "Cost"]);
    assert!(app.controllers().resize.widths().is_empty());
    // Visibility is not part of the layout reset
    assert!(app.controllers().columns.is_hidden("Cost"));
}

#[test]
fn test_derived_column_is_summed_and_persisted() {
    let mut app = loaded(sales());
    let margin = DerivedColumn {
        name: "Margin".into(),
        calculation: Calculation::GrossMargin,
        inputs: vec!["Revenue".into(), "Cost".into()],
    };
    app.add_derived_column(margin.clone()).unwrap();
    assert_eq!(app.row_model().columns().last().unwrap(), "Margin");
    assert_eq!(visible_column(&app, 3), vec!["170", "120"]);
    assert!(app.add_derived_column(margin.clone()).is_err());

    let again = loaded_with(app.preferences().clone(), sales());
    assert_eq!(again.derived_columns(), std::slice::from_ref(&margin));

    assert!(app.remove_derived_column("Margin").unwrap());
    assert!(!app.remove_derived_column("Margin").unwrap());
    assert_eq!(app.row_model().column_count(), 3);
}

#[test]
fn test_column_number_format() {
    let mut app = loaded(sales());
    app.set_column_number_format(
        "Revenue",
        NumberFormatOverride {
            kind: Some(NumberFormatType::Currency),
            decimals: Some(0),
            ..NumberFormatOverride::default()
        },
    )
    .unwrap();
    app.toggle_category("East").unwrap();
    assert_eq!(displayed_column(&app, 1), vec!["$300", "$100", "$200", "$200"]);
    // Other columns keep auto formatting
    assert_eq!(displayed_column(&app, 2), vec!["130", "40", "90", "80"]);
    // Filtering still sees the plain values
    assert_eq!(visible_column(&app, 1), vec!["300", "100", "200", "200"]);

    app.remove_column_formatting("Revenue").unwrap();
    assert_eq!(displayed_column(&app, 1), vec!["300", "100", "200", "200"]);
}

#[test]
fn test_negative_numbers_in_parentheses() {
    let mut app = loaded(measures_only());
    app.set_column_number_format(
        "Spread",
        NumberFormatOverride {
            kind: Some(NumberFormatType::Number),
            ..NumberFormatOverride::default()
        },
    )
    .unwrap();
    assert_eq!(displayed_column(&app, 1), vec!["5.00", "(5.00)", "15.00"]);
}

#[test]
fn test_conditional_rule_colours_detail_cells() {
    let mut app = loaded(measures_only());
    let mut settings = FormattingSettings::default();
    settings.conditional_formatting.enabled = true;
    app.set_formatting(settings).unwrap();
    app.add_conditional_rule(ConditionalRule {
        column_index: Some(0),
        condition: RuleCondition::GreaterThan,
        value: 15.0,
        max_value: None,
        effect: RuleEffect::BackgroundColor,
        color: "#ffcdd2".into(),
        icon: None,
    })
    .unwrap();

    let table = app.table().unwrap();
    let backgrounds: Vec<Option<&str>> = table
        .body
        .iter()
        .map(|r| r.cells[1].style.get("background-color"))
        .collect();
    assert_eq!(backgrounds[0], Some("#fafafa"));
    assert_eq!(backgrounds[1], Some("#ffcdd2"));
    assert_eq!(backgrounds[2], Some("#ffcdd2"));
    // Other columns are untouched
    assert_ne!(table.body[1].cells[2].style.get("background-color"), Some("#ffcdd2"));

    app.reset_formatting().unwrap();
    assert_eq!(app.formatter().settings().conditional_formatting.rules.len(), 1);
}
