//! CSV and configuration export through the controller.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;
use fixtures::{loaded, sales, SummaryBuilder};
use flextable::types::{ColumnFilter, ExportedConfig, NumberOp, CONFIG_VERSION};
use flextable::FlexTableError;

const EXPORTED_AT: &str = "2026-03-01T09:30:00+00:00";

#[test]
fn test_visible_csv_matches_the_screen() {
    let mut app = loaded(sales());
    app.toggle_category("East").unwrap();
    app.set_filter(
        1,
        ColumnFilter::Number {
            op: NumberOp::GreaterThan,
            v1: "150".into(),
            v2: None,
        },
    );
    let csv = app.export_visible_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], r#""Region","Revenue","Cost""#);
    assert_eq!(lines[1], "\"\u{25bc} East\",\"300\",\"130\"");
    assert_eq!(lines[2], r#""Bob","200","90""#);
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_visible_csv_omits_hidden_columns_and_row_numbers() {
    let mut app = loaded(sales());
    app.set_column_hidden("Cost", true).unwrap();
    let csv = app.export_visible_csv().unwrap();
    assert_eq!(csv.lines().next(), Some(r#""Region","Revenue""#));

    app.set_row_numbers(true);
    let csv = app.export_visible_csv().unwrap();
    assert_eq!(csv.lines().next(), Some(r##""#","Region","Revenue""##));
}

#[test]
fn test_raw_csv_is_the_source() {
    let data = SummaryBuilder::new("Quotes")
        .columns(&["Name", "Note"])
        .row(&["Ann", "said \"hi\", left"])
        .build();
    let app = loaded(data);
    assert_eq!(
        app.export_raw_csv().unwrap(),
        "\"Name\",\"Note\"\n\"Ann\",\"said \"\"hi\"\", left\""
    );
}

#[test]
fn test_no_export_before_data() {
    let app = flextable::AppController::new(flextable::preferences::MemoryPreferences::new());
    assert!(app.export_visible_csv().is_none());
    assert!(app.export_raw_csv().is_none());
}

#[test]
fn test_config_round_trip_between_instances() {
    let mut source = loaded(sales());
    source
        .add_measure_group("Money", vec!["Revenue".into(), "Cost".into()], false)
        .unwrap();
    source.toggle_category("West").unwrap();
    let json = source.export_config(EXPORTED_AT).unwrap();

    let parsed: ExportedConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.version, CONFIG_VERSION);
    assert_eq!(parsed.export_date, EXPORTED_AT);
    assert!(json.contains("\"measureGroups\""));
    assert!(json.contains("\"pivotState\""));

    let mut target = loaded(sales());
    target.import_config(&json).unwrap();
    assert_eq!(
        target.measure_groups().groups(),
        source.measure_groups().groups()
    );
    assert!(!target.pivot().is_category_collapsed("West"));
    assert!(target.pivot().is_category_collapsed("East"));
}

#[test]
fn test_bad_config_leaves_state_alone() {
    let mut app = loaded(sales());
    app.add_measure_group("Money", vec!["Revenue".into(), "Cost".into()], false)
        .unwrap();
    let json = app.export_config(EXPORTED_AT).unwrap();
    let future = json.replace(CONFIG_VERSION, "3.1");

    assert!(matches!(
        app.import_config(&future),
        Err(FlexTableError::Config(_))
    ));
    assert!(app.import_config("not json").is_err());
    assert_eq!(app.measure_groups().groups().len(), 1);
}
