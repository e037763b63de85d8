//! Test fixtures for building host payloads and controllers in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{SummaryBuilder, loaded};
//!
//! let data = SummaryBuilder::new("Sales")
//!     .columns(&["Region", "Revenue"])
//!     .row(&["East", "100"])
//!     .build();
//! let app = loaded(data);
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use flextable::preferences::MemoryPreferences;
use flextable::render::RowKind;
use flextable::{AppController, FetchOutcome, SummaryData};

// ============================================================================
// Payload Builder
// ============================================================================

/// Builder for a `SummaryData` payload as the host would send it.
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    worksheet: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SummaryBuilder {
    pub fn new(worksheet: &str) -> Self {
        Self {
            worksheet: worksheet.to_string(),
            ..Self::default()
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| (*c).to_string()).collect());
        self
    }

    pub fn build(self) -> SummaryData {
        SummaryData {
            worksheet_name: self.worksheet,
            columns: self.columns,
            rows: self.rows,
            column_types: Vec::new(),
        }
    }

    /// The payload as the JSON object the host passes across the boundary.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.clone().build()).unwrap()
    }
}

// ============================================================================
// Canned Datasets
// ============================================================================

/// Two regions, two reps each, two measures.
pub fn sales() -> SummaryData {
    SummaryBuilder::new("Sales")
        .columns(&["Region", "Rep", "Revenue", "Cost"])
        .row(&["East", "Alice", "100", "40"])
        .row(&["East", "Bob", "200", "90"])
        .row(&["West", "Carl", "50", "20"])
        .row(&["West", "Dana", "150", "60"])
        .build()
}

/// Three-level hierarchy with an empty segment value.
pub fn territories() -> SummaryData {
    SummaryBuilder::new("Territories")
        .columns(&["Region", "State", "City", "Revenue"])
        .row(&["East", "NY", "Albany", "10"])
        .row(&["East", "NY", "Buffalo", "20"])
        .row(&["East", "MA", "", "5"])
        .row(&["West", "CA", "Fresno", "7"])
        .build()
}

/// No dimension columns: every row is a detail row.
pub fn measures_only() -> SummaryData {
    SummaryBuilder::new("Measures")
        .columns(&["Fee", "Spread", "Bonus"])
        .row(&["10", "5", "1"])
        .row(&["20", "-5", "2"])
        .row(&["30", "15", "3"])
        .build()
}

// ============================================================================
// Controller Helpers
// ============================================================================

pub type TestApp = AppController<MemoryPreferences>;

/// A controller that has applied `data` as its first fetch.
pub fn loaded(data: SummaryData) -> TestApp {
    loaded_with(MemoryPreferences::new(), data)
}

pub fn loaded_with(prefs: MemoryPreferences, data: SummaryData) -> TestApp {
    let mut app = AppController::new(prefs);
    assert_eq!(app.on_data_changed(data), FetchOutcome::Applied);
    app
}

/// Row-model values of one column for the visible body rows.
pub fn visible_column(app: &TestApp, column: usize) -> Vec<String> {
    let table = app.table().expect("table rendered");
    app.row_model()
        .rows()
        .iter()
        .zip(&table.body)
        .filter(|(_, row)| !row.hidden)
        .map(|(cells, _)| cells[column].clone())
        .collect()
}

/// Formatted cell text of one row-model column for the visible body rows.
pub fn displayed_column(app: &TestApp, column: usize) -> Vec<String> {
    app.table()
        .expect("table rendered")
        .body
        .iter()
        .filter(|row| !row.hidden)
        .map(|row| row.cells[column + 1].text.trim().to_string())
        .collect()
}

/// Group labels of the visible body rows.
pub fn visible_labels(app: &TestApp) -> Vec<String> {
    visible_column(app, 0)
}

/// Row kinds of every body row, hidden or not.
pub fn body_kinds(app: &TestApp) -> Vec<RowKind> {
    app.table()
        .expect("table rendered")
        .body
        .iter()
        .map(|r| r.kind)
        .collect()
}

pub fn visible_count(app: &TestApp) -> usize {
    app.table().map_or(0, |t| t.visible_row_count())
}
