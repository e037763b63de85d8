//! flextable - pivoting, filterable, exportable table view for BI dashboards
//!
//! Turns a flat dataset of display strings into an HTML table in the browser
//! via WebAssembly:
//! - Up to three levels of collapsible row grouping with sums
//! - Collapsible measure groups under a shared header
//! - Column filters and global search without re-rendering
//! - Reorder, resize, align, hide and number columns
//! - Number formats, row styling and conditional formatting
//! - CSV and configuration export
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { FlexTable } from 'flextable';
//! await init();
//! const table = new FlexTable(container, dataSource, settings);
//! await table.start();
//! ```

// Pipeline
pub mod conditional;
pub mod controllers;
pub mod csv;
pub mod debounce;
pub mod derived;
pub mod error;
pub mod export;
pub mod filter;
pub mod formatter;
pub mod logging;
pub mod measure_grouping;
pub mod numfmt;
pub mod pivot;
pub mod preferences;
pub mod projection;
pub mod render;
pub mod source;
pub mod types;
pub mod value_parser;

pub mod app;

// Browser shell
#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use app::{AppController, AppState, FetchOutcome, FetchTicket};
pub use error::{FlexTableError, Result};
#[cfg(target_arch = "wasm32")]
pub use viewer::FlexTable;

pub use types::*;

/// Render summary data to HTML with default settings.
///
/// `json` is a `SummaryData` object: `{ worksheetName, columns, rows }`.
///
/// # Errors
/// Returns an error if the JSON is invalid or the rows are ragged.
#[wasm_bindgen(js_name = "renderSummaryHtml")]
pub fn render_summary_html(json: &str) -> std::result::Result<String, JsValue> {
    render_summary(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn render_summary(json: &str) -> Result<String> {
    let data: SummaryData = serde_json::from_str(json)?;
    let mut app = AppController::new(preferences::MemoryPreferences::new());
    let ticket = app.begin_fetch(None);
    match app.complete_fetch(ticket, Ok(data)) {
        FetchOutcome::Applied => Ok(app.html()),
        FetchOutcome::Stale | FetchOutcome::Failed => Err(FlexTableError::Dataset(
            "summary data could not be rendered".into(),
        )),
    }
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_summary() {
        let json = r#"{"worksheetName":"S","columns":["A","B"],"rows":[["x","1"]]}"#;
        let html = render_summary(json).unwrap();
        assert!(html.contains("<table class=\"flextable\""));
        assert!(render_summary(r#"{"columns":["A"],"rows":[["1","2"]]}"#).is_err());
    }
}
