//! Browser shell around [`AppController`].
//!
//! This module provides the WASM-exported `FlexTable` struct that handles:
//! - Talking to the host data source and settings store
//! - Painting the rendered table into the container element
//! - Forwarding clicks and toolbar calls to the controller
//!
//! The DOM is only ever written from a [`crate::render::RenderedTable`]; nothing is read
//! back from it. A filter or search change only toggles row display and
//! renumbers rows.

mod download;
mod events;
mod host;

pub use host::{HostDataSource, HostPreferences};

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use js_sys::Promise;
use log::LevelFilter;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{HtmlElement, MouseEvent};

use crate::app::{AppController, FetchOutcome};
use crate::debounce::Debouncer;
use crate::logging;
use crate::types::{Alignment, ColumnFilter, DerivedColumn, FormattingSettings, MeasureGroup};

type App = AppController<HostPreferences>;

/// State shared between the exported struct and event closures.
pub(crate) struct SharedState {
    pub(crate) app: App,
    container: HtmlElement,
    pub(crate) search: Debouncer,
}

impl SharedState {
    /// Replace the container contents with the current table or pane.
    pub(crate) fn paint_full(&self) {
        self.container.set_inner_html(&self.app.html());
    }

    /// Sync row display and row numbers with the current table.
    pub(crate) fn paint_visibility(&self) {
        let Some(table) = self.app.table() else {
            return;
        };
        let Ok(rows) = self.container.query_selector_all("tbody > tr") else {
            return;
        };
        let numbered = self.app.controllers().row_numbers.enabled();
        for (i, row) in table.body.iter().enumerate() {
            let Some(node) = u32::try_from(i).ok().and_then(|i| rows.item(i)) else {
                break;
            };
            let Ok(el) = node.dyn_into::<HtmlElement>() else {
                continue;
            };
            let style = el.style();
            let painted = if row.hidden {
                style.set_property("display", "none")
            } else {
                style.remove_property("display").map(|_| ())
            };
            if painted.is_err() {
                log::debug!("could not update row {i}");
            }
            if numbered {
                if let Some(cell) = el.first_element_child() {
                    let text = row.cells.first().map(|c| c.text.as_str());
                    cell.set_text_content(text);
                }
            }
        }
    }
}

enum Paint {
    Full,
    Visibility,
}

fn outcome_name(outcome: FetchOutcome) -> &'static str {
    match outcome {
        FetchOutcome::Applied => "applied",
        FetchOutcome::Stale => "stale",
        FetchOutcome::Failed => "failed",
    }
}

/// Fetch a worksheet and paint the result unless a newer fetch started.
async fn refresh(
    state: Rc<RefCell<SharedState>>,
    host: HostDataSource,
    worksheet: Option<String>,
) -> &'static str {
    let ticket = match state.try_borrow_mut() {
        Ok(mut s) => s.app.begin_fetch(worksheet.as_deref()),
        Err(_) => {
            log::warn!("refresh skipped while the table is busy");
            return "busy";
        }
    };
    let result = host.fetch_summary_data(ticket.worksheet()).await;
    let Ok(mut s) = state.try_borrow_mut() else {
        return "busy";
    };
    let outcome = s.app.complete_fetch(ticket, result);
    if outcome != FetchOutcome::Stale {
        s.paint_full();
    }
    outcome_name(outcome)
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("invalid {what}: {e}")))
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// The pivot table extension, bound to one container element
#[wasm_bindgen]
pub struct FlexTable {
    state: Rc<RefCell<SharedState>>,
    host: HostDataSource,
    #[allow(dead_code)]
    click_closure: Closure<dyn FnMut(MouseEvent)>,
    data_changed_closure: Closure<dyn FnMut(JsValue)>,
}

#[wasm_bindgen]
impl FlexTable {
    /// `host` is the data source object, `settings` the preference store.
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, host: JsValue, settings: JsValue) -> FlexTable {
        console_error_panic_hook::set_once();
        logging::init(LevelFilter::Info);

        let state = Rc::new(RefCell::new(SharedState {
            app: AppController::new(HostPreferences::new(settings)),
            container: container.clone(),
            search: Debouncer::new(),
        }));
        let host = HostDataSource::new(host);

        let click_closure = {
            let state = Rc::clone(&state);
            Closure::wrap(Box::new(move |event: MouseEvent| {
                events::handle_click(&state, &event);
            }) as Box<dyn FnMut(MouseEvent)>)
        };
        container
            .add_event_listener_with_callback("click", click_closure.as_ref().unchecked_ref())
            .ok();

        let data_changed_closure = {
            let weak = Rc::downgrade(&state);
            let host = host.clone();
            Closure::wrap(Box::new(move |_event: JsValue| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                log::info!("host data changed");
                let host = host.clone();
                spawn_local(async move {
                    refresh(state, host, None).await;
                });
            }) as Box<dyn FnMut(JsValue)>)
        };

        state.borrow().paint_full();
        FlexTable {
            state,
            host,
            click_closure,
            data_changed_closure,
        }
    }

    /// Initialize the host, subscribe to data changes and load the first
    /// worksheet. Resolves to `"applied"`, `"stale"`, `"failed"` or `"busy"`.
    pub fn start(&self) -> Promise {
        let state = Rc::clone(&self.state);
        let host = self.host.clone();
        if !host.on_data_changed(self.data_changed_closure.as_ref().unchecked_ref()) {
            log::info!("host does not report data changes");
        }
        future_to_promise(async move {
            if let Err(err) = host.initialize().await {
                if let Ok(mut s) = state.try_borrow_mut() {
                    let ticket = s.app.begin_fetch(None);
                    s.app.complete_fetch(ticket, Err(err));
                    s.paint_full();
                }
                return Ok(JsValue::from_str(outcome_name(FetchOutcome::Failed)));
            }
            Ok(JsValue::from_str(refresh(state, host, None).await))
        })
    }

    /// Load `worksheet`, or reload the current one.
    pub fn load(&self, worksheet: Option<String>) -> Promise {
        let state = Rc::clone(&self.state);
        let host = self.host.clone();
        future_to_promise(async move { Ok(JsValue::from_str(refresh(state, host, worksheet).await)) })
    }

    #[wasm_bindgen(js_name = "listWorksheets")]
    pub fn list_worksheets(&self) -> Promise {
        let host = self.host.clone();
        future_to_promise(async move {
            let sheets = host.list_worksheets().await?;
            to_js(&sheets)
        })
    }

    pub fn html(&self) -> String {
        self.state.borrow().app.html()
    }

    fn update<F>(&self, paint: Paint, f: F) -> Result<(), JsValue>
    where
        F: FnOnce(&mut App) -> crate::error::Result<()>,
    {
        let mut s = self
            .state
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("table is busy"))?;
        f(&mut s.app)?;
        match paint {
            Paint::Full => s.paint_full(),
            Paint::Visibility => s.paint_visibility(),
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&App) -> T) -> T {
        f(&self.state.borrow().app)
    }

    // ---- pivot and groups ----

    #[wasm_bindgen(js_name = "toggleRow")]
    pub fn toggle_row(&self, key: &str) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.toggle_pivot_key(key).map(|_| ()))
    }

    #[wasm_bindgen(js_name = "expandAll")]
    pub fn expand_all(&self) -> Result<(), JsValue> {
        self.update(Paint::Full, App::expand_all)
    }

    #[wasm_bindgen(js_name = "collapseAll")]
    pub fn collapse_all(&self) -> Result<(), JsValue> {
        self.update(Paint::Full, App::collapse_all)
    }

    #[wasm_bindgen(js_name = "toggleGroup")]
    pub fn toggle_group(&self, index: usize) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.toggle_measure_group(index).map(|_| ()))
    }

    #[wasm_bindgen(js_name = "addMeasureGroup")]
    pub fn add_measure_group(
        &self,
        name: &str,
        measures: JsValue,
        collapsed: bool,
    ) -> Result<(), JsValue> {
        let measures: Vec<String> = from_js(measures, "measure list")?;
        self.update(Paint::Full, |app| {
            app.add_measure_group(name, measures, collapsed)
        })
    }

    #[wasm_bindgen(js_name = "removeMeasureGroup")]
    pub fn remove_measure_group(&self, index: usize) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.remove_measure_group(index).map(|_| ()))
    }

    #[wasm_bindgen(js_name = "setMeasureGroups")]
    pub fn set_measure_groups(&self, groups: JsValue) -> Result<(), JsValue> {
        let groups: Vec<MeasureGroup> = from_js(groups, "measure groups")?;
        self.update(Paint::Full, |app| app.set_measure_groups(groups))
    }

    #[wasm_bindgen(js_name = "measureGroups")]
    pub fn measure_groups(&self) -> Result<JsValue, JsValue> {
        self.read(|app| to_js(app.measure_groups().groups()))
    }

    // ---- filters ----

    /// Debounced global search.
    #[wasm_bindgen(js_name = "setSearch")]
    pub fn set_search(&self, term: String) {
        events::schedule_search(&self.state, term);
    }

    #[wasm_bindgen(js_name = "setTextFilter")]
    pub fn set_text_filter(&self, column: usize, needle: &str) -> Result<(), JsValue> {
        self.update(Paint::Visibility, |app| {
            app.set_text_filter(column, needle);
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = "setDiscreteFilter")]
    pub fn set_discrete_filter(&self, column: usize, selected: JsValue) -> Result<(), JsValue> {
        let selected: BTreeSet<String> = from_js(selected, "selection")?;
        self.update(Paint::Visibility, |app| {
            app.set_discrete_filter(column, selected);
            Ok(())
        })
    }

    /// Install a number, date, text or discrete filter object.
    #[wasm_bindgen(js_name = "setFilter")]
    pub fn set_filter(&self, column: usize, filter: JsValue) -> Result<(), JsValue> {
        let filter: ColumnFilter = from_js(filter, "filter")?;
        self.update(Paint::Visibility, |app| {
            app.set_filter(column, filter);
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = "removeFilter")]
    pub fn remove_filter(&self, column: usize) -> Result<(), JsValue> {
        self.update(Paint::Visibility, |app| {
            app.remove_filter(column);
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = "clearFilters")]
    pub fn clear_filters(&self) -> Result<(), JsValue> {
        self.update(Paint::Visibility, |app| {
            app.clear_filters();
            Ok(())
        })
    }

    /// Filter control kind of every row-model column.
    #[wasm_bindgen(js_name = "filterKinds")]
    pub fn filter_kinds(&self) -> Result<JsValue, JsValue> {
        self.read(|app| to_js(app.filter_kinds()))
    }

    /// Row-model column names, the indices used by the filter calls.
    pub fn columns(&self) -> Result<JsValue, JsValue> {
        self.read(|app| to_js(app.row_model().columns()))
    }

    // ---- columns ----

    #[wasm_bindgen(js_name = "setColumnHidden")]
    pub fn set_column_hidden(&self, column: &str, hidden: bool) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.set_column_hidden(column, hidden))
    }

    #[wasm_bindgen(js_name = "showAllColumns")]
    pub fn show_all_columns(&self) -> Result<(), JsValue> {
        self.update(Paint::Full, App::show_all_columns)
    }

    #[wasm_bindgen(js_name = "moveColumn")]
    pub fn move_column(&self, column: &str, index: usize) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.move_column(column, index).map(|_| ()))
    }

    #[wasm_bindgen(js_name = "setColumnWidth")]
    pub fn set_column_width(&self, column: &str, px: u32) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| {
            app.set_column_width(column, px);
            Ok(())
        })
    }

    /// `alignment` is `"left"`, `"center"` or `"right"`.
    #[wasm_bindgen(js_name = "setAlignment")]
    pub fn set_alignment(&self, column: &str, alignment: &str) -> Result<(), JsValue> {
        let alignment = match alignment {
            "left" => Alignment::Left,
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            other => return Err(JsValue::from_str(&format!("unknown alignment {other}"))),
        };
        self.update(Paint::Full, |app| {
            app.set_alignment(column, alignment);
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = "setRowNumbers")]
    pub fn set_row_numbers(&self, enabled: bool) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| {
            app.set_row_numbers(enabled);
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = "resetLayout")]
    pub fn reset_layout(&self) -> Result<(), JsValue> {
        self.update(Paint::Full, App::reset_layout)
    }

    // ---- formatting and derived columns ----

    pub fn formatting(&self) -> Result<JsValue, JsValue> {
        self.read(|app| to_js(app.formatter().settings()))
    }

    #[wasm_bindgen(js_name = "setFormatting")]
    pub fn set_formatting(&self, settings: JsValue) -> Result<(), JsValue> {
        let settings: FormattingSettings = from_js(settings, "formatting settings")?;
        self.update(Paint::Full, |app| app.set_formatting(settings))
    }

    #[wasm_bindgen(js_name = "resetFormatting")]
    pub fn reset_formatting(&self) -> Result<(), JsValue> {
        self.update(Paint::Full, App::reset_formatting)
    }

    #[wasm_bindgen(js_name = "addDerivedColumn")]
    pub fn add_derived_column(&self, column: JsValue) -> Result<(), JsValue> {
        let column: DerivedColumn = from_js(column, "derived column")?;
        self.update(Paint::Full, |app| app.add_derived_column(column))
    }

    #[wasm_bindgen(js_name = "removeDerivedColumn")]
    pub fn remove_derived_column(&self, name: &str) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.remove_derived_column(name).map(|_| ()))
    }

    // ---- export ----

    /// Download the visible table as CSV.
    #[wasm_bindgen(js_name = "exportCsv")]
    pub fn export_csv(&self, filename: &str) -> Result<(), JsValue> {
        let csv = self
            .read(App::export_visible_csv)
            .ok_or_else(|| JsValue::from_str("nothing to export"))?;
        download::download_text(filename, &csv, "text/csv;charset=utf-8")
    }

    /// Download the source data as CSV.
    #[wasm_bindgen(js_name = "exportRawCsv")]
    pub fn export_raw_csv(&self, filename: &str) -> Result<(), JsValue> {
        let csv = self
            .read(App::export_raw_csv)
            .ok_or_else(|| JsValue::from_str("nothing to export"))?;
        download::download_text(filename, &csv, "text/csv;charset=utf-8")
    }

    #[wasm_bindgen(js_name = "exportConfig")]
    pub fn export_config(&self, filename: &str) -> Result<(), JsValue> {
        let now = chrono::Utc::now().to_rfc3339();
        let json = self.read(|app| app.export_config(&now))?;
        download::download_text(filename, &json, "application/json")
    }

    #[wasm_bindgen(js_name = "importConfig")]
    pub fn import_config(&self, text: &str) -> Result<(), JsValue> {
        self.update(Paint::Full, |app| app.import_config(text))
    }

    #[wasm_bindgen(js_name = "renderCount")]
    pub fn render_count(&self) -> u64 {
        self.read(App::render_count)
    }
}
