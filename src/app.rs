//! Application state machine and render pipeline.
//!
//! [`AppController`] owns every model. Structural changes go through
//! [`AppController::rebuild`]:
//!
//! 1. append derived columns to the source dataset
//! 2. project (pivot hierarchy, column order, grouping clusters, hidden
//!    dimensions)
//! 3. render the structure and its row model, then format
//! 4. re-apply interaction controllers
//! 5. re-type and re-key filters against the new row model
//! 6. visibility pass
//! 7. persist preferences
//!
//! Layout-only changes restart at step 4 from the last rendered table and
//! filter changes only run step 6.

use std::collections::BTreeSet;

use crate::controllers::{Controllers, TableController};
use crate::derived::append_derived_columns;
use crate::error::{FlexTableError, Result};
use crate::export;
use crate::filter::{compute_visibility, detect_filter_kinds, distinct_values};
use crate::formatter::TableFormatter;
use crate::logging::now_ms;
use crate::measure_grouping::MeasureGroupingModel;
use crate::pivot::PivotGroupingModel;
use crate::preferences::{
    load_or_default, store, Preferences, DERIVED_COLUMNS_KEY, FORMATTING_KEY, LAYOUT_KEY,
    MEASURE_GROUPS_KEY, PIVOT_STATE_KEY,
};
use crate::projection::{project, Projection};
use crate::render::{escape_html, RenderedTable, TableRenderer};
use crate::source::DataSource;
use crate::types::{
    Alignment, ColumnFilter, ColumnLayoutState, ConditionalRule, Dataset, DerivedColumn,
    FilterKind, FilterState, FormattingSettings, MeasureGroup, NumberFormatOverride,
    PivotStatePairs, SummaryData,
};

/// Lifecycle of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for the first dataset
    Loading,
    Ready,
    /// A table is shown while a newer fetch is in flight
    Refreshing,
    /// The first load failed; no table is shown
    Error(String),
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    worksheet: Option<String>,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was started; the result was dropped
    Stale,
    Failed,
}

pub const ERROR_HINT: &str =
    "Make sure this page is loaded as a dashboard extension inside the host application.";

/// The row model with columns hidden through the columns menu emptied, so
/// search only matches text the user can see.
fn searchable_model(model: &Dataset, controllers: &Controllers) -> Dataset {
    let hidden: Vec<bool> = model
        .columns()
        .iter()
        .map(|name| controllers.columns.is_hidden(name))
        .collect();
    if !hidden.contains(&true) {
        return model.clone();
    }
    let rows = model
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&hidden)
                .map(|(cell, &h)| if h { String::new() } else { cell.clone() })
                .collect()
        })
        .collect();
    Dataset::new(model.columns().to_vec(), rows)
        .unwrap_or_default()
        .with_generation(model.generation())
}

/// Owns the dataset, every model and the current table.
pub struct AppController<P: Preferences> {
    prefs: P,
    state: AppState,
    generation: u64,
    worksheet: Option<String>,

    source: Option<Dataset>,
    view: Dataset,
    hierarchy: Vec<usize>,
    /// Rendered and formatted, before controllers
    base: Option<RenderedTable>,
    table: Option<RenderedTable>,
    row_model: Dataset,
    filter_kinds: Vec<FilterKind>,
    filters: FilterState,

    pivot: PivotGroupingModel,
    groups: MeasureGroupingModel,
    formatter: TableFormatter,
    controllers: Controllers,
    derived: Vec<DerivedColumn>,
    renderer: TableRenderer,
}

impl<P: Preferences> AppController<P> {
    /// Create a controller, restoring persisted preferences from `prefs`.
    pub fn new(prefs: P) -> Self {
        let mut groups = MeasureGroupingModel::new();
        groups.replace_groups(load_or_default::<Vec<MeasureGroup>, _>(&prefs, MEASURE_GROUPS_KEY));
        let mut pivot = PivotGroupingModel::new();
        let pairs: PivotStatePairs = load_or_default(&prefs, PIVOT_STATE_KEY);
        if !pairs.is_empty() {
            pivot.restore_expansion_state(&pairs);
        }
        let formatter = TableFormatter::new(load_or_default(&prefs, FORMATTING_KEY));
        let controllers =
            Controllers::from_layout(load_or_default::<ColumnLayoutState, _>(&prefs, LAYOUT_KEY));
        let derived: Vec<DerivedColumn> = load_or_default(&prefs, DERIVED_COLUMNS_KEY);
        log::info!(
            "restored {} measure groups, {} pivot keys, {} derived columns",
            groups.groups().len(),
            pairs.len(),
            derived.len()
        );
        Self {
            prefs,
            state: AppState::Loading,
            generation: 0,
            worksheet: None,
            source: None,
            view: Dataset::default(),
            hierarchy: Vec::new(),
            base: None,
            table: None,
            row_model: Dataset::default(),
            filter_kinds: Vec::new(),
            filters: FilterState::new(),
            pivot,
            groups,
            formatter,
            controllers,
            derived,
            renderer: TableRenderer::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Generation of the most recently started fetch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }

    pub fn preferences(&self) -> &P {
        &self.prefs
    }

    /// The source dataset as last fetched.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.source.as_ref()
    }

    /// The projected dataset the table was rendered from.
    pub fn view(&self) -> &Dataset {
        &self.view
    }

    pub fn hierarchy(&self) -> &[usize] {
        &self.hierarchy
    }

    pub fn table(&self) -> Option<&RenderedTable> {
        self.table.as_ref()
    }

    pub fn row_model(&self) -> &Dataset {
        &self.row_model
    }

    pub fn filter_kinds(&self) -> &[FilterKind] {
        &self.filter_kinds
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pivot(&self) -> &PivotGroupingModel {
        &self.pivot
    }

    pub fn measure_groups(&self) -> &MeasureGroupingModel {
        &self.groups
    }

    pub fn formatter(&self) -> &TableFormatter {
        &self.formatter
    }

    pub fn controllers(&self) -> &Controllers {
        &self.controllers
    }

    pub fn derived_columns(&self) -> &[DerivedColumn] {
        &self.derived
    }

    pub fn render_count(&self) -> u64 {
        self.renderer.render_count()
    }

    // ---- fetch lifecycle ----

    /// Start a fetch. Any fetch started earlier becomes stale.
    pub fn begin_fetch(&mut self, worksheet: Option<&str>) -> FetchTicket {
        self.generation += 1;
        if let Some(name) = worksheet {
            self.worksheet = Some(name.to_string());
        }
        self.state = match self.state {
            AppState::Ready | AppState::Refreshing => AppState::Refreshing,
            AppState::Loading | AppState::Error(_) => AppState::Loading,
        };
        log::debug!("fetch {} started", self.generation);
        FetchTicket {
            generation: self.generation,
            worksheet: self.worksheet.clone(),
        }
    }

    /// Deliver the result of a fetch.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<SummaryData>,
    ) -> FetchOutcome {
        if ticket.generation != self.generation {
            log::warn!(
                "dropping stale fetch {} (current {})",
                ticket.generation,
                self.generation
            );
            return FetchOutcome::Stale;
        }
        let adopted = result.and_then(|data| self.adopt(data, ticket.generation));
        match adopted {
            Ok(()) => {
                self.state = AppState::Ready;
                FetchOutcome::Applied
            }
            Err(err) => {
                log::error!("fetch {} failed: {err}", ticket.generation);
                self.state = if self.table.is_some() {
                    AppState::Ready
                } else {
                    AppState::Error(err.to_string())
                };
                FetchOutcome::Failed
            }
        }
    }

    /// The host reported new data: run the full pipeline on it.
    pub fn on_data_changed(&mut self, payload: SummaryData) -> FetchOutcome {
        let worksheet = self.worksheet.clone();
        let ticket = self.begin_fetch(worksheet.as_deref());
        self.complete_fetch(ticket, Ok(payload))
    }

    /// Initialize `source` and load the current worksheet from it.
    pub fn load(&mut self, source: &mut dyn DataSource) -> FetchOutcome {
        let worksheet = self.worksheet.clone();
        let ticket = self.begin_fetch(worksheet.as_deref());
        let result = source
            .initialize()
            .and_then(|()| source.fetch_summary_data(ticket.worksheet()));
        self.complete_fetch(ticket, result)
    }

    fn adopt(&mut self, data: SummaryData, generation: u64) -> Result<()> {
        if !data.worksheet_name.is_empty() {
            self.worksheet = Some(data.worksheet_name.clone());
        }
        let dataset = Dataset::try_from(data)?.with_generation(generation);
        log::info!(
            "generation {generation}: {} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        );
        self.pivot.observe_columns(dataset.columns());
        self.source = Some(dataset);
        self.rebuild()
    }

    // ---- pipeline ----

    /// Full structural rebuild from the source dataset.
    pub fn rebuild(&mut self) -> Result<()> {
        let Some(source) = self.source.as_ref() else {
            return Ok(());
        };
        let started = now_ms();
        let working = append_derived_columns(source, &self.derived);
        let Projection { view, hierarchy } = project(&working, &self.controllers, &self.groups)?;
        let base = self.renderer.render(
            &view,
            &hierarchy,
            &self.pivot,
            &self.groups,
            &self.formatter,
        );
        let old_columns = self.row_model.columns().to_vec();
        self.row_model = searchable_model(base.row_model(), &self.controllers);
        self.view = view;
        self.hierarchy = hierarchy;
        self.base = Some(base);
        self.relayout();

        self.filter_kinds = detect_filter_kinds(&self.row_model);
        if !old_columns.is_empty() {
            self.filters
                .remap(&old_columns, self.row_model.columns(), &self.filter_kinds);
        }
        self.refresh_visibility();
        self.persist();
        log::debug!(
            "rebuild of generation {} took {:.1} ms",
            self.view.generation(),
            now_ms() - started
        );
        Ok(())
    }

    /// Re-apply controllers to a copy of the last rendered table.
    fn relayout(&mut self) {
        let Some(base) = self.base.as_ref() else {
            return;
        };
        let mut table = base.clone();
        self.controllers.reapply_all(&mut table);
        if let Some(previous) = self.table.as_ref() {
            if previous.body.len() == table.body.len() {
                let flags: Vec<bool> = previous.body.iter().map(|r| !r.hidden).collect();
                table.apply_visibility(&flags);
                self.controllers.row_numbers.reapply(&mut table);
            }
        }
        self.table = Some(table);
    }

    /// Recompute row visibility and renumber rows; nothing is rebuilt.
    pub fn refresh_visibility(&mut self) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        let flags = compute_visibility(&self.row_model, &self.filters, self.filters.search());
        table.apply_visibility(&flags);
        self.controllers.row_numbers.reapply(table);
        log::trace!(
            "{} of {} rows visible",
            table.visible_row_count(),
            table.body.len()
        );
    }

    fn layout_changed(&mut self) {
        self.relayout();
        self.persist();
    }

    fn persist(&mut self) {
        let layout = self.controllers.to_layout();
        let pivot = self.pivot.expansion_state();
        let results = [
            store(&mut self.prefs, MEASURE_GROUPS_KEY, self.groups.groups()),
            store(&mut self.prefs, PIVOT_STATE_KEY, &pivot),
            store(&mut self.prefs, FORMATTING_KEY, self.formatter.settings()),
            store(&mut self.prefs, LAYOUT_KEY, &layout),
            store(&mut self.prefs, DERIVED_COLUMNS_KEY, &self.derived),
        ];
        for err in results.into_iter().filter_map(std::result::Result::err) {
            log::warn!("failed to save preferences: {err}");
        }
    }

    // ---- pivot ----

    /// Toggle a pivot row by its `data-pivot-key`. Returns the new state.
    pub fn toggle_pivot_key(&mut self, key: &str) -> Result<bool> {
        let collapsed = self.pivot.toggle_key(key);
        self.rebuild()?;
        Ok(collapsed)
    }

    pub fn toggle_category(&mut self, category: &str) -> Result<bool> {
        let collapsed = self.pivot.toggle_category(category);
        self.rebuild()?;
        Ok(collapsed)
    }

    pub fn toggle_sub_category(&mut self, category: &str, sub_category: &str) -> Result<bool> {
        let collapsed = self.pivot.toggle_sub_category(category, sub_category);
        self.rebuild()?;
        Ok(collapsed)
    }

    pub fn expand_all(&mut self) -> Result<()> {
        self.pivot.expand_all(&self.view, &self.hierarchy);
        self.rebuild()
    }

    pub fn collapse_all(&mut self) -> Result<()> {
        self.pivot.collapse_all(&self.view, &self.hierarchy);
        self.rebuild()
    }

    // ---- measure groups ----

    pub fn toggle_measure_group(&mut self, index: usize) -> Result<Option<bool>> {
        let collapsed = self.groups.toggle_group(index);
        if collapsed.is_some() {
            self.rebuild()?;
        }
        Ok(collapsed)
    }

    /// Add a group after validating it has a name and two or more measures.
    pub fn add_measure_group(
        &mut self,
        name: &str,
        measures: Vec<String>,
        collapsed: bool,
    ) -> Result<()> {
        let candidate = MeasureGroup::new(name, measures, collapsed);
        if !candidate.is_valid() {
            return Err(FlexTableError::Other(
                "a measure group needs a name and at least two measures".into(),
            ));
        }
        self.groups
            .add_group(&candidate.name, candidate.measures, candidate.collapsed);
        self.rebuild()
    }

    pub fn remove_measure_group(&mut self, index: usize) -> Result<Option<MeasureGroup>> {
        let removed = self.groups.remove_group(index);
        if removed.is_some() {
            self.rebuild()?;
        }
        Ok(removed)
    }

    pub fn set_measure_groups(&mut self, groups: Vec<MeasureGroup>) -> Result<()> {
        self.groups.replace_groups(groups);
        self.rebuild()
    }

    pub fn set_all_groups_collapsed(&mut self, collapsed: bool) -> Result<()> {
        self.groups.set_all_collapsed(collapsed);
        self.rebuild()
    }

    // ---- columns ----

    fn working_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .source
            .as_ref()
            .map(|ds| ds.columns().to_vec())
            .unwrap_or_default();
        columns.extend(self.derived.iter().map(|d| d.name.clone()));
        columns
    }

    /// Move a column to `index` of the user order. Returns false if unknown.
    pub fn move_column(&mut self, column: &str, index: usize) -> Result<bool> {
        let columns = self.working_columns();
        if !self.controllers.reorder.move_column(column, index, &columns) {
            return Ok(false);
        }
        self.rebuild()?;
        Ok(true)
    }

    pub fn set_column_hidden(&mut self, column: &str, hidden: bool) -> Result<()> {
        if self.controllers.columns.set_hidden(column, hidden) {
            self.rebuild()?;
        }
        Ok(())
    }

    pub fn show_all_columns(&mut self) -> Result<()> {
        self.controllers.columns.show_all();
        self.rebuild()
    }

    /// Set a width in pixels; returns the stored, clamped width.
    pub fn set_column_width(&mut self, column: &str, px: u32) -> u32 {
        let stored = self.controllers.resize.set_width(column, px);
        self.layout_changed();
        stored
    }

    pub fn clear_column_width(&mut self, column: &str) {
        self.controllers.resize.clear_width(column);
        self.layout_changed();
    }

    pub fn set_alignment(&mut self, column: &str, alignment: Alignment) {
        self.controllers.alignment.set_alignment(column, alignment);
        self.layout_changed();
    }

    pub fn clear_alignment(&mut self, column: &str) {
        self.controllers.alignment.clear_alignment(column);
        self.layout_changed();
    }

    pub fn set_row_numbers(&mut self, enabled: bool) {
        self.controllers.row_numbers.set_enabled(enabled);
        self.layout_changed();
    }

    /// Forget order, widths and alignments.
    pub fn reset_layout(&mut self) -> Result<()> {
        self.controllers.reset_layout();
        self.rebuild()
    }

    // ---- filters ----

    pub fn set_search(&mut self, term: &str) {
        self.filters.set_search(term);
        self.refresh_visibility();
    }

    pub fn set_filter(&mut self, column: usize, filter: ColumnFilter) {
        self.filters.set_filter(column, filter);
        self.refresh_visibility();
    }

    pub fn set_text_filter(&mut self, column: usize, needle: &str) {
        self.filters.set_text(column, needle);
        self.refresh_visibility();
    }

    pub fn set_discrete_filter(&mut self, column: usize, selected: BTreeSet<String>) {
        let all = distinct_values(&self.row_model, column);
        self.filters.set_discrete(column, selected, &all);
        self.refresh_visibility();
    }

    pub fn remove_filter(&mut self, column: usize) {
        if self.filters.remove(column).is_some() {
            self.refresh_visibility();
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.refresh_visibility();
    }

    // ---- formatting and derived columns ----

    pub fn set_formatting(&mut self, settings: FormattingSettings) -> Result<()> {
        self.formatter.set_settings(settings);
        self.rebuild()
    }

    pub fn set_column_number_format(
        &mut self,
        column: &str,
        format: NumberFormatOverride,
    ) -> Result<()> {
        self.formatter.set_column_number_format(column, format);
        self.rebuild()
    }

    pub fn remove_column_formatting(&mut self, column: &str) -> Result<()> {
        if self.formatter.remove_column_formatting(column) {
            self.rebuild()?;
        }
        Ok(())
    }

    pub fn add_conditional_rule(&mut self, rule: ConditionalRule) -> Result<()> {
        self.formatter.add_conditional_rule(rule);
        self.rebuild()
    }

    pub fn remove_conditional_rule(&mut self, index: usize) -> Result<Option<ConditionalRule>> {
        let removed = self.formatter.remove_conditional_rule(index);
        if removed.is_some() {
            self.rebuild()?;
        }
        Ok(removed)
    }

    pub fn reset_formatting(&mut self) -> Result<()> {
        self.formatter.reset_to_defaults();
        self.rebuild()
    }

    /// Append a derived column; names must be unique across the dataset.
    pub fn add_derived_column(&mut self, column: DerivedColumn) -> Result<()> {
        if self.working_columns().contains(&column.name) {
            return Err(FlexTableError::Other(format!(
                "column {} already exists",
                column.name
            )));
        }
        self.derived.push(column);
        self.rebuild()
    }

    pub fn remove_derived_column(&mut self, name: &str) -> Result<bool> {
        let before = self.derived.len();
        self.derived.retain(|d| d.name != name);
        if self.derived.len() == before {
            return Ok(false);
        }
        self.rebuild()?;
        Ok(true)
    }

    // ---- output ----

    /// HTML for the extension pane: the table, a loading note or the
    /// full-pane error.
    pub fn html(&self) -> String {
        match (&self.state, self.table.as_ref()) {
            (AppState::Error(message), _) => format!(
                "<div class=\"flextable-error\"><h3>Unable to load data</h3><p>{}</p><p>{}</p></div>",
                escape_html(message),
                ERROR_HINT
            ),
            (_, Some(table)) => table.to_html(),
            (_, None) => "<div class=\"flextable-loading\">Loading\u{2026}</div>".to_string(),
        }
    }

    /// What the user currently sees, as CSV.
    pub fn export_visible_csv(&self) -> Option<String> {
        self.table.as_ref().map(export::visible_csv)
    }

    /// The source dataset as CSV.
    pub fn export_raw_csv(&self) -> Option<String> {
        self.source.as_ref().map(export::raw_csv)
    }

    pub fn export_config(&self, exported_at: &str) -> Result<String> {
        export::export_config(
            self.groups.groups(),
            &self.pivot.expansion_state(),
            exported_at,
        )
    }

    /// Apply a configuration file. State is untouched when it is invalid.
    pub fn import_config(&mut self, text: &str) -> Result<()> {
        let config = export::import_config(text)?;
        log::info!(
            "importing configuration from {} ({} groups)",
            config.export_date,
            config.measure_groups.len()
        );
        self.groups.replace_groups(config.measure_groups);
        self.pivot.restore_expansion_state(&config.pivot_state);
        if let Some(source) = self.source.as_ref() {
            self.pivot.observe_columns(source.columns());
        }
        self.rebuild()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferences;

    fn payload() -> SummaryData {
        SummaryData {
            worksheet_name: "Sales".into(),
            columns: vec!["Region".into(), "Rep".into(), "Revenue".into()],
            rows: vec![
                vec!["East".into(), "Alice".into(), "100".into()],
                vec!["East".into(), "Bob".into(), "200".into()],
                vec!["West".into(), "Carl".into(), "50".into()],
            ],
            column_types: Vec::new(),
        }
    }

    #[test]
    fn test_stale_fetch_dropped() {
        let mut app = AppController::new(MemoryPreferences::new());
        let first = app.begin_fetch(None);
        let second = app.begin_fetch(None);
        assert_eq!(app.complete_fetch(first, Ok(payload())), FetchOutcome::Stale);
        assert!(app.table().is_none());
        assert_eq!(app.complete_fetch(second, Ok(payload())), FetchOutcome::Applied);
        assert_eq!(app.state(), &AppState::Ready);
        assert_eq!(app.table().unwrap().generation, 2);
    }

    #[test]
    fn test_initial_failure_shows_error_pane() {
        let mut app = AppController::new(MemoryPreferences::new());
        let t = app.begin_fetch(None);
        let outcome = app.complete_fetch(t, Err(FlexTableError::DataSource("no host".into())));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert!(matches!(app.state(), AppState::Error(_)));
        assert!(app.html().contains("dashboard extension"));

        // A later success recovers
        assert_eq!(app.on_data_changed(payload()), FetchOutcome::Applied);
        assert!(app.html().starts_with("<table"));
    }

    #[test]
    fn test_later_failure_keeps_table() {
        let mut app = AppController::new(MemoryPreferences::new());
        app.on_data_changed(payload());
        let t = app.begin_fetch(None);
        assert_eq!(app.state(), &AppState::Refreshing);
        app.complete_fetch(t, Err(FlexTableError::DataSource("timeout".into())));
        assert_eq!(app.state(), &AppState::Ready);
        assert!(app.table().is_some());
    }

    #[test]
    fn test_search_does_not_rerender() {
        let mut app = AppController::new(MemoryPreferences::new());
        app.on_data_changed(payload());
        let renders = app.render_count();
        app.set_search("west");
        assert_eq!(app.render_count(), renders);
        assert_eq!(app.table().unwrap().visible_row_count(), 1);
        app.set_row_numbers(true);
        app.set_column_width("Revenue", 120);
        assert_eq!(app.render_count(), renders);
        // Visibility survives a layout change
        assert_eq!(app.table().unwrap().visible_row_count(), 1);
    }

    #[test]
    fn test_preferences_persist_across_instances() {
        let mut app = AppController::new(MemoryPreferences::new());
        app.on_data_changed(payload());
        app.toggle_category("East").unwrap();
        app.set_alignment("Revenue", Alignment::Center);
        let prefs = app.preferences().clone();

        let mut again = AppController::new(prefs);
        again.on_data_changed(payload());
        assert!(!again.pivot().is_category_collapsed("East"));
        assert_eq!(
            again.controllers().alignment.overrides().get("Revenue"),
            Some(&Alignment::Center)
        );
        assert_eq!(again.table().unwrap().body.len(), 4);
    }
}
