//! Row visibility from column predicates and the global search term.
//!
//! Evaluation reads only the row model, never rendered output, so
//! [`compute_visibility`] is a pure function of its inputs.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

use crate::types::{ColumnFilter, DateOp, Dataset, FilterKind, FilterState, NumberOp};
use crate::value_parser::{classify_column, parse_date, parse_number, ColumnKind};

/// Rows sampled when detecting filter kinds.
pub const FILTER_SAMPLE_ROWS: usize = 200;

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> impl Iterator<Item = (usize, &ColumnFilter)> {
        self.filters.iter().map(|(k, v)| (*k, v))
    }

    pub fn get(&self, column: usize) -> Option<&ColumnFilter> {
        self.filters.get(&column)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_active(&self) -> bool {
        !self.filters.is_empty() || !self.search.trim().is_empty()
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    /// Install a predicate, or remove the entry when it carries no value.
    pub fn set_filter(&mut self, column: usize, filter: ColumnFilter) {
        if is_empty_filter(&filter) {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, filter);
        }
    }

    /// Set a text filter; an empty needle removes the entry.
    pub fn set_text(&mut self, column: usize, needle: &str) {
        self.set_filter(
            column,
            ColumnFilter::Text {
                needle: needle.trim().to_lowercase(),
            },
        );
    }

    /// Set a discrete selection against the column's full value set.
    ///
    /// Selecting nothing or everything removes the entry.
    pub fn set_discrete(&mut self, column: usize, selected: BTreeSet<String>, all: &[String]) {
        let covers_all = !all.is_empty() && all.iter().all(|v| selected.contains(v.trim()));
        if covers_all {
            self.filters.remove(&column);
        } else {
            self.set_filter(column, ColumnFilter::Discrete { selected });
        }
    }

    pub fn remove(&mut self, column: usize) -> Option<ColumnFilter> {
        self.filters.remove(&column)
    }

    /// Drop every column filter and the search term.
    pub fn clear(&mut self) {
        self.filters.clear();
        self.search.clear();
    }

    /// Re-key filters after a rebuild, following columns by name.
    ///
    /// Filters whose column vanished, or whose predicate no longer fits the
    /// column's detected kind, are dropped.
    pub fn remap(&mut self, old_columns: &[String], new_columns: &[String], kinds: &[FilterKind]) {
        let previous = std::mem::take(&mut self.filters);
        for (idx, filter) in previous {
            let Some(name) = old_columns.get(idx) else {
                continue;
            };
            let Some(new_idx) = new_columns.iter().position(|c| c == name) else {
                continue;
            };
            if kinds
                .get(new_idx)
                .is_some_and(|kind| filter_fits_kind(&filter, kind))
            {
                self.filters.insert(new_idx, filter);
            }
        }
    }
}

fn is_empty_filter(filter: &ColumnFilter) -> bool {
    match filter {
        ColumnFilter::Text { needle } => needle.trim().is_empty(),
        ColumnFilter::Number { v1, .. } | ColumnFilter::Date { v1, .. } => v1.trim().is_empty(),
        ColumnFilter::Discrete { selected } => selected.is_empty(),
    }
}

fn filter_fits_kind(filter: &ColumnFilter, kind: &FilterKind) -> bool {
    matches!(
        (filter, kind),
        (ColumnFilter::Text { .. }, _)
            | (ColumnFilter::Number { .. }, FilterKind::Number)
            | (ColumnFilter::Date { .. }, FilterKind::Date)
            | (ColumnFilter::Discrete { .. }, FilterKind::Discrete(_))
    )
}

/// Detect the filter control kind for every column of the row model.
pub fn detect_filter_kinds(dataset: &Dataset) -> Vec<FilterKind> {
    (0..dataset.column_count())
        .map(|col| {
            let samples: Vec<&str> = dataset
                .column_values(col)
                .take(FILTER_SAMPLE_ROWS)
                .collect();
            if samples.iter().all(|s| s.trim().is_empty()) {
                return FilterKind::Text;
            }
            match classify_column(&samples) {
                ColumnKind::Number => FilterKind::Number,
                ColumnKind::Date => FilterKind::Date,
                ColumnKind::Text => FilterKind::Discrete(distinct_values(dataset, col)),
            }
        })
        .collect()
}

/// Distinct trimmed non-empty values of a column in first-seen order.
pub fn distinct_values(dataset: &Dataset, col: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    dataset
        .column_values(col)
        .map(str::trim)
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// One visibility flag per row: every predicate and every search token pass.
pub fn compute_visibility(dataset: &Dataset, state: &FilterState, search: &str) -> Vec<bool> {
    let tokens: Vec<String> = search
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    // A discrete selection covering the whole column is no predicate at all.
    let active: Vec<(usize, &ColumnFilter)> = state
        .filters
        .iter()
        .filter(|(col, filter)| match filter {
            ColumnFilter::Discrete { selected } => {
                !distinct_values(dataset, **col)
                    .iter()
                    .all(|v| selected.contains(v))
            }
            _ => true,
        })
        .map(|(col, filter)| (*col, filter))
        .collect();

    dataset
        .rows()
        .iter()
        .map(|row| {
            active.iter().all(|(col, filter)| {
                let cell = row.get(*col).map_or("", String::as_str);
                cell_matches(cell, filter)
            }) && row_matches_search(row, &tokens)
        })
        .collect()
}

fn row_matches_search(row: &[String], tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let text = row.join(" ").to_lowercase();
    tokens.iter().all(|t| text.contains(t.as_str()))
}

/// Evaluate one predicate against one cell.
pub fn cell_matches(cell: &str, filter: &ColumnFilter) -> bool {
    match filter {
        ColumnFilter::Text { needle } => cell.to_lowercase().contains(needle.as_str()),
        ColumnFilter::Discrete { selected } => selected.contains(cell.trim()),
        ColumnFilter::Number { op, v1, v2 } => {
            let Some(value) = parse_number(cell) else {
                return false;
            };
            number_matches(value, *op, v1, v2.as_deref())
        }
        ColumnFilter::Date { op, v1, v2 } => {
            let Some(value) = parse_date(cell) else {
                return false;
            };
            date_matches(value, *op, v1, v2.as_deref())
        }
    }
}

#[allow(clippy::float_cmp)]
fn number_matches(value: f64, op: NumberOp, v1: &str, v2: Option<&str>) -> bool {
    let Some(a) = parse_number(v1) else {
        return false;
    };
    match op {
        NumberOp::Equal => value == a,
        NumberOp::NotEqual => value != a,
        NumberOp::GreaterThan => value > a,
        NumberOp::GreaterOrEqual => value >= a,
        NumberOp::LessThan => value < a,
        NumberOp::LessOrEqual => value <= a,
        NumberOp::Between => {
            let Some(b) = v2.and_then(parse_number) else {
                return false;
            };
            let (lo, hi) = if a > b { (b, a) } else { (a, b) };
            value >= lo && value <= hi
        }
    }
}

fn date_matches(value: NaiveDate, op: DateOp, v1: &str, v2: Option<&str>) -> bool {
    let Some(a) = parse_date(v1) else {
        return false;
    };
    match op {
        DateOp::On => value == a,
        DateOp::Before => value < a,
        DateOp::After => value > a,
        DateOp::Between => {
            let Some(b) = v2.and_then(parse_date) else {
                return false;
            };
            let (lo, hi) = if a > b { (b, a) } else { (a, b) };
            value >= lo && value <= hi
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sales() -> Dataset {
        Dataset::from_strs(
            &["Region", "Revenue", "Closed"],
            &[
                &["East", "9.99", "2024-01-05"],
                &["East", "10", "2024-01-06"],
                &["West", "20", "2024-02-01"],
                &["West", "20.01", "n/a"],
                &["North", "abc", "2024-03-01"],
            ],
        )
        .unwrap()
    }

    fn number(op: NumberOp, v1: &str, v2: Option<&str>) -> ColumnFilter {
        ColumnFilter::Number {
            op,
            v1: v1.to_string(),
            v2: v2.map(str::to_string),
        }
    }

    #[test]
    fn test_between_is_inclusive() {
        let mut state = FilterState::new();
        state.set_filter(1, number(NumberOp::Between, "10", Some("20")));
        let vis = compute_visibility(&sales(), &state, "");
        assert_eq!(vis, vec![false, true, true, false, false]);
    }

    #[test]
    fn test_between_swaps_bounds() {
        let mut state = FilterState::new();
        state.set_filter(1, number(NumberOp::Between, "20", Some("10")));
        let vis = compute_visibility(&sales(), &state, "");
        assert_eq!(vis, vec![false, true, true, false, false]);
    }

    #[test_case(NumberOp::Equal, "10", &[false, true, false, false, false]; "eq")]
    #[test_case(NumberOp::NotEqual, "10", &[true, false, true, true, false]; "ne excludes unparseable")]
    #[test_case(NumberOp::GreaterThan, "10", &[false, false, true, true, false]; "gt")]
    #[test_case(NumberOp::GreaterOrEqual, "20", &[false, false, true, true, false]; "ge")]
    #[test_case(NumberOp::LessThan, "10", &[true, false, false, false, false]; "lt")]
    #[test_case(NumberOp::LessOrEqual, "10", &[true, true, false, false, false]; "le")]
    fn test_number_ops(op: NumberOp, v1: &str, expected: &[bool]) {
        let mut state = FilterState::new();
        state.set_filter(1, number(op, v1, None));
        assert_eq!(compute_visibility(&sales(), &state, ""), expected);
    }

    #[test]
    fn test_unparseable_operand_excludes_all() {
        let mut state = FilterState::new();
        state.set_filter(1, number(NumberOp::GreaterThan, "lots", None));
        assert!(compute_visibility(&sales(), &state, "")
            .iter()
            .all(|v| !v));
    }

    #[test]
    fn test_date_filters() {
        let mut state = FilterState::new();
        state.set_filter(
            2,
            ColumnFilter::Date {
                op: DateOp::On,
                v1: "1/6/2024".into(),
                v2: None,
            },
        );
        assert_eq!(
            compute_visibility(&sales(), &state, ""),
            vec![false, true, false, false, false]
        );

        state.set_filter(
            2,
            ColumnFilter::Date {
                op: DateOp::Between,
                v1: "2024-02-01".into(),
                v2: Some("2024-01-06".into()),
            },
        );
        assert_eq!(
            compute_visibility(&sales(), &state, ""),
            vec![false, true, true, false, false]
        );
    }

    #[test]
    fn test_search_tokens_and_case() {
        let state = FilterState::new();
        let vis = compute_visibility(&sales(), &state, "east  10");
        assert_eq!(vis, vec![false, true, false, false, false]);
        let vis = compute_visibility(&sales(), &state, "WEST");
        assert_eq!(vis, vec![false, false, true, true, false]);
    }

    #[test]
    fn test_text_filter_lowercases() {
        let mut state = FilterState::new();
        state.set_text(0, " NOR ");
        assert_eq!(
            compute_visibility(&sales(), &state, ""),
            vec![false, false, false, false, true]
        );
    }

    #[test]
    fn test_empty_values_delete_entry() {
        let mut state = FilterState::new();
        state.set_text(0, "east");
        assert!(state.get(0).is_some());
        state.set_text(0, "  ");
        assert!(state.get(0).is_none());

        state.set_filter(1, number(NumberOp::Equal, "", None));
        assert!(state.get(1).is_none());
        assert!(!state.is_active());
    }

    #[test]
    fn test_discrete_full_selection_deletes_entry() {
        let ds = sales();
        let all = distinct_values(&ds, 0);
        assert_eq!(all, vec!["East", "West", "North"]);

        let mut state = FilterState::new();
        let some: BTreeSet<String> = ["East".to_string()].into_iter().collect();
        state.set_discrete(0, some, &all);
        assert!(state.get(0).is_some());

        let every: BTreeSet<String> = all.iter().cloned().collect();
        state.set_discrete(0, every, &all);
        assert!(state.get(0).is_none());

        state.set_discrete(0, BTreeSet::new(), &all);
        assert!(state.get(0).is_none());
    }

    #[test]
    fn test_detect_filter_kinds() {
        let kinds = detect_filter_kinds(&sales());
        assert_eq!(
            kinds[0],
            FilterKind::Discrete(vec!["East".into(), "West".into(), "North".into()])
        );
        assert_eq!(kinds[1], FilterKind::Number);
        assert_eq!(kinds[2], FilterKind::Date);
    }

    #[test]
    fn test_remap_follows_names_and_prunes() {
        let mut state = FilterState::new();
        state.set_text(0, "east");
        state.set_filter(1, number(NumberOp::GreaterThan, "5", None));
        let old = vec!["Region".to_string(), "Revenue".to_string()];
        let new = vec!["Revenue".to_string(), "Other".to_string()];
        state.remap(
            &old,
            &new,
            &[FilterKind::Number, FilterKind::Discrete(Vec::new())],
        );
        assert!(state.get(0).is_some());
        assert!(state.get(1).is_none());
        assert!(matches!(state.get(0), Some(ColumnFilter::Number { .. })));
    }
}
