//! Hierarchical row grouping by up to three leading dimension columns.
//!
//! Each category (level 0) and each `category|subCategory` pair (level 1)
//! carries its own collapsed flag. A key with no entry uses the model's
//! default, which is collapsed.
//!
//! Keys escape `\` and `|` inside values, so `East|North` as a sub key is
//! unambiguous even when a value contains a pipe.

use std::collections::HashMap;

use crate::types::{Dataset, PivotLevel, PivotStatePairs};
use crate::value_parser::parse_number;

/// Leading columns examined when classifying dimensions.
pub const MAX_FIELDS_PER_COLUMN: usize = 5;
/// Rows sampled per column when classifying dimensions.
pub const DIMENSION_SAMPLE_ROWS: usize = 5;
pub const MAX_HIERARCHY_DEPTH: usize = 3;
/// Label for empty sub-category and segment values.
pub const OTHER_LABEL: &str = "Other";
/// Indentation per hierarchy level.
pub const INDENT: &str = "\u{a0}\u{a0}\u{a0}\u{a0}";
pub const COLLAPSED_GLYPH: &str = "\u{25b6}";
pub const EXPANDED_GLYPH: &str = "\u{25bc}";

/// Rows sharing one value of a grouping column, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotGroup {
    pub value: String,
    pub rows: Vec<usize>,
}

/// Kind of a body row produced by [`PivotGroupingModel::build_rows`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotRowKind {
    Group(PivotLevel),
    /// Ungrouped dataset row (no leading dimension columns)
    Detail,
}

/// One body row to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub kind: PivotRowKind,
    /// Indented label with disclosure glyph
    pub label: String,
    /// Bare group value; empty for detail rows
    pub value: String,
    /// Expansion key, present only for expandable rows
    pub key: Option<String>,
    pub collapsed: bool,
    /// Dataset rows aggregated into this row
    pub rows: Vec<usize>,
}

impl PivotRow {
    pub fn depth(&self) -> usize {
        match self.kind {
            PivotRowKind::Group(level) => level.depth(),
            PivotRowKind::Detail => 0,
        }
    }
}

/// Insertion-ordered `key -> collapsed` map.
#[derive(Debug, Clone, Default, PartialEq)]
struct ExpansionMap {
    entries: Vec<(String, bool)>,
    index: HashMap<String, usize>,
}

impl ExpansionMap {
    fn get(&self, key: &str) -> Option<bool> {
        self.index
            .get(key)
            .and_then(|&i| self.entries.get(i))
            .map(|(_, c)| *c)
    }

    fn set(&mut self, key: &str, collapsed: bool) {
        if let Some(entry) = self
            .index
            .get(key)
            .copied()
            .and_then(|i| self.entries.get_mut(i))
        {
            entry.1 = collapsed;
            return;
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push((key.to_string(), collapsed));
    }

    fn set_all(&mut self, collapsed: bool) {
        for entry in &mut self.entries {
            entry.1 = collapsed;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Expansion state for the pivot hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotGroupingModel {
    row_groups: ExpansionMap,
    sub_category_groups: ExpansionMap,
    default_collapsed: bool,
    column_signature: Option<Vec<String>>,
}

impl Default for PivotGroupingModel {
    fn default() -> Self {
        Self {
            row_groups: ExpansionMap::default(),
            sub_category_groups: ExpansionMap::default(),
            default_collapsed: true,
            column_signature: None,
        }
    }
}

/// Escape a value for use inside an expansion key.
pub fn escape_key(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

/// Key of a level-0 group.
pub fn category_key(category: &str) -> String {
    escape_key(category)
}

/// Key of a level-1 group.
pub fn sub_category_key(category: &str, sub_category: &str) -> String {
    format!("{}|{}", escape_key(category), escape_key(sub_category))
}

/// True if the key contains a separator that is not escaped.
fn is_sub_key(key: &str) -> bool {
    let mut escaped = false;
    for ch in key.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '|' => return true,
            _ => {}
        }
    }
    false
}

impl PivotGroupingModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapsed flag used for keys that have never been toggled.
    pub fn default_collapsed(&self) -> bool {
        self.default_collapsed
    }

    pub fn is_category_collapsed(&self, category: &str) -> bool {
        self.is_key_collapsed(&category_key(category))
    }

    pub fn is_sub_category_collapsed(&self, category: &str, sub_category: &str) -> bool {
        self.is_key_collapsed(&sub_category_key(category, sub_category))
    }

    pub fn is_key_collapsed(&self, key: &str) -> bool {
        let map = if is_sub_key(key) {
            &self.sub_category_groups
        } else {
            &self.row_groups
        };
        map.get(key).unwrap_or(self.default_collapsed)
    }

    /// Flip one key and return its new collapsed state.
    pub fn toggle_key(&mut self, key: &str) -> bool {
        let collapsed = !self.is_key_collapsed(key);
        if is_sub_key(key) {
            self.sub_category_groups.set(key, collapsed);
        } else {
            self.row_groups.set(key, collapsed);
        }
        collapsed
    }

    pub fn toggle_category(&mut self, category: &str) -> bool {
        self.toggle_key(&category_key(category))
    }

    pub fn toggle_sub_category(&mut self, category: &str, sub_category: &str) -> bool {
        self.toggle_key(&sub_category_key(category, sub_category))
    }

    /// Expand every expandable group of `dataset`.
    pub fn expand_all(&mut self, dataset: &Dataset, hierarchy: &[usize]) {
        self.set_all(dataset, hierarchy, false);
    }

    /// Collapse every expandable group of `dataset`.
    pub fn collapse_all(&mut self, dataset: &Dataset, hierarchy: &[usize]) {
        self.set_all(dataset, hierarchy, true);
    }

    fn set_all(&mut self, dataset: &Dataset, hierarchy: &[usize], collapsed: bool) {
        self.row_groups.set_all(collapsed);
        self.sub_category_groups.set_all(collapsed);
        if hierarchy.len() < 2 {
            return;
        }
        for category in group_by_category(dataset, hierarchy) {
            self.row_groups.set(&category_key(&category.value), collapsed);
            if hierarchy.len() < 3 {
                continue;
            }
            for sub in group_by_sub_category(dataset, hierarchy, &category) {
                self.sub_category_groups
                    .set(&sub_category_key(&category.value, &sub.value), collapsed);
            }
        }
    }

    pub fn clear(&mut self) {
        self.row_groups.clear();
        self.sub_category_groups.clear();
    }

    /// Number of keys with explicit state.
    pub fn known_keys(&self) -> usize {
        self.row_groups.len() + self.sub_category_groups.len()
    }

    /// Reset expansion state when the column set changes shape.
    ///
    /// Returns true if state was reset. The first dataset seen after
    /// construction or a restore never resets.
    pub fn observe_columns(&mut self, columns: &[String]) -> bool {
        let changed = self
            .column_signature
            .as_deref()
            .is_some_and(|sig| sig != columns);
        if changed {
            log::info!("column set changed, resetting pivot expansion state");
            self.clear();
        }
        self.column_signature = Some(columns.to_vec());
        changed
    }

    /// Expansion state as `[key, collapsed]` pairs: categories, then sub-categories.
    pub fn expansion_state(&self) -> PivotStatePairs {
        self.row_groups
            .entries
            .iter()
            .chain(self.sub_category_groups.entries.iter())
            .cloned()
            .collect()
    }

    /// Replace the whole expansion state.
    pub fn restore_expansion_state(&mut self, pairs: &[(String, bool)]) {
        self.clear();
        for (key, collapsed) in pairs {
            if is_sub_key(key) {
                self.sub_category_groups.set(key, *collapsed);
            } else {
                self.row_groups.set(key, *collapsed);
            }
        }
        self.column_signature = None;
    }

    /// Walk the hierarchy, emitting rows for every expanded path.
    ///
    /// Sub-groups are only computed below expanded parents.
    pub fn build_rows(&self, dataset: &Dataset, hierarchy: &[usize]) -> Vec<PivotRow> {
        if hierarchy.is_empty() {
            return (0..dataset.row_count())
                .map(|i| PivotRow {
                    kind: PivotRowKind::Detail,
                    label: String::new(),
                    value: String::new(),
                    key: None,
                    collapsed: false,
                    rows: vec![i],
                })
                .collect();
        }

        let depth = hierarchy.len();
        let mut out = Vec::new();
        for category in group_by_category(dataset, hierarchy) {
            let key = category_key(&category.value);
            let expandable = depth > 1;
            let collapsed = expandable && self.is_key_collapsed(&key);
            out.push(self.group_row(
                PivotLevel::Category,
                &category,
                expandable.then_some(key),
                collapsed,
            ));
            if !expandable || collapsed {
                continue;
            }

            for sub in group_by_sub_category(dataset, hierarchy, &category) {
                let key = sub_category_key(&category.value, &sub.value);
                let expandable = depth > 2;
                let collapsed = expandable && self.is_key_collapsed(&key);
                out.push(self.group_row(
                    PivotLevel::SubCategory,
                    &sub,
                    expandable.then_some(key),
                    collapsed,
                ));
                if !expandable || collapsed {
                    continue;
                }

                for segment in group_by_segment(dataset, hierarchy, &sub) {
                    out.push(self.group_row(PivotLevel::Segment, &segment, None, false));
                }
            }
        }
        out
    }

    fn group_row(
        &self,
        level: PivotLevel,
        group: &PivotGroup,
        key: Option<String>,
        collapsed: bool,
    ) -> PivotRow {
        let mut label = INDENT.repeat(level.depth());
        if key.is_some() {
            label.push_str(if collapsed {
                COLLAPSED_GLYPH
            } else {
                EXPANDED_GLYPH
            });
            label.push(' ');
        }
        label.push_str(&group.value);
        PivotRow {
            kind: PivotRowKind::Group(level),
            label,
            value: group.value.clone(),
            key,
            collapsed,
            rows: group.rows.clone(),
        }
    }
}

/// A column is a dimension when more than half of its sampled non-empty
/// values fail numeric parsing. A column with no samples is a dimension.
fn is_dimension_column(dataset: &Dataset, col: usize) -> bool {
    let samples: Vec<&str> = dataset
        .column_values(col)
        .take(DIMENSION_SAMPLE_ROWS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if samples.is_empty() {
        return true;
    }
    let failures = samples.iter().filter(|s| parse_number(s).is_none()).count();
    failures * 2 > samples.len()
}

/// Indices of dimension columns among the first [`MAX_FIELDS_PER_COLUMN`].
pub fn classify_dimension_columns(dataset: &Dataset) -> Vec<usize> {
    (0..dataset.column_count().min(MAX_FIELDS_PER_COLUMN))
        .filter(|&col| is_dimension_column(dataset, col))
        .collect()
}

/// The leading contiguous run of dimension columns, at most three deep.
pub fn hierarchy_columns(dataset: &Dataset) -> Vec<usize> {
    let dims = classify_dimension_columns(dataset);
    dims.iter()
        .enumerate()
        .take_while(|(pos, col)| pos == *col)
        .map(|(_, col)| *col)
        .take(MAX_HIERARCHY_DEPTH)
        .collect()
}

fn group_rows(
    dataset: &Dataset,
    rows: impl Iterator<Item = usize>,
    col: usize,
    empty_label: Option<&str>,
) -> Vec<PivotGroup> {
    let mut groups: Vec<PivotGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let raw = dataset.cell(row, col);
        let value = match empty_label {
            Some(label) if raw.trim().is_empty() => label.to_string(),
            _ => raw.to_string(),
        };
        match index.get(&value).and_then(|&i| groups.get_mut(i)) {
            Some(group) => group.rows.push(row),
            None => {
                index.insert(value.clone(), groups.len());
                groups.push(PivotGroup {
                    value,
                    rows: vec![row],
                });
            }
        }
    }
    groups
}

/// Level-0 groups by the first hierarchy column.
pub fn group_by_category(dataset: &Dataset, hierarchy: &[usize]) -> Vec<PivotGroup> {
    match hierarchy.first() {
        Some(&col) => group_rows(dataset, 0..dataset.row_count(), col, None),
        None => Vec::new(),
    }
}

/// Level-1 groups within one category.
pub fn group_by_sub_category(
    dataset: &Dataset,
    hierarchy: &[usize],
    category: &PivotGroup,
) -> Vec<PivotGroup> {
    match hierarchy.get(1) {
        Some(&col) => group_rows(
            dataset,
            category.rows.iter().copied(),
            col,
            Some(OTHER_LABEL),
        ),
        None => Vec::new(),
    }
}

/// Level-2 groups within one sub-category.
pub fn group_by_segment(
    dataset: &Dataset,
    hierarchy: &[usize],
    sub_category: &PivotGroup,
) -> Vec<PivotGroup> {
    match hierarchy.get(2) {
        Some(&col) => group_rows(
            dataset,
            sub_category.rows.iter().copied(),
            col,
            Some(OTHER_LABEL),
        ),
        None => Vec::new(),
    }
}

/// Per-column sums over `rows`. `None` where no cell parses.
pub fn aggregate(dataset: &Dataset, rows: &[usize]) -> Vec<Option<f64>> {
    (0..dataset.column_count())
        .map(|col| {
            rows.iter()
                .filter_map(|&r| parse_number(dataset.cell(r, col)))
                .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
        })
        .collect()
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

    fn sales() -> Dataset {
        Dataset::from_strs(
            &["Region", "Rep", "Revenue"],
            &[
                &["East", "Alice", "100"],
                &["East", "Bob", "200"],
                &["West", "Carl", "50"],
            ],
        )
        .unwrap()
    }

    fn three_level() -> Dataset {
        Dataset::from_strs(
            &["Region", "Rep", "Segment", "Revenue", "Units"],
            &[
                &["East", "Alice", "Retail", "100", "1"],
                &["East", "Alice", "", "10", "2"],
                &["East", "", "Retail", "5", "x"],
                &["West", "Carl", "Online", "50", "3"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_hierarchy_detection() {
        assert_eq!(hierarchy_columns(&sales()), vec![0, 1]);
        assert_eq!(hierarchy_columns(&three_level()), vec![0, 1, 2]);

        let numeric_first = Dataset::from_strs(&["Id", "Name"], &[&["1", "a"]]).unwrap();
        assert_eq!(classify_dimension_columns(&numeric_first), vec![1]);
        assert!(hierarchy_columns(&numeric_first).is_empty());
    }

    #[test]
    fn test_hierarchy_capped_at_three() {
        let ds = Dataset::from_strs(
            &["A", "B", "C", "D", "V"],
            &[&["a", "b", "c", "d", "1"]],
        )
        .unwrap();
        assert_eq!(classify_dimension_columns(&ds), vec![0, 1, 2, 3]);
        assert_eq!(hierarchy_columns(&ds), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_column_is_dimension() {
        let ds = Dataset::from_strs(&["A", "V"], &[&["", "1"], &["", "2"]]).unwrap();
        assert_eq!(classify_dimension_columns(&ds), vec![0]);
    }

    #[test]
    fn test_default_collapsed_shows_categories_only() {
        let ds = sales();
        let h = hierarchy_columns(&ds);
        let model = PivotGroupingModel::new();
        let rows = model.build_rows(&ds, &h);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "\u{25b6} East");
        assert_eq!(rows[0].rows, vec![0, 1]);
        assert_eq!(rows[1].label, "\u{25b6} West");
        assert!(rows[0].collapsed);
    }

    #[test]
    fn test_expand_reveals_sub_rows() {
        let ds = sales();
        let h = hierarchy_columns(&ds);
        let mut model = PivotGroupingModel::new();
        assert!(!model.toggle_category("East"));
        let rows = model.build_rows(&ds, &h);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "\u{25bc} East",
                "\u{a0}\u{a0}\u{a0}\u{a0}Alice",
                "\u{a0}\u{a0}\u{a0}\u{a0}Bob",
                "\u{25b6} West"
            ]
        );
        // Leaf sub rows are not expandable
        assert!(rows[1].key.is_none());
    }

    #[test]
    fn test_three_levels_and_other_label() {
        let ds = three_level();
        let h = hierarchy_columns(&ds);
        let mut model = PivotGroupingModel::new();
        model.toggle_category("East");
        model.toggle_sub_category("East", "Alice");
        let rows = model.build_rows(&ds, &h);
        let labels: Vec<String> = rows.iter().map(|r| r.label.replace('\u{a0}', "_")).collect();
        assert_eq!(
            labels,
            vec![
                "\u{25bc} East",
                "____\u{25bc} Alice",
                "________Retail",
                "________Other",
                "____\u{25b6} Other",
                "\u{25b6} West",
            ]
        );
        assert_eq!(rows[4].key.as_deref(), Some("East|Other"));
    }

    #[test]
    fn test_single_dimension_rows_not_expandable() {
        let ds = Dataset::from_strs(&["Region", "V"], &[&["East", "1"], &["East", "2"]]).unwrap();
        let h = hierarchy_columns(&ds);
        let rows = PivotGroupingModel::new().build_rows(&ds, &h);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "East");
        assert!(rows[0].key.is_none());
    }

    #[test]
    fn test_no_hierarchy_gives_detail_rows() {
        let ds = Dataset::from_strs(&["V", "W"], &[&["1", "2"], &["3", "4"]]).unwrap();
        let rows = PivotGroupingModel::new().build_rows(&ds, &[]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.kind == PivotRowKind::Detail));
    }

    #[test]
    fn test_aggregate_blank_for_text() {
        let ds = three_level();
        let sums = aggregate(&ds, &[0, 1, 2]);
        assert_eq!(sums[0], None);
        assert_eq!(sums[3], Some(115.0));
        assert_eq!(sums[4], Some(3.0));
    }

    #[test]
    fn test_key_escaping() {
        assert_eq!(sub_category_key("A|B", "C"), "A\\|B|C");
        assert!(is_sub_key(&sub_category_key("A|B", "C")));
        assert!(!is_sub_key(&category_key("A|B")));
        assert!(!is_sub_key(&category_key("A\\")));
        assert!(is_sub_key(&sub_category_key("A\\", "B")));

        let mut model = PivotGroupingModel::new();
        model.toggle_category("A|B");
        assert!(!model.is_category_collapsed("A|B"));
        assert!(model.is_sub_category_collapsed("A", "B"));
    }

    #[test]
    fn test_state_round_trip_replaces() {
        let mut model = PivotGroupingModel::new();
        model.toggle_category("East");
        model.toggle_sub_category("East", "Alice");
        model.toggle_category("West");
        model.toggle_category("West");
        let pairs = model.expansion_state();
        assert_eq!(
            pairs,
            vec![
                ("East".to_string(), false),
                ("West".to_string(), true),
                ("East|Alice".to_string(), false),
            ]
        );

        let mut other = PivotGroupingModel::new();
        other.toggle_category("North");
        other.restore_expansion_state(&pairs);
        assert_eq!(other.expansion_state(), pairs);
        assert!(other.is_category_collapsed("North"));
    }

    #[test]
    fn test_expand_all_and_collapse_all() {
        let ds = three_level();
        let h = hierarchy_columns(&ds);
        let mut model = PivotGroupingModel::new();
        model.expand_all(&ds, &h);
        // East, Alice, Retail, Other, Other, Retail, West, Carl, Online
        assert_eq!(model.build_rows(&ds, &h).len(), 9);
        model.collapse_all(&ds, &h);
        assert_eq!(model.build_rows(&ds, &h).len(), 2);
    }

    #[test]
    fn test_observe_columns_resets_on_shape_change() {
        let mut model = PivotGroupingModel::new();
        let cols = vec!["A".to_string(), "B".to_string()];
        assert!(!model.observe_columns(&cols));
        model.toggle_category("x");
        assert!(!model.observe_columns(&cols));
        assert_eq!(model.known_keys(), 1);
        assert!(model.observe_columns(&["A".to_string()]));
        assert_eq!(model.known_keys(), 0);
    }
}
