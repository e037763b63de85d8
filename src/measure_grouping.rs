//! Named, collapsible bundles of measure columns.

use crate::types::MeasureGroup;
use crate::value_parser::parse_number;

/// Ordered list of measure groups; a column belongs to at most one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureGroupingModel {
    groups: Vec<MeasureGroup>,
}

impl MeasureGroupingModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[MeasureGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append a group. Its measures are taken out of any earlier group,
    /// and groups left without measures are dropped.
    pub fn add_group(&mut self, name: &str, measures: Vec<String>, collapsed: bool) {
        let mut unique: Vec<String> = Vec::with_capacity(measures.len());
        for m in measures {
            if !unique.contains(&m) {
                unique.push(m);
            }
        }
        for group in &mut self.groups {
            group.measures.retain(|m| !unique.contains(m));
        }
        self.groups.retain(|g| !g.measures.is_empty());
        self.groups
            .push(MeasureGroup::new(name, unique, collapsed));
    }

    pub fn remove_group(&mut self, index: usize) -> Option<MeasureGroup> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    /// Flip a group's collapsed flag and return the new state.
    pub fn toggle_group(&mut self, index: usize) -> Option<bool> {
        let group = self.groups.get_mut(index)?;
        group.collapsed = !group.collapsed;
        Some(group.collapsed)
    }

    pub fn set_all_collapsed(&mut self, collapsed: bool) {
        for group in &mut self.groups {
            group.collapsed = collapsed;
        }
    }

    pub fn find_group_by_measure(&self, column: &str) -> Option<(usize, &MeasureGroup)> {
        self.groups
            .iter()
            .enumerate()
            .find(|(_, g)| g.contains(column))
    }

    /// Sum of a group's measures for one row; unparseable cells count as 0.
    pub fn group_sum(group: &MeasureGroup, row: &[String], columns: &[String]) -> f64 {
        group
            .measures
            .iter()
            .filter_map(|m| columns.iter().position(|c| c == m))
            .filter_map(|idx| row.get(idx))
            .map(|cell| parse_number(cell).unwrap_or(0.0))
            .sum()
    }

    /// Header span: 1 when collapsed, otherwise the member count.
    pub fn column_span(group: &MeasureGroup) -> usize {
        if group.collapsed {
            1
        } else {
            group.measures.len()
        }
    }

    /// True for every member of a collapsed group except its lead.
    pub fn is_column_hidden(&self, column: &str) -> bool {
        self.find_group_by_measure(column)
            .is_some_and(|(_, g)| g.collapsed && g.lead() != Some(column))
    }

    /// Reorder `columns` so each group's members directly follow its lead,
    /// in group order. Members absent from `columns` are skipped.
    pub fn cluster_columns(&self, columns: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(columns.len());
        for column in columns {
            if out.contains(column) {
                continue;
            }
            match self.find_group_by_measure(column) {
                Some((_, group)) => {
                    for member in &group.measures {
                        if columns.contains(member) && !out.contains(member) {
                            out.push(member.clone());
                        }
                    }
                }
                None => out.push(column.clone()),
            }
        }
        out
    }

    /// Replace the whole group list, enforcing single membership.
    pub fn replace_groups(&mut self, groups: Vec<MeasureGroup>) {
        self.groups.clear();
        for g in groups {
            self.add_group(&g.name, g.measures, g.collapsed);
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

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_add_and_toggle() {
        let mut model = MeasureGroupingModel::new();
        model.add_group("Commission", names(&["Fee", "Spread"]), false);
        assert_eq!(model.toggle_group(0), Some(true));
        assert_eq!(model.toggle_group(0), Some(false));
        assert_eq!(model.toggle_group(3), None);
    }

    #[test]
    fn test_single_membership() {
        let mut model = MeasureGroupingModel::new();
        model.add_group("A", names(&["x", "y"]), false);
        model.add_group("B", names(&["y", "z"]), false);
        assert_eq!(model.groups()[0].measures, names(&["x"]));
        assert_eq!(model.find_group_by_measure("y").unwrap().1.name, "B");

        model.add_group("C", names(&["x"]), false);
        assert_eq!(model.groups().len(), 2);
        assert_eq!(model.groups()[0].name, "B");
    }

    #[test]
    fn test_single_measure_group_allowed() {
        let mut model = MeasureGroupingModel::new();
        model.add_group("Solo", names(&["x"]), false);
        assert_eq!(model.groups().len(), 1);
        assert!(!model.groups()[0].is_valid());
    }

    #[test]
    fn test_group_sum_treats_unparseable_as_zero() {
        let group = MeasureGroup::new("G", names(&["Fee", "Spread", "Missing"]), true);
        let columns = names(&["Name", "Fee", "Spread"]);
        let row = names(&["a", "10", "n/a"]);
        assert_eq!(MeasureGroupingModel::group_sum(&group, &row, &columns), 10.0);
        let row = names(&["a", "10", "5"]);
        assert_eq!(MeasureGroupingModel::group_sum(&group, &row, &columns), 15.0);
    }

    #[test]
    fn test_span_and_hidden() {
        let mut model = MeasureGroupingModel::new();
        model.add_group("G", names(&["Fee", "Spread"]), true);
        let g = &model.groups()[0];
        assert_eq!(MeasureGroupingModel::column_span(g), 1);
        assert!(!model.is_column_hidden("Fee"));
        assert!(model.is_column_hidden("Spread"));
        assert!(!model.is_column_hidden("Other"));

        model.toggle_group(0);
        assert_eq!(MeasureGroupingModel::column_span(&model.groups()[0]), 2);
        assert!(!model.is_column_hidden("Spread"));
    }

    #[test]
    fn test_cluster_columns() {
        let mut model = MeasureGroupingModel::new();
        model.add_group("G", names(&["c", "a"]), false);
        let out = model.cluster_columns(&names(&["a", "b", "c", "d"]));
        assert_eq!(out, names(&["c", "a", "b", "d"]));
    }
}
