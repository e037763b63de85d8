//! Columns menu: show and hide columns by name.
//!
//! Hidden measure columns stay in the table with hidden cells. Hidden
//! dimension columns are removed before rendering (see
//! [`crate::projection`]), so they never reach [`ColumnsController::reapply`].

use std::collections::BTreeSet;

use super::TableController;
use crate::render::{RenderedTable, SlotRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnsController {
    hidden: BTreeSet<String>,
}

impl ColumnsController {
    pub fn new(hidden: BTreeSet<String>) -> Self {
        Self { hidden }
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn is_hidden(&self, column: &str) -> bool {
        self.hidden.contains(column)
    }

    /// Returns true if the hidden set changed.
    pub fn set_hidden(&mut self, column: &str, hidden: bool) -> bool {
        if hidden {
            self.hidden.insert(column.to_string())
        } else {
            self.hidden.remove(column)
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }
}

/// Shrink spanning header cells to the slots still visible, moving a label
/// whose own slot is hidden to the first visible slot it covers.
fn fix_spans(table: &mut RenderedTable) {
    let hidden_slots: Vec<bool> = table.slots.iter().map(|s| s.hidden).collect();
    for row in &mut table.header {
        for start in 0..row.cells.len() {
            let span = match row.cells.get(start) {
                Some(cell) if cell.span > 1 => cell.span,
                _ => continue,
            };
            let end = (start + span).min(row.cells.len());
            let visible: Vec<usize> = (start..end)
                .filter(|&i| !hidden_slots.get(i).copied().unwrap_or(false))
                .collect();
            let Some(&first) = visible.first() else {
                if let Some(cell) = row.cells.get_mut(start) {
                    cell.hidden = true;
                }
                continue;
            };
            if first == start {
                if let Some(cell) = row.cells.get_mut(start) {
                    cell.colspan = visible.len();
                }
                continue;
            }
            let Some(source) = row.cells.get_mut(start) else {
                continue;
            };
            let text = std::mem::take(&mut source.text);
            let attrs = std::mem::take(&mut source.attrs);
            source.hidden = true;
            source.span = 1;
            source.colspan = 1;
            if let Some(target) = row.cells.get_mut(first) {
                target.text = text;
                target.attrs = attrs;
                target.hidden = false;
                target.span = end - first;
                target.colspan = visible.len();
            }
        }
    }
}

impl TableController for ColumnsController {
    fn name(&self) -> &'static str {
        "columns"
    }

    fn reapply(&self, table: &mut RenderedTable) {
        if self.hidden.is_empty() {
            return;
        }
        let targets: Vec<usize> = table
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role == SlotRole::Data && self.hidden.contains(&s.name))
            .map(|(i, _)| i)
            .collect();
        for &slot in &targets {
            if let Some(info) = table.slots.get_mut(slot) {
                info.hidden = true;
            }
            for cell in table.slot_cells_mut(slot) {
                cell.hidden = true;
            }
        }
        fix_spans(table);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::measure_grouping::MeasureGroupingModel;
    use crate::pivot::PivotGroupingModel;
    use crate::render::build_structure;
    use crate::types::Dataset;

    fn table() -> RenderedTable {
        let view = Dataset::from_strs(&["Fee", "Spread", "Tax"], &[&["1", "2", "3"]]).unwrap();
        let mut groups = MeasureGroupingModel::new();
        groups.add_group("G", vec!["Fee".into(), "Spread".into(), "Tax".into()], false);
        build_structure(&view, &[], &PivotGroupingModel::new(), &groups)
    }

    #[test]
    fn test_hidden_member_shrinks_group_span() {
        let mut t = table();
        let mut c = ColumnsController::default();
        c.set_hidden("Spread", true);
        c.reapply(&mut t);
        let label = &t.header[0].cells[1];
        assert_eq!(label.span, 3);
        assert_eq!(label.colspan, 2);
        assert!(t.body[0].cells[2].hidden);
        assert!(t.slots[2].hidden);
    }

    #[test]
    fn test_hidden_lead_moves_label() {
        let mut t = table();
        let mut c = ColumnsController::default();
        c.set_hidden("Fee", true);
        c.reapply(&mut t);
        assert!(t.header[0].cells[1].hidden);
        let moved = &t.header[0].cells[2];
        assert_eq!(moved.text, "G");
        assert!(!moved.hidden);
        assert_eq!(moved.colspan, 2);
        assert_eq!(moved.attr("data-group-index"), Some("0"));
    }

    #[test]
    fn test_hiding_every_member_hides_label() {
        let mut t = table();
        let mut c = ColumnsController::default();
        for name in ["Fee", "Spread", "Tax"] {
            c.set_hidden(name, true);
        }
        c.reapply(&mut t);
        assert!(t.header[0].cells.iter().skip(1).all(|cell| cell.hidden));
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let mut once = table();
        let mut twice = table();
        let mut c = ColumnsController::default();
        c.set_hidden("Tax", true);
        c.reapply(&mut once);
        c.reapply(&mut twice);
        c.reapply(&mut twice);
        assert_eq!(once, twice);
    }
}
