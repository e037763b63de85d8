//! Leading `#` column numbering the visible body rows.

use super::TableController;
use crate::render::{RenderedTable, SlotRole, ROW_NUMBER_HEADER};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowNumberController {
    enabled: bool,
}

impl RowNumberController {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl TableController for RowNumberController {
    fn name(&self) -> &'static str {
        "row_numbers"
    }

    /// Show or hide the slot and renumber rows left visible by the last
    /// visibility pass.
    fn reapply(&self, table: &mut RenderedTable) {
        let Some(slot) = table
            .slots
            .iter()
            .position(|s| s.role == SlotRole::RowNumber)
        else {
            return;
        };
        let hidden = !self.enabled;
        if let Some(info) = table.slots.get_mut(slot) {
            info.hidden = hidden;
        }
        for (i, row) in table.header.iter_mut().enumerate() {
            if let Some(cell) = row.cells.get_mut(slot) {
                cell.hidden = hidden;
                cell.text = if i == 1 {
                    ROW_NUMBER_HEADER.to_string()
                } else {
                    String::new()
                };
            }
        }
        let mut n = 0usize;
        for row in &mut table.body {
            let Some(cell) = row.cells.get_mut(slot) else {
                continue;
            };
            cell.hidden = hidden;
            if row.hidden {
                cell.text.clear();
            } else {
                n += 1;
                cell.text = n.to_string();
            }
        }
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
        let view = Dataset::from_strs(&["V"], &[&["1"], &["2"], &["3"]]).unwrap();
        build_structure(
            &view,
            &[],
            &PivotGroupingModel::new(),
            &MeasureGroupingModel::new(),
        )
    }

    #[test]
    fn test_numbers_visible_rows_only() {
        let mut t = table();
        t.apply_visibility(&[true, false, true]);
        RowNumberController::new(true).reapply(&mut t);
        let numbers: Vec<&str> = t.body.iter().map(|r| r.cells[0].text.as_str()).collect();
        assert_eq!(numbers, vec!["1", "", "2"]);
        assert!(!t.slots[0].hidden);
        assert_eq!(t.header[1].cells[0].text, "#");
    }

    #[test]
    fn test_disabled_hides_slot() {
        let mut t = table();
        RowNumberController::new(false).reapply(&mut t);
        assert!(t.slots[0].hidden);
        assert!(t.body.iter().all(|r| r.cells[0].hidden));
        assert!(t.header.iter().all(|r| r.cells[0].hidden));
    }
}
