//! Column widths.

use std::collections::BTreeMap;

use super::TableController;
use crate::render::RenderedTable;

/// Narrowest width a drag can produce, in pixels.
pub const MIN_COLUMN_WIDTH: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResizeController {
    widths: BTreeMap<String, u32>,
}

impl ResizeController {
    pub fn new(widths: BTreeMap<String, u32>) -> Self {
        Self { widths }
    }

    pub fn widths(&self) -> &BTreeMap<String, u32> {
        &self.widths
    }

    pub fn width(&self, column: &str) -> Option<u32> {
        self.widths.get(column).copied()
    }

    /// Store a width, clamped to [`MIN_COLUMN_WIDTH`]. Returns the stored value.
    pub fn set_width(&mut self, column: &str, px: u32) -> u32 {
        let px = px.max(MIN_COLUMN_WIDTH);
        self.widths.insert(column.to_string(), px);
        px
    }

    pub fn clear_width(&mut self, column: &str) {
        self.widths.remove(column);
    }

    pub fn reset(&mut self) {
        self.widths.clear();
    }
}

impl TableController for ResizeController {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn reapply(&self, table: &mut RenderedTable) {
        let sized: Vec<(usize, u32)> = table
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| self.width(&s.name).map(|w| (i, w)))
            .collect();
        if sized.is_empty() {
            return;
        }
        table.style.set("table-layout", "fixed");
        let Some(header) = table.column_header_mut() else {
            return;
        };
        for (slot, width) in sized {
            if let Some(cell) = header.cells.get_mut(slot) {
                cell.style.set("width", format!("{width}px"));
                cell.style.set("min-width", format!("{MIN_COLUMN_WIDTH}px"));
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

    #[test]
    fn test_minimum_width() {
        let mut r = ResizeController::default();
        assert_eq!(r.set_width("A", 10), MIN_COLUMN_WIDTH);
        assert_eq!(r.set_width("A", 180), 180);
        assert_eq!(r.width("A"), Some(180));
    }

    #[test]
    fn test_reapply_sets_header_width() {
        let view = Dataset::from_strs(&["A", "B"], &[&["1", "2"]]).unwrap();
        let mut t = build_structure(
            &view,
            &[],
            &PivotGroupingModel::new(),
            &MeasureGroupingModel::new(),
        );
        let mut r = ResizeController::default();
        r.set_width("B", 140);
        r.reapply(&mut t);
        assert_eq!(t.header[1].cells[2].style.get("width"), Some("140px"));
        assert_eq!(t.style.get("table-layout"), Some("fixed"));
        assert!(t.header[1].cells[1].style.get("width").is_none());
    }
}
