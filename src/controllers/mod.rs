//! Interaction controllers layered on a freshly rendered table.
//!
//! Each controller keeps its preferences keyed by column name and re-stamps
//! them onto every new [`RenderedTable`]. They never add or remove cells.
//! [`Controllers::reapply_all`] runs them in a fixed order: columns
//! visibility, reorder, resize, alignment, row numbers.

mod alignment;
mod columns;
mod reorder;
mod resize;
mod row_numbers;

pub use alignment::{default_alignment, AlignmentController};
pub use columns::ColumnsController;
pub use reorder::ReorderController;
pub use resize::{ResizeController, MIN_COLUMN_WIDTH};
pub use row_numbers::RowNumberController;

use crate::render::RenderedTable;
use crate::types::ColumnLayoutState;

/// A post-render feature that can be re-applied idempotently.
pub trait TableController {
    fn name(&self) -> &'static str;

    /// Re-stamp stored preferences onto `table`.
    fn reapply(&self, table: &mut RenderedTable);
}

/// All controllers of one table instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controllers {
    pub columns: ColumnsController,
    pub reorder: ReorderController,
    pub resize: ResizeController,
    pub alignment: AlignmentController,
    pub row_numbers: RowNumberController,
}

impl Controllers {
    pub fn from_layout(layout: ColumnLayoutState) -> Self {
        Self {
            columns: ColumnsController::new(layout.hidden),
            reorder: ReorderController::new(layout.order),
            resize: ResizeController::new(layout.widths),
            alignment: AlignmentController::new(layout.alignments),
            row_numbers: RowNumberController::new(layout.row_numbers),
        }
    }

    pub fn to_layout(&self) -> ColumnLayoutState {
        ColumnLayoutState {
            order: self.reorder.order().to_vec(),
            widths: self.resize.widths().clone(),
            alignments: self.alignment.overrides().clone(),
            hidden: self.columns.hidden().clone(),
            row_numbers: self.row_numbers.enabled(),
        }
    }

    fn in_order(&self) -> [&dyn TableController; 5] {
        [
            &self.columns,
            &self.reorder,
            &self.resize,
            &self.alignment,
            &self.row_numbers,
        ]
    }

    pub fn reapply_all(&self, table: &mut RenderedTable) {
        for controller in self.in_order() {
            log::trace!("reapplying {}", controller.name());
            controller.reapply(table);
        }
    }

    /// Reset order, widths and alignments; visibility and numbering stay.
    pub fn reset_layout(&mut self) {
        self.reorder.reset();
        self.resize.reset();
        self.alignment.reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::Alignment;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn test_layout_round_trip() {
        let layout = ColumnLayoutState {
            order: vec!["B".into(), "A".into()],
            widths: BTreeMap::from([("A".to_string(), 120)]),
            alignments: BTreeMap::from([("B".to_string(), Alignment::Center)]),
            hidden: BTreeSet::from(["C".to_string()]),
            row_numbers: true,
        };
        let controllers = Controllers::from_layout(layout.clone());
        assert_eq!(controllers.to_layout(), layout);
    }

    #[test]
    fn test_fixed_order() {
        let c = Controllers::default();
        let names: Vec<&str> = c.in_order().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["columns", "reorder", "resize", "alignment", "row_numbers"]
        );
    }
}
