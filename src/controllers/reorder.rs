//! Column reordering.
//!
//! The stored order is applied structurally before rendering via
//! [`ReorderController::resolve`]; `reapply` only stamps drag hooks.

use super::TableController;
use crate::render::{RenderedTable, SlotRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReorderController {
    order: Vec<String>,
}

impl ReorderController {
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// User order restricted to `columns`, then unseen columns in their
    /// original order.
    pub fn resolve(&self, columns: &[String]) -> Vec<String> {
        let mut out: Vec<String> = self
            .order
            .iter()
            .filter(|name| columns.contains(name))
            .cloned()
            .collect();
        for column in columns {
            if !out.contains(column) {
                out.push(column.clone());
            }
        }
        out
    }

    /// Move `column` to position `index` of the resolved order.
    ///
    /// Returns false if the column is unknown.
    pub fn move_column(&mut self, column: &str, index: usize, columns: &[String]) -> bool {
        let mut order = self.resolve(columns);
        let Some(from) = order.iter().position(|c| c == column) else {
            return false;
        };
        let moved = order.remove(from);
        order.insert(index.min(order.len()), moved);
        self.order = order;
        true
    }

    pub fn reset(&mut self) {
        self.order.clear();
    }
}

impl TableController for ReorderController {
    fn name(&self) -> &'static str {
        "reorder"
    }

    fn reapply(&self, table: &mut RenderedTable) {
        let movable: Vec<usize> = table
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role != SlotRole::RowNumber)
            .map(|(i, _)| i)
            .collect();
        let Some(header) = table.column_header_mut() else {
            return;
        };
        for (position, slot) in movable.into_iter().enumerate() {
            if let Some(cell) = header.cells.get_mut(slot) {
                cell.set_attr("draggable", "true");
                cell.set_attr("data-order", position.to_string());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn cols(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_resolve_appends_new_and_skips_vanished() {
        let r = ReorderController::new(cols(&["C", "Gone", "A"]));
        assert_eq!(r.resolve(&cols(&["A", "B", "C"])), cols(&["C", "A", "B"]));
    }

    #[test]
    fn test_move_column() {
        let mut r = ReorderController::default();
        let columns = cols(&["A", "B", "C"]);
        assert!(r.move_column("C", 0, &columns));
        assert_eq!(r.order(), cols(&["C", "A", "B"]).as_slice());
        assert!(r.move_column("C", 10, &columns));
        assert_eq!(r.resolve(&columns), cols(&["A", "B", "C"]));
        assert!(!r.move_column("Z", 0, &columns));
        r.reset();
        assert!(r.order().is_empty());
    }
}
