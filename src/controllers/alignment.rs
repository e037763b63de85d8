//! Per-column horizontal alignment.

use std::collections::BTreeMap;

use super::TableController;
use crate::render::{RenderedTable, SlotRole};
use crate::types::Alignment;
use crate::value_parser::ColumnKind;

/// Alignment for a column nobody has aligned by hand.
pub fn default_alignment(kind: ColumnKind) -> Alignment {
    match kind {
        ColumnKind::Number => Alignment::Right,
        ColumnKind::Date => Alignment::Center,
        ColumnKind::Text => Alignment::Left,
    }
}

/// User alignments by column name; other columns follow their content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentController {
    overrides: BTreeMap<String, Alignment>,
}

impl AlignmentController {
    pub fn new(overrides: BTreeMap<String, Alignment>) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &BTreeMap<String, Alignment> {
        &self.overrides
    }

    pub fn set_alignment(&mut self, column: &str, alignment: Alignment) {
        self.overrides.insert(column.to_string(), alignment);
    }

    pub fn clear_alignment(&mut self, column: &str) {
        self.overrides.remove(column);
    }

    pub fn alignment_for(&self, column: &str, kind: ColumnKind) -> Alignment {
        self.overrides
            .get(column)
            .copied()
            .unwrap_or_else(|| default_alignment(kind))
    }

    pub fn reset(&mut self) {
        self.overrides.clear();
    }
}

impl TableController for AlignmentController {
    fn name(&self) -> &'static str {
        "alignment"
    }

    fn reapply(&self, table: &mut RenderedTable) {
        let aligned: Vec<(usize, Alignment)> = table
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role != SlotRole::RowNumber)
            .map(|(i, s)| (i, self.alignment_for(&s.name, s.kind)))
            .collect();
        for (slot, alignment) in aligned {
            // Header row 1 keeps its group-label alignment
            for row in table.header.iter_mut().skip(1).chain(table.body.iter_mut()) {
                if let Some(cell) = row.cells.get_mut(slot) {
                    cell.style.set("text-align", alignment.as_css());
                }
            }
        }
    }
}
