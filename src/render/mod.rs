//! Table construction.
//!
//! This module provides:
//! - [`TableRenderer`]: builds a [`RenderedTable`] from the view dataset,
//!   pivot state and measure groups, then runs the formatting pass
//! - The table model ([`model`]) and its HTML serialization ([`html`])
//!
//! Slot layout: the row-number slot, the label slot when a hierarchy exists,
//! then every non-hierarchy column of the view in order.

pub mod html;
pub mod model;

pub use html::escape_html;
pub use model::{ColumnSlot, HtmlCell, HtmlRow, RenderedTable, RowKind, SlotRole, StyleMap};

use crate::formatter::TableFormatter;
use crate::measure_grouping::MeasureGroupingModel;
use crate::numfmt::format_auto;
use crate::pivot::{aggregate, PivotGroupingModel, PivotRow, PivotRowKind};
use crate::types::{Dataset, MeasureGroup, PivotLevel};
use crate::value_parser::{parse_number, ColumnKind};

/// Rows sampled when classifying a column for display.
pub const KIND_SAMPLE_ROWS: usize = 200;

/// Header text of the row-number slot.
pub const ROW_NUMBER_HEADER: &str = "#";

/// A measure group as laid out in the current view.
#[derive(Debug, Clone)]
struct GroupLayout<'a> {
    group: &'a MeasureGroup,
    /// Member column indices present in the view, in view order
    members: Vec<usize>,
}

impl GroupLayout<'_> {
    fn lead(&self) -> Option<usize> {
        self.members.first().copied()
    }

    fn span(&self) -> usize {
        if self.group.collapsed {
            1
        } else {
            self.members.len()
        }
    }
}

/// Builds tables. Every call discards prior output and rebuilds from models.
#[derive(Debug, Clone, Default)]
pub struct TableRenderer {
    render_count: u64,
}

impl TableRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of full renders performed.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Build the table structure and run the formatting pass.
    pub fn render(
        &mut self,
        view: &Dataset,
        hierarchy: &[usize],
        pivot: &PivotGroupingModel,
        groups: &MeasureGroupingModel,
        formatter: &TableFormatter,
    ) -> RenderedTable {
        self.render_count += 1;
        let mut table = build_structure(view, hierarchy, pivot, groups);
        formatter.format_table(&mut table);
        log::debug!(
            "rendered generation {} with {} body rows",
            table.generation,
            table.body.len()
        );
        table
    }
}

/// Per-column slot data: slot index of each view column (hierarchy columns
/// share the label slot).
struct SlotMap {
    data_columns: Vec<usize>,
    has_label: bool,
}

impl SlotMap {
    /// View column of a data slot.
    fn column_at(&self, slot: usize) -> Option<usize> {
        let offset = if self.has_label { 2 } else { 1 };
        slot.checked_sub(offset)
            .and_then(|i| self.data_columns.get(i))
            .copied()
    }
}

fn layout_groups<'a>(
    view: &Dataset,
    data_columns: &[usize],
    groups: &'a MeasureGroupingModel,
) -> Vec<GroupLayout<'a>> {
    groups
        .groups()
        .iter()
        .map(|group| GroupLayout {
            group,
            members: data_columns
                .iter()
                .copied()
                .filter(|&c| view.columns().get(c).is_some_and(|name| group.contains(name)))
                .collect(),
        })
        .collect()
}

/// Which group, if any, owns a view column.
fn group_of<'l, 'a>(
    layouts: &'l [GroupLayout<'a>],
    col: usize,
) -> Option<(usize, &'l GroupLayout<'a>)> {
    layouts
        .iter()
        .enumerate()
        .find(|(_, l)| l.members.contains(&col))
}

/// Build slots, header rows, body rows and the row model without styling.
pub fn build_structure(
    view: &Dataset,
    hierarchy: &[usize],
    pivot: &PivotGroupingModel,
    groups: &MeasureGroupingModel,
) -> RenderedTable {
    let data_columns: Vec<usize> = (0..view.column_count())
        .filter(|c| !hierarchy.contains(c))
        .collect();
    let slot_map = SlotMap {
        data_columns: data_columns.clone(),
        has_label: !hierarchy.is_empty(),
    };
    let layouts = layout_groups(view, &data_columns, groups);

    let mut slots = vec![ColumnSlot {
        name: ROW_NUMBER_HEADER.to_string(),
        role: SlotRole::RowNumber,
        kind: ColumnKind::Number,
        group: None,
        hidden: true,
    }];
    if let Some(&label_col) = hierarchy.first() {
        slots.push(ColumnSlot {
            name: view.columns().get(label_col).cloned().unwrap_or_default(),
            role: SlotRole::Label,
            kind: ColumnKind::Text,
            group: None,
            hidden: false,
        });
    }
    for &col in &data_columns {
        slots.push(ColumnSlot {
            name: view.columns().get(col).cloned().unwrap_or_default(),
            role: SlotRole::Data,
            kind: view.column_kind(col, KIND_SAMPLE_ROWS),
            group: group_of(&layouts, col).map(|(i, _)| i),
            hidden: false,
        });
    }

    let header = vec![
        group_header_row(&slots, &slot_map, &layouts),
        column_header_row(&slots, &slot_map, &layouts),
    ];

    let (body, values): (Vec<HtmlRow>, Vec<Vec<String>>) = pivot
        .build_rows(view, hierarchy)
        .iter()
        .map(|prow| body_row(view, prow, &slots, &slot_map, &layouts))
        .unzip();
    let model_columns = slots
        .iter()
        .filter(|s| s.role != SlotRole::RowNumber)
        .map(|s| s.name.clone())
        .collect();
    // Every value row is built from the same slot list, so widths always agree.
    let model = Dataset::new(model_columns, values)
        .unwrap_or_default()
        .with_generation(view.generation());

    RenderedTable {
        slots,
        header,
        body,
        model,
        style: StyleMap::new(),
        generation: view.generation(),
    }
}

/// Header row 1: group labels spanning their members.
fn group_header_row(slots: &[ColumnSlot], map: &SlotMap, layouts: &[GroupLayout<'_>]) -> HtmlRow {
    let cells = (0..slots.len())
        .map(|slot| {
            let Some(col) = map.column_at(slot) else {
                return HtmlCell::new("");
            };
            match group_of(layouts, col) {
                Some((idx, layout)) if layout.lead() == Some(col) => {
                    HtmlCell::new(layout.group.name.as_str())
                        .with_span(layout.span())
                        .with_attr("data-group-index", idx.to_string())
                        .with_attr("data-collapsed", layout.group.collapsed.to_string())
                }
                Some(_) => HtmlCell::hidden(),
                None => HtmlCell::new(""),
            }
        })
        .collect();
    HtmlRow::new(RowKind::GroupHeader, cells)
}

/// Header row 2: column labels; a collapsed group shows its name once.
fn column_header_row(
    slots: &[ColumnSlot],
    map: &SlotMap,
    layouts: &[GroupLayout<'_>],
) -> HtmlRow {
    let cells = slots
        .iter()
        .enumerate()
        .map(|(slot, info)| {
            let Some(col) = map.column_at(slot) else {
                let cell = HtmlCell::new(info.name.as_str());
                return match info.role {
                    SlotRole::Label => cell.with_attr("data-column", info.name.as_str()),
                    _ => cell,
                };
            };
            match group_of(layouts, col) {
                Some((_, layout)) if layout.group.collapsed => {
                    if layout.lead() == Some(col) {
                        HtmlCell::new(layout.group.name.as_str())
                            .with_attr("data-column", info.name.as_str())
                    } else {
                        HtmlCell::hidden().with_attr("data-column", info.name.as_str())
                    }
                }
                _ => HtmlCell::new(info.name.as_str()).with_attr("data-column", info.name.as_str()),
            }
        })
        .collect();
    HtmlRow::new(RowKind::ColumnHeader, cells)
}

/// One body row plus its plain values for the row model.
///
/// Model values come from the view and the pivot sums, never from cell
/// text, so they are unaffected by number formats and disclosure glyphs.
fn body_row(
    view: &Dataset,
    prow: &PivotRow,
    slots: &[ColumnSlot],
    map: &SlotMap,
    layouts: &[GroupLayout<'_>],
) -> (HtmlRow, Vec<String>) {
    let kind = match prow.kind {
        PivotRowKind::Group(PivotLevel::Category) => RowKind::Category,
        PivotRowKind::Group(PivotLevel::SubCategory) => RowKind::SubCategory,
        PivotRowKind::Group(PivotLevel::Segment) => RowKind::Segment,
        PivotRowKind::Detail => RowKind::Detail,
    };
    let detail_row = match (prow.kind, prow.rows.as_slice()) {
        (PivotRowKind::Detail, [r]) => Some(*r),
        _ => None,
    };
    let sums = if detail_row.is_some() {
        Vec::new()
    } else {
        aggregate(view, &prow.rows)
    };

    let mut cells = Vec::with_capacity(slots.len());
    let mut values = Vec::with_capacity(slots.len().saturating_sub(1));
    for (slot, info) in slots.iter().enumerate() {
        let (cell, value) = match info.role {
            SlotRole::RowNumber => {
                cells.push(HtmlCell::new(""));
                continue;
            }
            SlotRole::Label => (HtmlCell::new(prow.label.as_str()), prow.value.clone()),
            SlotRole::Data => match map.column_at(slot) {
                None => (HtmlCell::new(""), String::new()),
                Some(col) => match group_of(layouts, col) {
                    Some((_, layout)) if layout.group.collapsed => {
                        if layout.lead() == Some(col) {
                            let total: f64 = prow
                                .rows
                                .iter()
                                .filter_map(|&r| view.rows().get(r))
                                .map(|row| {
                                    MeasureGroupingModel::group_sum(layout.group, row, view.columns())
                                })
                                .sum();
                            (
                                HtmlCell::numeric(String::new(), Some(total), true),
                                format_auto(total),
                            )
                        } else {
                            (HtmlCell::hidden(), String::new())
                        }
                    }
                    _ => match detail_row {
                        Some(r) => {
                            let text = view.cell(r, col);
                            let value = match info.kind {
                                ColumnKind::Number => parse_number(text),
                                ColumnKind::Date | ColumnKind::Text => None,
                            };
                            (
                                HtmlCell::numeric(text, value, false),
                                text.trim().to_string(),
                            )
                        }
                        None => {
                            let value = sums.get(col).copied().flatten();
                            (
                                HtmlCell::numeric(String::new(), value, true),
                                value.map(format_auto).unwrap_or_default(),
                            )
                        }
                    },
                },
            },
        };
        cells.push(cell);
        values.push(value);
    }

    let mut row = HtmlRow::new(kind, cells);
    row.pivot_key.clone_from(&prow.key);
    row.level = prow.depth();
    row.collapsed = prow.collapsed;
    (row, values)
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
    use crate::pivot::hierarchy_columns;
    use crate::types::{NumberFormatOverride, NumberFormatType};

    fn texts(row: &HtmlRow) -> Vec<String> {
        row.cells
            .iter()
            .map(|c| {
                if c.hidden {
                    "~".to_string()
                } else {
                    c.text.clone()
                }
            })
            .collect()
    }

    fn render(view: &Dataset, pivot: &PivotGroupingModel, groups: &MeasureGroupingModel) -> RenderedTable {
        let h = hierarchy_columns(view);
        TableRenderer::new().render(view, &h, pivot, groups, &TableFormatter::default())
    }

    #[test]
    fn test_basic_pivot() {
        let view = Dataset::from_strs(
            &["Region", "Rep", "Revenue"],
            &[
                &["East", "Alice", "100"],
                &["East", "Bob", "200"],
                &["West", "Carl", "50"],
            ],
        )
        .unwrap();
        let mut pivot = PivotGroupingModel::new();
        let groups = MeasureGroupingModel::new();

        let table = render(&view, &pivot, &groups);
        assert_eq!(table.slots.len(), 3);
        assert_eq!(texts(&table.header[1]), vec!["#", "Region", "Revenue"]);
        assert_eq!(table.body.len(), 2);
        assert_eq!(texts(&table.body[0]), vec!["", "\u{25b6} East", "300"]);
        assert_eq!(texts(&table.body[1]), vec!["", "\u{25b6} West", "50"]);
        assert_eq!(table.body[0].pivot_key.as_deref(), Some("East"));

        pivot.toggle_category("East");
        let table = render(&view, &pivot, &groups);
        assert_eq!(table.body.len(), 4);
        assert_eq!(texts(&table.body[1])[2], "100");
        assert_eq!(texts(&table.body[2])[2], "200");
        assert_eq!(table.body[1].kind, RowKind::SubCategory);
    }

    #[test]
    fn test_measure_group_collapse() {
        let view = Dataset::from_strs(&["Fee", "Spread"], &[&["10", "5"]]).unwrap();
        let pivot = PivotGroupingModel::new();
        let mut groups = MeasureGroupingModel::new();
        groups.add_group("Commission", vec!["Fee".into(), "Spread".into()], true);

        let table = render(&view, &pivot, &groups);
        let label = &table.header[0].cells[1];
        assert_eq!(label.text, "Commission");
        assert_eq!(label.colspan, 1);
        assert_eq!(texts(&table.header[0]), vec!["", "Commission", "~"]);
        assert_eq!(texts(&table.header[1]), vec!["#", "Commission", "~"]);
        assert_eq!(texts(&table.body[0]), vec!["", "15", "~"]);

        groups.toggle_group(0);
        let table = render(&view, &pivot, &groups);
        assert_eq!(table.header[0].cells[1].colspan, 2);
        assert_eq!(texts(&table.header[1]), vec!["#", "Fee", "Spread"]);
        assert_eq!(texts(&table.body[0]), vec!["", "10", "5"]);
    }

    #[test]
    fn test_every_row_has_one_cell_per_slot() {
        let view = Dataset::from_strs(
            &["Region", "Rep", "Fee", "Spread", "Note"],
            &[
                &["East", "Alice", "1", "2", "x"],
                &["West", "Bob", "3", "4", "y"],
            ],
        )
        .unwrap();
        let mut pivot = PivotGroupingModel::new();
        pivot.toggle_category("East");
        let mut groups = MeasureGroupingModel::new();
        groups.add_group("G", vec!["Fee".into(), "Spread".into()], false);
        let table = render(&view, &pivot, &groups);
        for row in table.header.iter().chain(table.body.iter()) {
            assert_eq!(row.cells.len(), table.slots.len());
        }
        // Text columns aggregate to blank, never "0"
        assert_eq!(texts(&table.body[0])[4], "");
    }

    #[test]
    fn test_detail_rows_keep_host_text() {
        let view = Dataset::from_strs(&["Amount", "Qty"], &[&["$1,200.50", "3"]]).unwrap();
        let table = render(&view, &PivotGroupingModel::new(), &MeasureGroupingModel::new());
        assert_eq!(texts(&table.body[0]), vec!["", "$1,200.50", "3"]);
        assert_eq!(table.body[0].cells[1].value, Some(1200.5));
    }

    #[test]
    fn test_row_model_holds_plain_values() {
        let view = Dataset::from_strs(
            &["Region", "Rep", "Revenue"],
            &[
                &["East", "Alice", "1200.5"],
                &["East", "Bob", "300"],
                &["West", "Carl", "50"],
            ],
        )
        .unwrap();
        let mut pivot = PivotGroupingModel::new();
        pivot.toggle_category("East");
        let mut formatter = TableFormatter::default();
        formatter.set_column_number_format(
            "Revenue",
            NumberFormatOverride {
                kind: Some(NumberFormatType::Scientific),
                decimals: Some(2),
                ..NumberFormatOverride::default()
            },
        );
        let h = hierarchy_columns(&view);
        let table = TableRenderer::new().render(
            &view,
            &h,
            &pivot,
            &MeasureGroupingModel::new(),
            &formatter,
        );

        assert_eq!(table.body[0].cells[1].text, "\u{25bc} East");
        assert_eq!(table.body[0].cells[2].text, "1.50e+3");
        let model = table.row_model();
        assert_eq!(model.columns(), ["Region", "Revenue"]);
        assert_eq!(model.rows()[0], vec!["East", "1,500.5"]);
        assert_eq!(model.rows()[1], vec!["Alice", "1,200.5"]);
        assert_eq!(model.rows()[3], vec!["West", "50"]);
    }

    #[test]
    fn test_render_count() {
        let view = Dataset::from_strs(&["A"], &[&["1"]]).unwrap();
        let mut r = TableRenderer::new();
        let f = TableFormatter::default();
        r.render(&view, &[], &PivotGroupingModel::new(), &MeasureGroupingModel::new(), &f);
        r.render(&view, &[], &PivotGroupingModel::new(), &MeasureGroupingModel::new(), &f);
        assert_eq!(r.render_count(), 2);
    }
}
