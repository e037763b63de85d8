//! Styling pass over a rendered table.
//!
//! Runs once per render after structure is built. Header and body branches
//! never share declarations. Pivot rows keep their own look: they only get
//! padding and alignment from here.

use crate::conditional::evaluate_rules;
use crate::numfmt::{format_auto, format_number, FormattedValue};
use crate::render::{HtmlCell, RenderedTable, RowKind, SlotRole};
use crate::types::{
    ConditionalRule, FormattingSettings, NumberFormat, NumberFormatOverride, NumberFormatType,
};
use crate::value_parser::ColumnKind;

/// Position of a cell, as seen by the styling rules
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    pub row_kind: RowKind,
    /// Body row index, used for alternating backgrounds
    pub row_index: usize,
    /// Row-model column index (slot index minus the row-number slot)
    pub column_index: Option<usize>,
    pub column_name: &'a str,
}

impl CellContext<'_> {
    pub fn is_header(&self) -> bool {
        self.row_kind.is_header()
    }
}

/// Owns the formatting settings and applies them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFormatter {
    settings: FormattingSettings,
}

impl TableFormatter {
    pub fn new(settings: FormattingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FormattingSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: FormattingSettings) {
        self.settings = settings;
    }

    pub fn set_column_number_format(&mut self, column: &str, format: NumberFormatOverride) {
        self.settings
            .column_formatting
            .columns
            .insert(column.to_string(), format);
    }

    pub fn remove_column_formatting(&mut self, column: &str) -> bool {
        self.settings
            .column_formatting
            .columns
            .remove(column)
            .is_some()
    }

    pub fn add_conditional_rule(&mut self, rule: ConditionalRule) {
        self.settings.conditional_formatting.rules.push(rule);
    }

    pub fn remove_conditional_rule(&mut self, index: usize) -> Option<ConditionalRule> {
        let rules = &mut self.settings.conditional_formatting.rules;
        (index < rules.len()).then(|| rules.remove(index))
    }

    /// Restore default settings, keeping conditional rules.
    pub fn reset_to_defaults(&mut self) {
        let conditional = std::mem::take(&mut self.settings.conditional_formatting);
        self.settings = FormattingSettings {
            conditional_formatting: conditional,
            ..FormattingSettings::default()
        };
    }

    /// Section defaults merged with the column's override.
    pub fn number_format_for(&self, column: &str) -> NumberFormat {
        let base = &self.settings.number_format;
        match self.settings.column_formatting.columns.get(column) {
            Some(o) => base.merged(o),
            None => base.clone(),
        }
    }

    pub fn format_number(&self, value: f64, column: &str) -> FormattedValue {
        format_number(value, &self.number_format_for(column))
    }

    /// Display text for a numeric cell.
    ///
    /// `auto` keeps host text for single cells and groups sums.
    fn format_cell_value(&self, cell: &HtmlCell, column: &str) -> Option<FormattedValue> {
        let value = cell.value?;
        let fmt = self.number_format_for(column);
        if fmt.kind == NumberFormatType::Auto {
            if cell.aggregate {
                return Some(FormattedValue::new(format_auto(value)));
            }
            return None;
        }
        Some(format_number(value, &fmt))
    }

    /// Table-level structure: collapse, layout and outer border.
    pub fn apply_table_structure(&self, table: &mut RenderedTable) {
        let ts = &self.settings.table_structure;
        table.style.set("width", "100%");
        table.style.set("border-collapse", ts.border_collapse.as_str());
        table.style.set("table-layout", ts.table_layout.as_str());
        if ts.outer_border {
            table.style.set(
                "border",
                format!("{} {} {}", ts.border_width, ts.border_style, ts.border_color),
            );
        }
    }

    /// Style one cell.
    pub fn apply_cell_styling(&self, cell: &mut HtmlCell, ctx: &CellContext<'_>) {
        let s = &self.settings;
        let cs = &s.cell_styling;

        if ctx.is_header() {
            let hs = &s.header_styling;
            cell.style.set("background-color", hs.background_color.as_str());
            cell.style.set("color", hs.text_color.as_str());
            cell.style.set("font-weight", hs.font_weight.as_str());
            cell.style.set("font-size", hs.font_size.as_str());
            cell.style.set("text-align", hs.text_align.as_str());
            cell.style.set("border-bottom", hs.border_bottom.as_str());
            cell.style.set("padding", cs.padding.as_str());
        } else if ctx.row_kind.is_pivot() {
            cell.style.set("padding", cs.padding.as_str());
            cell.style.set("text-align", cs.text_align.as_str());
        } else {
            let rf = &s.row_formatting;
            cell.style.set("font-family", cs.font_family.as_str());
            cell.style.set("font-size", cs.font_size.as_str());
            cell.style.set("font-weight", cs.font_weight.as_str());
            cell.style.set("font-style", cs.font_style.as_str());
            cell.style.set("text-align", cs.text_align.as_str());
            cell.style.set("vertical-align", cs.vertical_align.as_str());
            cell.style.set("color", cs.text_color.as_str());
            cell.style.set("padding", cs.padding.as_str());
            let background = if rf.alternating_rows {
                if ctx.row_index % 2 == 0 {
                    &rf.even_row_color
                } else {
                    &rf.odd_row_color
                }
            } else {
                &cs.background_color
            };
            cell.style.set("background-color", background.as_str());
            if rf.row_height != "auto" && !rf.row_height.is_empty() {
                cell.style.set("height", rf.row_height.as_str());
            }
            if !rf.row_border.is_empty() {
                cell.style.set("border-bottom", rf.row_border.as_str());
            }
        }

        let ts = &s.table_structure;
        if ts.grid_lines {
            cell.style.set(
                "border",
                format!("{} {} {}", ts.border_width, ts.border_style, ts.border_color),
            );
        } else if s.column_formatting.column_borders {
            cell.style.set(
                "border-right",
                format!("{} {} {}", ts.border_width, ts.border_style, ts.border_color),
            );
        }
        if let Some(width) = &s.column_formatting.default_width {
            if ctx.row_kind == RowKind::ColumnHeader {
                cell.style.set("width", width.as_str());
            }
        }
    }

    fn apply_conditional(&self, cell: &mut HtmlCell, column_index: usize) {
        let cf = &self.settings.conditional_formatting;
        if !cf.enabled || cf.rules.is_empty() {
            return;
        }
        let Some(value) = cell.value else {
            return;
        };
        let effect = evaluate_rules(&cf.rules, column_index, value);
        if let Some(bg) = effect.background {
            cell.style.set("background-color", bg);
        }
        if let Some(color) = effect.text_color {
            cell.style.set("color", color);
        }
        if let Some(bar) = effect.data_bar {
            cell.style.set("background-image", bar);
        }
        if effect.icon.is_some() {
            cell.icon = effect.icon;
        }
    }

    /// The single formatting pass: table structure, number text, cell styles
    /// and conditional rules.
    pub fn format_table(&self, table: &mut RenderedTable) {
        self.apply_table_structure(table);

        let slot_info: Vec<(SlotRole, ColumnKind, String)> = table
            .slots
            .iter()
            .map(|s| (s.role, s.kind, s.name.clone()))
            .collect();
        let column_index = |slot: usize| slot.checked_sub(1);

        for row in &mut table.header {
            let kind = row.kind;
            for (slot, cell) in row.cells.iter_mut().enumerate() {
                let name = slot_info.get(slot).map_or("", |(_, _, n)| n.as_str());
                let ctx = CellContext {
                    row_kind: kind,
                    row_index: 0,
                    column_index: column_index(slot),
                    column_name: name,
                };
                self.apply_cell_styling(cell, &ctx);
            }
        }

        for (row_index, row) in table.body.iter_mut().enumerate() {
            let kind = row.kind;
            for (slot, cell) in row.cells.iter_mut().enumerate() {
                let Some((role, col_kind, name)) = slot_info.get(slot) else {
                    continue;
                };
                let ctx = CellContext {
                    row_kind: kind,
                    row_index,
                    column_index: column_index(slot),
                    column_name: name,
                };
                self.apply_cell_styling(cell, &ctx);

                if *role != SlotRole::Data {
                    continue;
                }
                if *col_kind == ColumnKind::Number || cell.aggregate {
                    if let Some(formatted) = self.format_cell_value(cell, name) {
                        cell.text = formatted.text;
                        if let Some(color) = formatted.color {
                            cell.style.set("color", color);
                        }
                    }
                }
                if kind == RowKind::Detail {
                    if let Some(idx) = ctx.column_index {
                        self.apply_conditional(cell, idx);
                    }
                }
            }
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
    use crate::types::{NegativeStyle, RuleCondition, RuleEffect};

    fn body_ctx(row_kind: RowKind, row_index: usize) -> CellContext<'static> {
        CellContext {
            row_kind,
            row_index,
            column_index: Some(1),
            column_name: "Revenue",
        }
    }

    #[test]
    fn test_column_override_takes_precedence() {
        let mut f = TableFormatter::default();
        f.set_column_number_format(
            "Revenue",
            NumberFormatOverride {
                kind: Some(NumberFormatType::Currency),
                decimals: Some(0),
                ..Default::default()
            },
        );
        assert_eq!(f.format_number(1234.4, "Revenue").text, "$1,234");
        assert_eq!(f.format_number(1234.4, "Other").text, "1,234.4");
        assert!(f.remove_column_formatting("Revenue"));
        assert_eq!(f.format_number(1234.4, "Revenue").text, "1,234.4");
    }

    #[test]
    fn test_pivot_rows_only_get_padding_and_alignment() {
        let f = TableFormatter::default();
        let mut cell = HtmlCell::new("x");
        f.apply_cell_styling(&mut cell, &body_ctx(RowKind::Category, 0));
        assert!(cell.style.get("padding").is_some());
        assert!(cell.style.get("text-align").is_some());
        assert!(cell.style.get("background-color").is_none());
        assert!(cell.style.get("font-family").is_none());
    }

    #[test]
    fn test_alternating_rows() {
        let f = TableFormatter::default();
        let mut even = HtmlCell::new("x");
        let mut odd = HtmlCell::new("y");
        f.apply_cell_styling(&mut even, &body_ctx(RowKind::Detail, 0));
        f.apply_cell_styling(&mut odd, &body_ctx(RowKind::Detail, 1));
        assert_eq!(even.style.get("background-color"), Some("#fafafa"));
        assert_eq!(odd.style.get("background-color"), Some("#ffffff"));
    }

    #[test]
    fn test_header_branch() {
        let f = TableFormatter::default();
        let mut cell = HtmlCell::new("Revenue");
        f.apply_cell_styling(&mut cell, &body_ctx(RowKind::ColumnHeader, 0));
        assert_eq!(cell.style.get("background-color"), Some("#f8f8f8"));
        assert!(cell.style.get("font-style").is_none());
    }

    #[test]
    fn test_conditional_applies_to_detail_cells() {
        let mut f = TableFormatter::default();
        f.add_conditional_rule(ConditionalRule {
            column_index: Some(1),
            condition: RuleCondition::GreaterThan,
            value: 100.0,
            max_value: None,
            effect: RuleEffect::BackgroundColor,
            color: "#ffeeee".into(),
            icon: None,
        });
        let mut cell = HtmlCell::numeric("150", Some(150.0), false);
        f.apply_conditional(&mut cell, 1);
        assert!(cell.style.get("background-color").is_none());

        let mut settings = f.settings().clone();
        settings.conditional_formatting.enabled = true;
        f.set_settings(settings);
        f.apply_conditional(&mut cell, 1);
        assert_eq!(cell.style.get("background-color"), Some("#ffeeee"));
    }

    #[test]
    fn test_reset_keeps_rules() {
        let mut f = TableFormatter::default();
        f.add_conditional_rule(ConditionalRule {
            column_index: None,
            condition: RuleCondition::LessThan,
            value: 0.0,
            max_value: None,
            effect: RuleEffect::TextColor,
            color: "red".into(),
            icon: None,
        });
        let mut settings = f.settings().clone();
        settings.number_format.negative_numbers = NegativeStyle::Minus;
        f.set_settings(settings);
        f.reset_to_defaults();
        assert_eq!(f.settings().conditional_formatting.rules.len(), 1);
        assert_eq!(
            f.settings().number_format.negative_numbers,
            NegativeStyle::Parentheses
        );
        assert!(f.remove_conditional_rule(0).is_some());
        assert!(f.remove_conditional_rule(0).is_none());
    }

    #[test]
    fn test_auto_keeps_detail_text() {
        let f = TableFormatter::default();
        let detail = HtmlCell::numeric("1,200.50", Some(1200.5), false);
        assert!(f.format_cell_value(&detail, "Revenue").is_none());
        let sum = HtmlCell::numeric("", Some(2400.0), true);
        assert_eq!(f.format_cell_value(&sum, "Revenue").unwrap().text, "2,400");
    }
}
