use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number presentation style
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormatType {
    /// Keep the host's display text; sums get grouping separators
    #[default]
    Auto,
    Number,
    Currency,
    Percentage,
    Accounting,
    Scientific,
}

/// How negative numbers are shown for `number` and `currency`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum NegativeStyle {
    Minus,
    #[default]
    Parentheses,
    /// Minus sign plus a red colour hint
    Red,
}

/// Table-wide number format section
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberFormat {
    #[serde(rename = "type")]
    pub kind: NumberFormatType,
    /// ISO currency code, e.g. `"USD"`
    pub currency: String,
    pub decimals: u8,
    pub thousands_separator: bool,
    pub negative_numbers: NegativeStyle,
    pub prefix: String,
    pub suffix: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            kind: NumberFormatType::Auto,
            currency: "USD".to_string(),
            decimals: 2,
            thousands_separator: true,
            negative_numbers: NegativeStyle::Parentheses,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

/// Per-column number format override; unset fields inherit the section.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberFormatOverride {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NumberFormatType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thousands_separator: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_numbers: Option<NegativeStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl NumberFormat {
    /// Layer a column override on top of this section.
    #[must_use]
    pub fn merged(&self, o: &NumberFormatOverride) -> Self {
        Self {
            kind: o.kind.unwrap_or(self.kind),
            currency: o.currency.clone().unwrap_or_else(|| self.currency.clone()),
            decimals: o.decimals.unwrap_or(self.decimals),
            thousands_separator: o.thousands_separator.unwrap_or(self.thousands_separator),
            negative_numbers: o.negative_numbers.unwrap_or(self.negative_numbers),
            prefix: o.prefix.clone().unwrap_or_else(|| self.prefix.clone()),
            suffix: o.suffix.clone().unwrap_or_else(|| self.suffix.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CellStyling {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub font_style: String,
    pub text_align: String,
    pub vertical_align: String,
    pub text_color: String,
    pub background_color: String,
    pub padding: String,
}

impl Default for CellStyling {
    fn default() -> Self {
        Self {
            font_family: "inherit".to_string(),
            font_size: "14px".to_string(),
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            text_align: "left".to_string(),
            vertical_align: "middle".to_string(),
            text_color: "#333333".to_string(),
            background_color: "transparent".to_string(),
            padding: "8px 12px".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderStyling {
    pub background_color: String,
    pub text_color: String,
    pub font_weight: String,
    pub font_size: String,
    pub text_align: String,
    pub border_bottom: String,
}

impl Default for HeaderStyling {
    fn default() -> Self {
        Self {
            background_color: "#f8f8f8".to_string(),
            text_color: "#333333".to_string(),
            font_weight: "600".to_string(),
            font_size: "14px".to_string(),
            text_align: "left".to_string(),
            border_bottom: "2px solid #e0e0e0".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RowFormatting {
    pub alternating_rows: bool,
    pub even_row_color: String,
    pub odd_row_color: String,
    pub hover_color: String,
    pub row_height: String,
    pub row_border: String,
}

impl Default for RowFormatting {
    fn default() -> Self {
        Self {
            alternating_rows: true,
            even_row_color: "#fafafa".to_string(),
            odd_row_color: "#ffffff".to_string(),
            hover_color: "#f0f7ff".to_string(),
            row_height: "auto".to_string(),
            row_border: "1px solid #eeeeee".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnFormatting {
    /// Initial width for columns without a user width, e.g. `"120px"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_width: Option<String>,
    pub column_borders: bool,
    /// Number format overrides keyed by exact column name
    pub columns: BTreeMap<String, NumberFormatOverride>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStructure {
    pub border_collapse: String,
    pub table_layout: String,
    pub grid_lines: bool,
    pub outer_border: bool,
    pub border_color: String,
    pub border_width: String,
    pub border_style: String,
}

impl Default for TableStructure {
    fn default() -> Self {
        Self {
            border_collapse: "collapse".to_string(),
            table_layout: "auto".to_string(),
            grid_lines: false,
            outer_border: true,
            border_color: "#e0e0e0".to_string(),
            border_width: "1px".to_string(),
            border_style: "solid".to_string(),
        }
    }
}

/// Comparison applied by a conditional formatting rule
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RuleCondition {
    GreaterThan,
    LessThan,
    EqualTo,
    Between,
}

/// Visual effect applied by a matching rule
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RuleEffect {
    BackgroundColor,
    TextColor,
    DataBar,
    IconSet,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    /// Row-model column the rule applies to; `None` means every column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<usize>,
    pub condition: RuleCondition,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(rename = "type")]
    pub effect: RuleEffect,
    #[serde(default)]
    pub color: String,
    /// Glyph for `iconSet` rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionalFormatting {
    pub enabled: bool,
    pub rules: Vec<ConditionalRule>,
}

/// All display formatting settings.
///
/// Every field defaults, so persisted blobs missing newer keys still load.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingSettings {
    pub number_format: NumberFormat,
    pub cell_styling: CellStyling,
    pub header_styling: HeaderStyling,
    pub row_formatting: RowFormatting,
    pub column_formatting: ColumnFormatting,
    pub table_structure: TableStructure,
    pub conditional_formatting: ConditionalFormatting,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_blob_merges_onto_defaults() {
        let json = r#"{"numberFormat":{"type":"currency"},"rowFormatting":{"alternatingRows":false}}"#;
        let settings: FormattingSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.number_format.kind, NumberFormatType::Currency);
        assert_eq!(settings.number_format.decimals, 2);
        assert_eq!(settings.number_format.currency, "USD");
        assert!(!settings.row_formatting.alternating_rows);
        assert_eq!(settings.row_formatting.even_row_color, "#fafafa");
        assert_eq!(settings.cell_styling.padding, "8px 12px");
    }

    #[test]
    fn test_override_merge() {
        let base = NumberFormat::default();
        let o = NumberFormatOverride {
            kind: Some(NumberFormatType::Percentage),
            decimals: Some(1),
            ..Default::default()
        };
        let merged = base.merged(&o);
        assert_eq!(merged.kind, NumberFormatType::Percentage);
        assert_eq!(merged.decimals, 1);
        assert!(merged.thousands_separator);
    }
}
