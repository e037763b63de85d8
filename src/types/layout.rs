use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Horizontal alignment of a column
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Persisted column layout, keyed by column name
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnLayoutState {
    /// User column order; names not present fall back to marks-card order
    pub order: Vec<String>,
    /// Widths in pixels
    pub widths: BTreeMap<String, u32>,
    pub alignments: BTreeMap<String, Alignment>,
    pub hidden: BTreeSet<String>,
    pub row_numbers: bool,
}
