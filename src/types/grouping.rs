use serde::{Deserialize, Serialize};

/// A user-defined, collapsible bundle of measure columns
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MeasureGroup {
    pub name: String,
    /// Member column names in display order
    pub measures: Vec<String>,
    #[serde(default)]
    pub collapsed: bool,
}

impl MeasureGroup {
    pub fn new(name: impl Into<String>, measures: Vec<String>, collapsed: bool) -> Self {
        Self {
            name: name.into(),
            measures,
            collapsed,
        }
    }

    /// The column that carries the group label and, when collapsed, the sum.
    pub fn lead(&self) -> Option<&str> {
        self.measures.first().map(String::as_str)
    }

    /// Validation applied by the grouping editor before saving.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.measures.len() >= 2
    }

    pub fn contains(&self, column: &str) -> bool {
        self.measures.iter().any(|m| m == column)
    }
}

/// Persisted expansion state: `[key, collapsed]` pairs in insertion order.
pub type PivotStatePairs = Vec<(String, bool)>;

/// Depth of a row in the pivot hierarchy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum PivotLevel {
    Category,
    SubCategory,
    Segment,
}

impl PivotLevel {
    pub fn depth(self) -> usize {
        match self {
            Self::Category => 0,
            Self::SubCategory => 1,
            Self::Segment => 2,
        }
    }
}
