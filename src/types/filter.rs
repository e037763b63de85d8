use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Comparison operators for numeric column filters
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NumberOp {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "between")]
    Between,
}

/// Comparison operators for date column filters
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DateOp {
    On,
    Before,
    After,
    Between,
}

/// A typed predicate attached to one column.
///
/// Operands are kept as the raw strings the user typed; they are parsed
/// at evaluation time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColumnFilter {
    /// Case-insensitive substring match
    Text { needle: String },
    Number {
        op: NumberOp,
        v1: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        v2: Option<String>,
    },
    Date {
        op: DateOp,
        v1: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        v2: Option<String>,
    },
    /// Exact (trimmed) membership in a set of values
    Discrete { selected: BTreeSet<String> },
}

/// The kind of filter control offered for a column
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "values", rename_all = "camelCase")]
pub enum FilterKind {
    Text,
    Number,
    Date,
    /// Distinct values in first-seen order
    Discrete(Vec<String>),
}

/// Column filters plus the global search term.
///
/// Keys are column indices into the filtered row model. An entry exists only
/// while its predicate is active.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub(crate) filters: BTreeMap<usize, ColumnFilter>,
    pub(crate) search: String,
}
