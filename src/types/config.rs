use serde::{Deserialize, Serialize};

use super::{MeasureGroup, PivotStatePairs};

/// Version written into exported configuration files.
pub const CONFIG_VERSION: &str = "1.0";

/// Shareable grouping configuration file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportedConfig {
    pub version: String,
    /// ISO-8601 timestamp of the export
    pub export_date: String,
    pub measure_groups: Vec<MeasureGroup>,
    pub pivot_state: PivotStatePairs,
}

/// Calculations available for derived columns
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Calculation {
    /// `amount / revenue * 100`
    CommissionPercent,
    /// `revenue * pct / 100`
    CommissionAmount,
    /// `gross - costs`
    NetRevenue,
    /// `revenue - cogs`
    GrossMargin,
    /// `margin / revenue * 100`
    MarginPercent,
    /// `commission * pct / 100`
    PayoutAmount,
    /// `base * pct / 100`
    OverrideAmount,
    /// Sum of every input
    TotalCompensation,
}

impl Calculation {
    /// Number of input columns, `None` for variadic.
    pub fn arity(self) -> Option<usize> {
        match self {
            Self::TotalCompensation => None,
            _ => Some(2),
        }
    }
}

/// A computed column appended to the dataset before rendering
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedColumn {
    pub name: String,
    pub calculation: Calculation,
    /// Input column names, in calculation argument order
    pub inputs: Vec<String>,
}
