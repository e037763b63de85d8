use serde::{Deserialize, Serialize};

use crate::error::{FlexTableError, Result};
use crate::value_parser::{classify_column, ColumnKind};

/// Host-declared data type of a column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnType {
    pub name: String,
    /// Host data type name, e.g. `"float"`, `"string"`, `"date"`
    pub data_type: String,
}

/// Semantic role of a column.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ColumnRole {
    /// Numeric, aggregated and groupable into measure groups
    Measure,
    /// Text, date or boolean; used for row grouping
    Dimension,
}

/// A worksheet the host can supply data for.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetInfo {
    pub name: String,
    #[serde(default)]
    pub id: String,
}

/// Payload returned by a summary-data fetch.
///
/// Every cell arrives as a pre-formatted display string.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryData {
    pub worksheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub column_types: Vec<ColumnType>,
}

/// The authoritative rectangular input to the table pipeline.
///
/// Immutable once built. A refresh produces a new `Dataset`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    column_types: Vec<ColumnType>,
    generation: u64,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(FlexTableError::Dataset(format!(
                "row {idx} has {} cells, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            column_types: Vec::new(),
            generation: 0,
        })
    }

    /// Convenience constructor from string slices, mostly for tests and benches.
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Self::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    #[must_use]
    pub fn with_column_types(mut self, column_types: Vec<ColumnType>) -> Self {
        self.column_types = column_types;
        self
    }

    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    /// Generation of the fetch that produced this dataset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text, or `""` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", String::as_str)
    }

    /// Iterate the values of one column, top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(col).map_or("", String::as_str))
    }

    /// Content classification over up to `limit` rows.
    pub fn column_kind(&self, col: usize, limit: usize) -> ColumnKind {
        let samples: Vec<&str> = self.column_values(col).take(limit).collect();
        classify_column(&samples)
    }

    /// Role from the host type when declared, otherwise from content.
    pub fn column_role(&self, col: usize) -> ColumnRole {
        let Some(name) = self.columns.get(col) else {
            return ColumnRole::Dimension;
        };
        if let Some(declared) = self.column_types.iter().find(|t| &t.name == name) {
            return match declared.data_type.to_ascii_lowercase().as_str() {
                "int" | "integer" | "float" | "real" | "number" => ColumnRole::Measure,
                _ => ColumnRole::Dimension,
            };
        }
        match self.column_kind(col, usize::MAX) {
            ColumnKind::Number => ColumnRole::Measure,
            ColumnKind::Date | ColumnKind::Text => ColumnRole::Dimension,
        }
    }

    /// Consume into the raw parts.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.columns, self.rows)
    }
}

impl TryFrom<SummaryData> for Dataset {
    type Error = FlexTableError;

    fn try_from(data: SummaryData) -> Result<Self> {
        Ok(Self::new(data.columns, data.rows)?.with_column_types(data.column_types))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Dataset::from_strs(&["A", "B"], &[&["1", "2"], &["3"]]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let ds = Dataset::from_strs(&["A"], &[&["x"]]).unwrap();
        assert_eq!(ds.cell(0, 0), "x");
        assert_eq!(ds.cell(5, 0), "");
        assert_eq!(ds.cell(0, 3), "");
    }

    #[test]
    fn test_role_prefers_host_type() {
        let ds = Dataset::from_strs(&["Code", "Amount"], &[&["001", "abc"]])
            .unwrap()
            .with_column_types(vec![
                ColumnType {
                    name: "Code".into(),
                    data_type: "string".into(),
                },
                ColumnType {
                    name: "Amount".into(),
                    data_type: "float".into(),
                },
            ]);
        assert_eq!(ds.column_role(0), ColumnRole::Dimension);
        assert_eq!(ds.column_role(1), ColumnRole::Measure);
    }

    #[test]
    fn test_role_from_content() {
        let ds = Dataset::from_strs(&["Region", "Sales"], &[&["East", "$1,200"]]).unwrap();
        assert_eq!(ds.column_role(0), ColumnRole::Dimension);
        assert_eq!(ds.column_role(1), ColumnRole::Measure);
    }

    #[test]
    fn test_summary_data_json_shape() {
        let json = r#"{"worksheetName":"Sales","columns":["A"],"rows":[["1"]],
            "columnTypes":[{"name":"A","dataType":"int"}]}"#;
        let data: SummaryData = serde_json::from_str(json).unwrap();
        let ds = Dataset::try_from(data).unwrap();
        assert_eq!(ds.column_role(0), ColumnRole::Measure);
    }
}
