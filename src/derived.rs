//! Computed commission and margin columns.

use thiserror::Error;

use crate::numfmt::format_auto;
use crate::types::{Calculation, Dataset, DerivedColumn};
use crate::value_parser::parse_number;

/// Why one derived cell could not be computed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("input column not found: {0}")]
    MissingColumn(String),

    #[error("{calculation:?} takes {expected} inputs, got {got}")]
    Arity {
        calculation: Calculation,
        expected: usize,
        got: usize,
    },

    #[error("input is not a number: {0:?}")]
    NotANumber(String),
}

/// Ratio as a percentage; a zero denominator yields 0.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole.abs() < f64::EPSILON {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Apply `calc` to already parsed inputs.
pub fn compute(calc: Calculation, inputs: &[f64]) -> Result<f64, CalcError> {
    if let Some(expected) = calc.arity() {
        if inputs.len() != expected {
            return Err(CalcError::Arity {
                calculation: calc,
                expected,
                got: inputs.len(),
            });
        }
    }
    let a = inputs.first().copied().unwrap_or(0.0);
    let b = inputs.get(1).copied().unwrap_or(0.0);
    Ok(match calc {
        Calculation::CommissionPercent | Calculation::MarginPercent => percent_of(a, b),
        Calculation::CommissionAmount
        | Calculation::PayoutAmount
        | Calculation::OverrideAmount => a * b / 100.0,
        Calculation::NetRevenue | Calculation::GrossMargin => a - b,
        Calculation::TotalCompensation => inputs.iter().sum(),
    })
}

/// Compute one cell of `column` for `row`.
fn compute_cell(
    dataset: &Dataset,
    column: &DerivedColumn,
    row: usize,
) -> Result<f64, CalcError> {
    let mut values = Vec::with_capacity(column.inputs.len());
    for input in &column.inputs {
        let col = dataset
            .column_index(input)
            .ok_or_else(|| CalcError::MissingColumn(input.clone()))?;
        let text = dataset.cell(row, col);
        let value = match (parse_number(text), column.calculation) {
            (Some(v), _) => v,
            // Totals skip blanks and junk
            (None, Calculation::TotalCompensation) => 0.0,
            (None, _) => return Err(CalcError::NotANumber(text.to_string())),
        };
        values.push(value);
    }
    compute(column.calculation, &values)
}

/// Append every derived column, left to right. A later column may use an
/// earlier one as input. Cells that fail to compute are blank.
pub fn append_derived_columns(dataset: &Dataset, columns: &[DerivedColumn]) -> Dataset {
    let mut current = dataset.clone();
    for column in columns {
        if current.column_index(&column.name).is_some() {
            log::warn!("derived column {} shadows an existing column, skipped", column.name);
            continue;
        }
        let mut failures = 0usize;
        let values: Vec<String> = (0..current.row_count())
            .map(|row| match compute_cell(&current, column, row) {
                Ok(v) => format_auto(v),
                Err(err) => {
                    failures += 1;
                    log::trace!("{}: row {row}: {err}", column.name);
                    String::new()
                }
            })
            .collect();
        if failures > 0 {
            log::debug!("{}: {failures} cells left blank", column.name);
        }

        let generation = current.generation();
        let types = current.column_types().to_vec();
        let (mut names, mut rows) = current.into_parts();
        names.push(column.name.clone());
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
        current = match Dataset::new(names, rows) {
            Ok(ds) => ds.with_column_types(types).with_generation(generation),
            Err(err) => {
                log::error!("derived column {}: {err}", column.name);
                return dataset.clone();
            }
        };
    }
    current
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
    use test_case::test_case;

    #[test_case(Calculation::CommissionPercent, &[250.0, 1000.0], 25.0; "commission percent")]
    #[test_case(Calculation::CommissionPercent, &[50.0, 0.0], 0.0; "percent of zero revenue")]
    #[test_case(Calculation::CommissionAmount, &[1000.0, 5.0], 50.0; "commission amount")]
    #[test_case(Calculation::NetRevenue, &[1000.0, 300.0], 700.0; "net revenue")]
    #[test_case(Calculation::GrossMargin, &[800.0, 500.0], 300.0; "gross margin")]
    #[test_case(Calculation::MarginPercent, &[300.0, 1200.0], 25.0; "margin percent")]
    #[test_case(Calculation::PayoutAmount, &[200.0, 50.0], 100.0; "payout")]
    #[test_case(Calculation::OverrideAmount, &[400.0, 10.0], 40.0; "override")]
    #[test_case(Calculation::TotalCompensation, &[1.0, 2.0, 3.5], 6.5; "total")]
    fn test_compute(calc: Calculation, inputs: &[f64], expected: f64) {
        assert_eq!(compute(calc, inputs).unwrap(), expected);
    }

    #[test]
    fn test_arity_checked() {
        let err = compute(Calculation::NetRevenue, &[1.0]).unwrap_err();
        assert!(matches!(err, CalcError::Arity { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_append_blanks_failed_cells() {
        let ds = Dataset::from_strs(
            &["Rep", "Revenue", "Cost"],
            &[&["A", "$1,000", "250"], &["B", "n/a", "10"]],
        )
        .unwrap()
        .with_generation(3);
        let net = DerivedColumn {
            name: "Net".into(),
            calculation: Calculation::NetRevenue,
            inputs: vec!["Revenue".into(), "Cost".into()],
        };
        let missing = DerivedColumn {
            name: "Broken".into(),
            calculation: Calculation::GrossMargin,
            inputs: vec!["Revenue".into(), "COGS".into()],
        };
        let out = append_derived_columns(&ds, &[net, missing]);
        assert_eq!(out.columns(), ["Rep", "Revenue", "Cost", "Net", "Broken"]);
        assert_eq!(out.cell(0, 3), "750");
        assert_eq!(out.cell(1, 3), "");
        assert_eq!(out.cell(0, 4), "");
        assert_eq!(out.generation(), 3);
    }

    #[test]
    fn test_chained_and_total_skips_junk() {
        let ds = Dataset::from_strs(&["Base", "Bonus"], &[&["100", "x"]]).unwrap();
        let cols = [
            DerivedColumn {
                name: "Total".into(),
                calculation: Calculation::TotalCompensation,
                inputs: vec!["Base".into(), "Bonus".into()],
            },
            DerivedColumn {
                name: "Payout".into(),
                calculation: Calculation::PayoutAmount,
                inputs: vec!["Total".into(), "50".into()],
            },
        ];
        let out = append_derived_columns(&ds, &cols);
        assert_eq!(out.cell(0, 2), "100");
        // "50" is not a column
        assert_eq!(out.cell(0, 3), "");
    }
}
