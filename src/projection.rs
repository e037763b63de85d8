//! Structural column projection applied before rendering.
//!
//! Turns the source dataset into the view dataset: user column order,
//! measure-group clustering, and removal of hidden dimension columns.
//! When a dimension is hidden the remaining rows are re-aggregated by the
//! visible dimensions so that measures are summed rather than repeated.
//!
//! The pivot hierarchy is detected on the marks-card order and always leads
//! the view; user order and clustering only rearrange the columns after it.

use std::collections::HashMap;

use crate::controllers::Controllers;
use crate::error::Result;
use crate::measure_grouping::MeasureGroupingModel;
use crate::numfmt::format_auto;
use crate::pivot::hierarchy_columns;
use crate::types::{ColumnRole, Dataset};
use crate::value_parser::parse_number;

/// The view dataset and the pivot hierarchy within it.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub view: Dataset,
    /// Leading view columns used for row grouping
    pub hierarchy: Vec<usize>,
}

/// Build the view dataset for one render.
pub fn project(
    dataset: &Dataset,
    controllers: &Controllers,
    groups: &MeasureGroupingModel,
) -> Result<Projection> {
    let roles: Vec<ColumnRole> = (0..dataset.column_count())
        .map(|c| dataset.column_role(c))
        .collect();
    let hidden_dimensions: Vec<usize> = (0..dataset.column_count())
        .filter(|&c| {
            roles.get(c) == Some(&ColumnRole::Dimension)
                && dataset
                    .columns()
                    .get(c)
                    .is_some_and(|name| controllers.columns.is_hidden(name))
        })
        .collect();

    let source = if hidden_dimensions.is_empty() {
        None
    } else {
        log::debug!(
            "aggregating by visible dimensions, {} hidden",
            hidden_dimensions.len()
        );
        Some(aggregate_by_dimensions(dataset, &roles, &hidden_dimensions)?)
    };
    let source = source.as_ref().unwrap_or(dataset);

    let dropped: Vec<&String> = hidden_dimensions
        .iter()
        .filter_map(|&c| dataset.columns().get(c))
        .collect();
    let visible: Vec<String> = source
        .columns()
        .iter()
        .filter(|name| !dropped.contains(name))
        .cloned()
        .collect();
    let natural = select_columns(source, &visible)?;

    let pinned: Vec<String> = hierarchy_columns(&natural)
        .into_iter()
        .filter_map(|c| natural.columns().get(c).cloned())
        .collect();
    let rest: Vec<String> = controllers
        .reorder
        .resolve(natural.columns())
        .into_iter()
        .filter(|name| !pinned.contains(name))
        .collect();
    let mut order = pinned.clone();
    order.extend(groups.cluster_columns(&rest));

    Ok(Projection {
        view: select_columns(&natural, &order)?,
        hierarchy: (0..pinned.len()).collect(),
    })
}

/// Reduce `dataset` to one row per distinct combination of the visible
/// dimension values. Measures are summed; a measure with no parseable cell
/// in a group is left blank. Hidden dimension cells are cleared.
fn aggregate_by_dimensions(
    dataset: &Dataset,
    roles: &[ColumnRole],
    hidden: &[usize],
) -> Result<Dataset> {
    let keys: Vec<usize> = (0..dataset.column_count())
        .filter(|c| roles.get(*c) == Some(&ColumnRole::Dimension) && !hidden.contains(c))
        .collect();

    let mut order: Vec<Vec<usize>> = Vec::new();
    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    for row in 0..dataset.row_count() {
        let key: Vec<&str> = keys.iter().map(|&c| dataset.cell(row, c)).collect();
        match index.get(&key).and_then(|&i| order.get_mut(i)) {
            Some(members) => members.push(row),
            None => {
                index.insert(key, order.len());
                order.push(vec![row]);
            }
        }
    }

    let rows = order
        .iter()
        .map(|members| {
            (0..dataset.column_count())
                .map(|col| {
                    if hidden.contains(&col) {
                        return String::new();
                    }
                    match roles.get(col) {
                        Some(ColumnRole::Measure) => members
                            .iter()
                            .filter_map(|&r| parse_number(dataset.cell(r, col)))
                            .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v))
                            .map(format_auto)
                            .unwrap_or_default(),
                        _ => members
                            .first()
                            .map(|&r| dataset.cell(r, col).to_string())
                            .unwrap_or_default(),
                    }
                })
                .collect()
        })
        .collect();

    Ok(Dataset::new(dataset.columns().to_vec(), rows)?
        .with_column_types(dataset.column_types().to_vec())
        .with_generation(dataset.generation()))
}

/// Copy `names` out of `dataset`, in that order. Unknown names are skipped.
fn select_columns(dataset: &Dataset, names: &[String]) -> Result<Dataset> {
    let picks: Vec<usize> = names
        .iter()
        .filter_map(|name| dataset.column_index(name))
        .collect();
    let columns = picks
        .iter()
        .filter_map(|&c| dataset.columns().get(c).cloned())
        .collect();
    let rows = dataset
        .rows()
        .iter()
        .map(|row| {
            picks
                .iter()
                .map(|&c| row.get(c).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    let types = dataset
        .column_types()
        .iter()
        .filter(|t| names.contains(&t.name))
        .cloned()
        .collect();
    Ok(Dataset::new(columns, rows)?
        .with_column_types(types)
        .with_generation(dataset.generation()))
}
