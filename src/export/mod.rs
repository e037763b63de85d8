//! CSV and configuration export.
//!
//! Two CSV flavours are produced:
//! - [`visible_csv`]: what the user sees, taken from the rendered table
//! - [`raw_csv`]: the source dataset, untouched
//!
//! Grouping configuration is exchanged as versioned JSON through
//! [`export_config`] and [`import_config`].

use crate::error::{FlexTableError, Result};
use crate::render::RenderedTable;
use crate::types::{Dataset, ExportedConfig, MeasureGroup, CONFIG_VERSION};

/// Quote a field, doubling embedded quotes.
pub fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(csv_escape)
        .collect::<Vec<_>>()
        .join(",")
}

/// Column header row and visible body rows, skipping hidden cells.
pub fn visible_csv(table: &RenderedTable) -> String {
    let mut lines = Vec::with_capacity(table.body.len() + 1);
    let rows = table
        .header
        .last()
        .into_iter()
        .chain(table.body.iter().filter(|r| !r.hidden));
    for row in rows {
        lines.push(csv_line(
            row.cells
                .iter()
                .zip(&table.slots)
                .filter(|(cell, slot)| !cell.hidden && !slot.hidden)
                .map(|(cell, _)| cell.text.trim()),
        ));
    }
    lines.join("\n")
}

/// Source columns and rows exactly as the host supplied them.
pub fn raw_csv(dataset: &Dataset) -> String {
    std::iter::once(csv_line(dataset.columns().iter().map(String::as_str)))
        .chain(
            dataset
                .rows()
                .iter()
                .map(|row| csv_line(row.iter().map(String::as_str))),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize the grouping configuration as pretty JSON.
///
/// `exported_at` is an ISO-8601 timestamp supplied by the caller.
pub fn export_config(
    groups: &[MeasureGroup],
    pivot_state: &[(String, bool)],
    exported_at: &str,
) -> Result<String> {
    let config = ExportedConfig {
        version: CONFIG_VERSION.to_string(),
        export_date: exported_at.to_string(),
        measure_groups: groups.to_vec(),
        pivot_state: pivot_state.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&config)?)
}

/// Parse and validate a configuration file. Only `1.x` versions are accepted.
pub fn import_config(text: &str) -> Result<ExportedConfig> {
    let config: ExportedConfig = serde_json::from_str(text)
        .map_err(|e| FlexTableError::Config(format!("invalid configuration file: {e}")))?;
    let major = config.version.split('.').next().unwrap_or_default();
    if major != "1" {
        return Err(FlexTableError::Config(format!(
            "unsupported configuration version {}",
            config.version
        )));
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::formatter::TableFormatter;
    use crate::measure_grouping::MeasureGroupingModel;
    use crate::pivot::PivotGroupingModel;
    use crate::render::TableRenderer;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "\"plain\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape(""), "\"\"");
    }

    #[test]
    fn test_raw_csv() {
        let ds = Dataset::from_strs(&["A", "B"], &[&["1", "x,y"]]).unwrap();
        assert_eq!(raw_csv(&ds), "\"A\",\"B\"\n\"1\",\"x,y\"");
    }

    #[test]
    fn test_visible_csv_skips_hidden() {
        let ds = Dataset::from_strs(&["A", "B"], &[&["1", "2"], &["3", "4"]]).unwrap();
        let mut table = TableRenderer::new().render(
            &ds,
            &[],
            &PivotGroupingModel::new(),
            &MeasureGroupingModel::new(),
            &TableFormatter::default(),
        );
        table.apply_visibility(&[false, true]);
        assert_eq!(visible_csv(&table), "\"A\",\"B\"\n\"3\",\"4\"");
    }

    #[test]
    fn test_config_version_checked() {
        let json = export_config(&[], &[("East".into(), false)], "2024-05-01T00:00:00Z").unwrap();
        let back = import_config(&json).unwrap();
        assert_eq!(back.pivot_state, vec![("East".to_string(), false)]);

        let future = json.replace("\"1.0\"", "\"2.0\"");
        assert!(matches!(import_config(&future), Err(FlexTableError::Config(_))));
        assert!(import_config("{ nope").is_err());
    }
}
