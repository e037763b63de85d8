//! Minimal CSV reader producing a [`Dataset`].

use crate::error::{FlexTableError, Result};
use crate::types::Dataset;

/// Parse CSV bytes: the first non-empty line is the header row.
///
/// Rows shorter than the header are padded with empty cells, longer rows
/// are truncated. Cells are trimmed.
pub fn parse_dataset(data: &[u8]) -> Result<Dataset> {
    let raw = String::from_utf8_lossy(data);
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw.as_ref());
    let mut lines = text
        .lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| FlexTableError::Dataset("CSV input has no header row".into()))?;
    let columns: Vec<String> = split_csv_line(header, ',')
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    let width = columns.len();

    let mut ragged = 0usize;
    let rows: Vec<Vec<String>> = lines
        .map(|line| {
            let mut fields: Vec<String> = split_csv_line(line, ',')
                .into_iter()
                .map(|f| f.trim().to_string())
                .collect();
            if fields.len() != width {
                ragged += 1;
                fields.resize(width, String::new());
            }
            fields
        })
        .collect();
    if ragged > 0 {
        log::warn!("{ragged} CSV rows did not match the header width");
    }
    Dataset::new(columns, rows)
}

/// Split a CSV line respecting quoted fields.
pub(crate) fn split_csv_line(line: &str, sep: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    // Escaped quote
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == sep {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_basic() {
        let data = b"Name,Age,City\nAlice,30,NYC\nBob,25,LA";
        let ds = parse_dataset(data).unwrap();
        assert_eq!(ds.columns(), ["Name", "Age", "City"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.cell(0, 0), "Alice");
        assert_eq!(ds.cell(1, 1), "25");
    }

    #[test]
    fn test_quoted_fields() {
        let fields = split_csv_line(r#""Smith, John","say ""hi""",plain"#, ',');
        assert_eq!(fields, vec!["Smith, John", r#"say "hi""#, "plain"]);
    }

    #[test]
    fn test_crlf_and_ragged_rows() {
        let data = b"\xef\xbb\xbfA,B\r\n1\r\n2,3,4\r\n\r\n";
        let ds = parse_dataset(data).unwrap();
        assert_eq!(ds.columns(), ["A", "B"]);
        assert_eq!(ds.rows()[0], vec!["1", ""]);
        assert_eq!(ds.rows()[1], vec!["2", "3"]);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(parse_dataset(b"").is_err());
        assert!(parse_dataset(b"\n  \n").is_err());
    }
}
