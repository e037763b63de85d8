//! Display-string coercion.
//!
//! Every cell reaches the pipeline as text already formatted by the host, so
//! numeric and date operations parse on demand. Parse failures are `None`,
//! never errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Likely content type of a column
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Number,
    Date,
    Text,
}

/// Characters dropped before numeric parsing.
const STRIPPED: [char; 7] = [',', '%', '$', '£', '€', '₹', '¥'];

/// Parse a display string as a number.
///
/// Thousands separators, whitespace, `%` and currency symbols are removed,
/// U+2212 is read as a minus sign and `(N)` as `-N`.
pub fn parse_number(display: &str) -> Option<f64> {
    let trimmed = display.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negate, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !STRIPPED.contains(c) && !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negate { -value } else { value })
}

/// Formats tried in order for strings that start with a four-digit year.
const YEAR_FIRST_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const YEAR_FIRST_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];
/// Month-name formats, e.g. `Jan 5, 2024` or `5 January 2024`.
const NAMED_MONTH_FORMATS: [&str; 4] = ["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

/// Parse a display string as a calendar date; time of day is discarded.
pub fn parse_date(display: &str) -> Option<NaiveDate> {
    let s = display.trim();
    if s.is_empty() {
        return None;
    }

    if starts_with_year(s) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        for fmt in YEAR_FIRST_DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        }
        for fmt in YEAR_FIRST_DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(d);
            }
        }
        return None;
    }

    if s.starts_with(|c: char| c.is_ascii_alphabetic()) || s.contains(' ') {
        for fmt in NAMED_MONTH_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(d);
            }
        }
    }

    // "1/5/2024 12:00:00 AM": keep the date token only
    let date_token = s.split_whitespace().next().unwrap_or(s);
    parse_numeric_date(date_token)
}

fn starts_with_year(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 5
        && bytes.iter().take(4).all(u8::is_ascii_digit)
        && bytes.get(4).is_some_and(|b| !b.is_ascii_digit())
}

/// `M/D/Y` or `D/M/Y` with `/` or `-`; month-first wins when both are valid.
fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    let [a, b, y] = parts.as_slice() else {
        return None;
    };
    if !(1..=2).contains(&a.len()) || !(1..=2).contains(&b.len()) || !(2..=4).contains(&y.len())
    {
        return None;
    }
    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    let mut year: i32 = y.parse().ok()?;
    if y.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, a, b).or_else(|| NaiveDate::from_ymd_opt(year, b, a))
}

/// Classify a column from sample values.
///
/// Over non-empty samples: at least 60% numbers is `Number` (checked first),
/// otherwise at least 60% dates is `Date`, otherwise `Text`.
pub fn classify_column<S: AsRef<str>>(samples: &[S]) -> ColumnKind {
    let mut non_empty = 0usize;
    let mut numbers = 0usize;
    let mut dates = 0usize;
    for sample in samples {
        let s = sample.as_ref().trim();
        if s.is_empty() {
            continue;
        }
        non_empty += 1;
        if parse_number(s).is_some() {
            numbers += 1;
        } else if parse_date(s).is_some() {
            dates += 1;
        }
    }
    if non_empty == 0 {
        return ColumnKind::Text;
    }
    if numbers * 5 >= non_empty * 3 {
        ColumnKind::Number
    } else if dates * 5 >= non_empty * 3 {
        ColumnKind::Date
    } else {
        ColumnKind::Text
    }
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

    #[test_case("1,234.5", Some(1234.5); "thousands")]
    #[test_case("$1,200", Some(1200.0); "dollar")]
    #[test_case("€ 3", Some(3.0); "euro with space")]
    #[test_case("12.5%", Some(12.5); "percent keeps magnitude")]
    #[test_case("\u{2212}7", Some(-7.0); "unicode minus")]
    #[test_case("(42)", Some(-42.0); "parentheses")]
    #[test_case("1e3", Some(1000.0); "exponent")]
    #[test_case("", None; "empty")]
    #[test_case("   ", None; "blank")]
    #[test_case("abc", None; "text")]
    #[test_case("$", None; "symbol only")]
    #[test_case("inf", None; "infinite")]
    #[test_case("NaN", None; "nan")]
    fn test_parse_number(input: &str, expected: Option<f64>) {
        assert_eq!(parse_number(input), expected);
    }

    #[test]
    fn test_parse_date_iso() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(d));
        assert_eq!(parse_date("2024-03-15T13:45:00"), Some(d));
        assert_eq!(parse_date("2024-03-15T23:59:59Z"), Some(d));
        assert_eq!(parse_date("2024/03/15"), Some(d));
    }

    #[test]
    fn test_parse_date_named_month() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("Jan 5, 2024"), Some(d));
        assert_eq!(parse_date("January 5, 2024"), Some(d));
        assert_eq!(parse_date("5 Jan 2024"), Some(d));
    }

    #[test]
    fn test_parse_date_month_first_then_day_first() {
        assert_eq!(
            parse_date("03/04/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
        // 25 cannot be a month
        assert_eq!(
            parse_date("25/12/2023"),
            NaiveDate::from_ymd_opt(2023, 12, 25)
        );
        assert_eq!(parse_date("1-2-24"), NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_parse_date_discards_time() {
        assert_eq!(
            parse_date("1/5/2024 12:00:00 AM"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_parse_date_rejects() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("East"), None);
        assert_eq!(parse_date("13/13/2024"), None);
        assert_eq!(parse_date("2024"), None);
    }

    #[test]
    fn test_classify_column() {
        assert_eq!(classify_column(&["1", "2", "x", ""]), ColumnKind::Number);
        assert_eq!(
            classify_column(&["2024-01-01", "2024-02-01", "n/a"]),
            ColumnKind::Date
        );
        assert_eq!(classify_column(&["a", "b", "1"]), ColumnKind::Text);
        assert_eq!(classify_column::<&str>(&[]), ColumnKind::Text);
        assert_eq!(classify_column(&["", " "]), ColumnKind::Text);
    }

    #[test]
    fn test_numbers_take_priority_over_dates() {
        // Bare numbers never parse as dates, but the order is still checked.
        assert_eq!(classify_column(&["1", "2", "3"]), ColumnKind::Number);
    }
}
