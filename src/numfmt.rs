//! Number format application
//!
//! Values reach the table as host display strings. Once parsed, they are
//! re-rendered through one of six presentation types:
//! - `auto`: host text is kept; sums get grouping and up to 3 decimals
//! - `number`, `currency`: fixed decimals with a negative style
//! - `percentage`: the value is already in percent units (`12.3` -> `12.30%`)
//! - `accounting`: `(N)` for negatives, ` N ` for positives
//! - `scientific`: `1.23e+4`

use crate::types::{NegativeStyle, NumberFormat, NumberFormatType};

/// Colour hint used by the `red` negative style.
pub const NEGATIVE_RED: &str = "#d32f2f";

/// Maximum fraction digits shown for `auto` sums.
const AUTO_MAX_DECIMALS: usize = 3;

/// Result of formatting a value, including optional color
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedValue {
    /// The formatted text
    pub text: String,
    /// Optional color in #RRGGBB format
    pub color: Option<String>,
}

impl FormattedValue {
    /// Create a new FormattedValue with just text
    pub fn new(text: String) -> Self {
        Self { text, color: None }
    }

    /// Create a new FormattedValue with text and color
    pub fn with_color(text: String, color: String) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}

/// Symbol for an ISO currency code; unknown codes render as `"CODE "`.
pub fn currency_symbol(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" | "CNY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        other => format!("{other} "),
    }
}

/// Format a value with the given (already merged) number format.
pub fn format_number(value: f64, fmt: &NumberFormat) -> FormattedValue {
    let decimals = usize::from(fmt.decimals);
    let body = |v: f64| {
        if fmt.thousands_separator {
            format_with_thousands(v, decimals)
        } else {
            format!("{v:.decimals$}")
        }
    };

    let formatted = match fmt.kind {
        NumberFormatType::Auto => FormattedValue::new(format_auto(value)),
        NumberFormatType::Number => apply_negative(&body(value.abs()), value, fmt.negative_numbers),
        NumberFormatType::Currency => {
            let text = format!("{}{}", currency_symbol(&fmt.currency), body(value.abs()));
            apply_negative(&text, value, fmt.negative_numbers)
        }
        NumberFormatType::Percentage => {
            // value / 100 shown as a percent is the value itself
            FormattedValue::new(format!("{}%", body(value)))
        }
        NumberFormatType::Accounting => {
            let text = body(value.abs());
            if is_visibly_negative(value, &text) {
                FormattedValue::new(format!("({text})"))
            } else {
                FormattedValue::new(format!(" {text} "))
            }
        }
        NumberFormatType::Scientific => FormattedValue::new(format_scientific(value, decimals)),
    };

    if fmt.prefix.is_empty() && fmt.suffix.is_empty() {
        return formatted;
    }
    FormattedValue {
        text: format!("{}{}{}", fmt.prefix, formatted.text, fmt.suffix),
        color: formatted.color,
    }
}

/// A negative value that rounds to zero is shown without a sign.
fn is_visibly_negative(value: f64, text: &str) -> bool {
    value < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0')
}

fn apply_negative(abs_text: &str, value: f64, style: NegativeStyle) -> FormattedValue {
    if !is_visibly_negative(value, abs_text) {
        return FormattedValue::new(abs_text.to_string());
    }
    match style {
        NegativeStyle::Minus => FormattedValue::new(format!("-{abs_text}")),
        NegativeStyle::Parentheses => FormattedValue::new(format!("({abs_text})")),
        NegativeStyle::Red => {
            FormattedValue::with_color(format!("-{abs_text}"), NEGATIVE_RED.to_string())
        }
    }
}

/// Grouped with at most three fraction digits, trailing zeros trimmed.
pub fn format_auto(value: f64) -> String {
    let s = format_with_thousands(value, AUTO_MAX_DECIMALS);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Scientific notation in the `1.23e+4` style.
pub fn format_scientific(value: f64, decimals: usize) -> String {
    let raw = format!("{value:.decimals$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{mantissa}e{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}e+{exp}"),
        None => raw,
    }
}

/// Format a number with `,` grouping and fixed decimals.
pub fn format_with_thousands(value: f64, decimals: usize) -> String {
    let is_negative = value < 0.0;
    let abs_value = value.abs();

    let formatted = format!("{:.prec$}", abs_value, prec = decimals.min(10));
    let (int_part, dec_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    let mut with_sep = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_sep.push(',');
        }
        with_sep.push(c);
    }
    let int_with_sep: String = with_sep.chars().rev().collect();

    let result = match dec_part {
        Some(dec) => format!("{int_with_sep}.{dec}"),
        None => int_with_sep,
    };

    if is_negative {
        format!("-{result}")
    } else {
        result
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn fmt(kind: NumberFormatType) -> NumberFormat {
        NumberFormat {
            kind,
            ..NumberFormat::default()
        }
    }

    #[test]
    fn test_currency_usd() {
        let f = NumberFormat {
            decimals: 2,
            thousands_separator: true,
            ..fmt(NumberFormatType::Currency)
        };
        assert_eq!(format_number(12345.6, &f).text, "$12,345.60");
    }

    #[test]
    fn test_number_parentheses() {
        let f = NumberFormat {
            decimals: 0,
            negative_numbers: NegativeStyle::Parentheses,
            ..fmt(NumberFormatType::Number)
        };
        assert_eq!(format_number(-42.0, &f).text, "(42)");
    }

    #[test]
    fn test_percentage_is_percent_units() {
        let f = NumberFormat {
            decimals: 1,
            ..fmt(NumberFormatType::Percentage)
        };
        assert_eq!(format_number(12.3, &f).text, "12.3%");
        let f = fmt(NumberFormatType::Percentage);
        assert_eq!(format_number(12.3, &f).text, "12.30%");
    }

    #[test_case(NegativeStyle::Minus, "-$5.00", None; "minus")]
    #[test_case(NegativeStyle::Parentheses, "($5.00)", None; "parens")]
    #[test_case(NegativeStyle::Red, "-$5.00", Some(NEGATIVE_RED); "red")]
    fn test_negative_currency(style: NegativeStyle, text: &str, color: Option<&str>) {
        let f = NumberFormat {
            negative_numbers: style,
            ..fmt(NumberFormatType::Currency)
        };
        let out = format_number(-5.0, &f);
        assert_eq!(out.text, text);
        assert_eq!(out.color.as_deref(), color);
    }

    #[test]
    fn test_accounting() {
        let f = fmt(NumberFormatType::Accounting);
        assert_eq!(format_number(-1234.5, &f).text, "(1,234.50)");
        assert_eq!(format_number(1234.5, &f).text, " 1,234.50 ");
    }

    #[test]
    fn test_negative_rounding_to_zero_has_no_sign() {
        let f = NumberFormat {
            negative_numbers: NegativeStyle::Minus,
            ..fmt(NumberFormatType::Number)
        };
        assert_eq!(format_number(-0.001, &f).text, "0.00");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(format_scientific(12345.6, 2), "1.23e+4");
        assert_eq!(format_scientific(0.000123, 1), "1.2e-4");
        assert_eq!(format_scientific(-5.0, 0), "-5e+0");
    }

    #[test]
    fn test_auto() {
        assert_eq!(format_auto(300.0), "300");
        assert_eq!(format_auto(1234.5), "1,234.5");
        assert_eq!(format_auto(0.12345), "0.123");
        assert_eq!(format_auto(-1_000_000.0), "-1,000,000");
        assert_eq!(format_auto(-0.0001), "0");
    }

    #[test]
    fn test_prefix_suffix() {
        let f = NumberFormat {
            decimals: 0,
            prefix: "~".into(),
            suffix: " units".into(),
            ..fmt(NumberFormatType::Number)
        };
        assert_eq!(format_number(1500.0, &f).text, "~1,500 units");
    }

    #[test]
    fn test_no_thousands_separator() {
        let f = NumberFormat {
            thousands_separator: false,
            ..fmt(NumberFormatType::Number)
        };
        assert_eq!(format_number(1234.5, &f).text, "1234.50");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(format_with_thousands(1_234_567.89, 2), "1,234,567.89");
        assert_eq!(format_with_thousands(999.0, 0), "999");
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(currency_symbol("eur"), "€");
        assert_eq!(currency_symbol("CHF"), "CHF ");
    }
}
