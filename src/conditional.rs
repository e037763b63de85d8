//! Conditional formatting rule evaluation.
//!
//! Every matching rule applies in declaration order; later rules overwrite
//! earlier ones for the same property.

use crate::types::{ConditionalRule, RuleCondition, RuleEffect};

/// Visual effects resolved for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellEffect {
    pub background: Option<String>,
    pub text_color: Option<String>,
    /// CSS gradient for a data bar
    pub data_bar: Option<String>,
    /// Leading glyph
    pub icon: Option<String>,
}

impl CellEffect {
    pub fn is_empty(&self) -> bool {
        self.background.is_none()
            && self.text_color.is_none()
            && self.data_bar.is_none()
            && self.icon.is_none()
    }
}

/// True if `rule` targets `column` and `value` satisfies its condition.
#[allow(clippy::float_cmp)]
pub fn rule_matches(rule: &ConditionalRule, column: usize, value: f64) -> bool {
    if rule.column_index.is_some_and(|c| c != column) {
        return false;
    }
    match rule.condition {
        RuleCondition::GreaterThan => value > rule.value,
        RuleCondition::LessThan => value < rule.value,
        RuleCondition::EqualTo => value == rule.value,
        RuleCondition::Between => {
            let Some(max) = rule.max_value else {
                return false;
            };
            let (lo, hi) = if rule.value > max {
                (max, rule.value)
            } else {
                (rule.value, max)
            };
            value >= lo && value <= hi
        }
    }
}

/// Fill fraction `min(value / max, 1)`, never below zero.
pub fn data_bar_fraction(value: f64, max_value: Option<f64>) -> f64 {
    match max_value {
        Some(max) if max > 0.0 => (value / max).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

/// Left-to-right gradient filling `fraction` of the cell.
pub fn data_bar_gradient(color: &str, fraction: f64) -> String {
    let pct = (fraction * 100.0).clamp(0.0, 100.0);
    format!("linear-gradient(90deg, {color} {pct:.1}%, transparent {pct:.1}%)")
}

/// Resolve all rules for one cell.
pub fn evaluate_rules(rules: &[ConditionalRule], column: usize, value: f64) -> CellEffect {
    let mut effect = CellEffect::default();
    for rule in rules.iter().filter(|r| rule_matches(r, column, value)) {
        match rule.effect {
            RuleEffect::BackgroundColor => effect.background = Some(rule.color.clone()),
            RuleEffect::TextColor => effect.text_color = Some(rule.color.clone()),
            RuleEffect::DataBar => {
                let fraction = data_bar_fraction(value, rule.max_value);
                effect.data_bar = Some(data_bar_gradient(&rule.color, fraction));
            }
            RuleEffect::IconSet => {
                effect.icon = Some(rule.icon.clone().unwrap_or_else(|| "\u{25cf}".to_string()));
            }
        }
    }
    effect
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

    fn rule(condition: RuleCondition, value: f64, effect: RuleEffect) -> ConditionalRule {
        ConditionalRule {
            column_index: None,
            condition,
            value,
            max_value: None,
            effect,
            color: "#ff0000".to_string(),
            icon: None,
        }
    }

    #[test]
    fn test_equal_to_compares_large_values_exactly() {
        let r = rule(RuleCondition::EqualTo, 1e6, RuleEffect::TextColor);
        assert!(rule_matches(&r, 0, 1_000_000.0));
        assert!(!rule_matches(&r, 0, 1_000_000.5));
        assert!(!rule_matches(&r, 0, 999_999.999));

        let tiny = rule(RuleCondition::EqualTo, 1e-20, RuleEffect::TextColor);
        assert!(rule_matches(&tiny, 0, 1e-20));
        assert!(!rule_matches(&tiny, 0, 2e-20));
    }

    #[test]
    fn test_column_targeting() {
        let mut r = rule(RuleCondition::GreaterThan, 10.0, RuleEffect::TextColor);
        assert!(rule_matches(&r, 3, 11.0));
        r.column_index = Some(2);
        assert!(!rule_matches(&r, 3, 11.0));
        assert!(rule_matches(&r, 2, 11.0));
    }

    #[test]
    fn test_between_needs_max() {
        let mut r = rule(RuleCondition::Between, 20.0, RuleEffect::BackgroundColor);
        assert!(!rule_matches(&r, 0, 15.0));
        r.max_value = Some(10.0);
        assert!(rule_matches(&r, 0, 10.0));
        assert!(rule_matches(&r, 0, 20.0));
        assert!(!rule_matches(&r, 0, 20.5));
    }

    #[test]
    fn test_last_rule_wins() {
        let mut second = rule(RuleCondition::GreaterThan, 0.0, RuleEffect::BackgroundColor);
        second.color = "#00ff00".to_string();
        let rules = vec![
            rule(RuleCondition::GreaterThan, 0.0, RuleEffect::BackgroundColor),
            second,
            rule(RuleCondition::EqualTo, 5.0, RuleEffect::TextColor),
        ];
        let effect = evaluate_rules(&rules, 0, 5.0);
        assert_eq!(effect.background.as_deref(), Some("#00ff00"));
        assert_eq!(effect.text_color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_data_bar_fraction() {
        assert_eq!(data_bar_fraction(50.0, Some(200.0)), 0.25);
        assert_eq!(data_bar_fraction(500.0, Some(200.0)), 1.0);
        assert_eq!(data_bar_fraction(-5.0, Some(200.0)), 0.0);
        assert_eq!(data_bar_fraction(5.0, None), 1.0);
        assert_eq!(
            data_bar_gradient("#638ec6", 0.25),
            "linear-gradient(90deg, #638ec6 25.0%, transparent 25.0%)"
        );
    }

    #[test]
    fn test_icon_default_glyph() {
        let rules = vec![rule(RuleCondition::LessThan, 0.0, RuleEffect::IconSet)];
        assert_eq!(evaluate_rules(&rules, 0, -1.0).icon.as_deref(), Some("\u{25cf}"));
        assert!(evaluate_rules(&rules, 0, 1.0).is_empty());
    }
}
