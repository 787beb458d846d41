// Budget, client-spend, and hires-count parsers for raw job listing text.

use crate::models::{BudgetInfo, BudgetType};
use regex::Regex;
use std::sync::OnceLock;

fn range_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?([\d,]+(?:\.\d{2})?)\s*-\s*\$?([\d,]+(?:\.\d{2})?)").unwrap()
    })
}

fn single_amount_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$?([\d,]+(?:\.\d{2})?)").unwrap())
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Parse a free-form budget string like `"Fixed-price: $1,000 - $2,500"` or
/// `"$25.00-$50.00/hr"` into `{type, min, max}`, per the classification
/// rules: `/hr`/"hourly" → hourly; "fixed"/"budget" → fixed; a lone amount
/// ≥ $200 → fixed, else hourly; no digits → unknown.
pub fn parse_budget(budget_text: &str) -> BudgetInfo {
    if budget_text.trim().is_empty() {
        return BudgetInfo::default();
    }

    let lower = budget_text.to_lowercase();

    let (budget_type, bounds_source): (BudgetType, &str) =
        if lower.contains("/hr") || lower.contains("hourly") {
            (BudgetType::Hourly, budget_text)
        } else if lower.contains("fixed") || lower.contains("budget") {
            (BudgetType::Fixed, budget_text)
        } else {
            match single_amount_pattern()
                .captures(budget_text)
                .and_then(|c| parse_amount(&c[1]))
            {
                Some(value) if value >= 200.0 => (BudgetType::Fixed, budget_text),
                Some(_) => (BudgetType::Hourly, budget_text),
                None => return BudgetInfo {
                    budget_type: Some(BudgetType::Unknown),
                    budget_min: None,
                    budget_max: None,
                },
            }
        };

    let (min, max) = if let Some(caps) = range_pattern().captures(bounds_source) {
        (parse_amount(&caps[1]), parse_amount(&caps[2]))
    } else if let Some(caps) = single_amount_pattern().captures(bounds_source) {
        let value = parse_amount(&caps[1]);
        (value, value)
    } else {
        (None, None)
    };

    if min.is_none() && max.is_none() {
        return BudgetInfo {
            budget_type: Some(BudgetType::Unknown),
            budget_min: None,
            budget_max: None,
        };
    }

    BudgetInfo {
        budget_type: Some(budget_type),
        budget_min: min,
        budget_max: max,
    }
}

/// Render a `BudgetInfo` back into a free-form string that `parse_budget`
/// round-trips on, for the property test in spec §8.
pub fn render_budget(budget: &BudgetInfo) -> String {
    match (budget.budget_type, budget.budget_min, budget.budget_max) {
        (Some(BudgetType::Hourly), Some(min), Some(max)) if min != max => {
            format!("${min:.2}-${max:.2}/hr")
        }
        (Some(BudgetType::Hourly), Some(min), _) => format!("${min:.2}/hr"),
        (Some(BudgetType::Fixed), Some(min), Some(max)) if min != max => {
            format!("Fixed: ${min:.2}-${max:.2}")
        }
        (Some(BudgetType::Fixed), Some(min), _) => format!("Fixed: ${min:.2}"),
        _ => String::new(),
    }
}

/// Parse a client's lifetime spend string (`"$1.5M"`, `"$10K"`, `"$50,000"`)
/// into its raw form and the numeric value with K/M multipliers applied.
pub fn parse_spend(spent_text: &str) -> (Option<String>, Option<f64>) {
    if spent_text.trim().is_empty() {
        return (None, None);
    }

    let cleaned = spent_text.trim().to_uppercase();
    let re = {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\$?([\d,]+(?:\.\d+)?)\s*(K|M)?").unwrap())
    };

    if let Some(caps) = re.captures(&cleaned) {
        if let Some(value) = parse_amount(&caps[1]) {
            let multiplier = caps.get(2).map(|m| m.as_str());
            let scaled = match multiplier {
                Some("K") => value * 1_000.0,
                Some("M") => value * 1_000_000.0,
                _ => value,
            };
            return (Some(spent_text.trim().to_string()), Some(scaled));
        }
    }

    (Some(spent_text.trim().to_string()), None)
}

/// Parse a client's hire count from free text like `"12 hires"`.
pub fn parse_hires_count(hires_text: &str) -> Option<u32> {
    if hires_text.trim().is_empty() {
        return None;
    }
    let re = {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"(\d+)\s*hire").unwrap())
    };
    re.captures(&hires_text.to_lowercase())
        .and_then(|c| c[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_range_is_parsed() {
        let budget = parse_budget("$25.00-$50.00/hr");
        assert_eq!(budget.budget_type, Some(BudgetType::Hourly));
        assert_eq!(budget.budget_min, Some(25.0));
        assert_eq!(budget.budget_max, Some(50.0));
    }

    #[test]
    fn fixed_range_with_comma_separators() {
        let budget = parse_budget("Fixed-price: $1,000 - $2,500");
        assert_eq!(budget.budget_type, Some(BudgetType::Fixed));
        assert_eq!(budget.budget_min, Some(1000.0));
        assert_eq!(budget.budget_max, Some(2500.0));
    }

    #[test]
    fn bare_amount_above_threshold_is_fixed() {
        let budget = parse_budget("$500");
        assert_eq!(budget.budget_type, Some(BudgetType::Fixed));
        assert_eq!(budget.budget_min, Some(500.0));
        assert_eq!(budget.budget_max, Some(500.0));
    }

    #[test]
    fn bare_amount_below_threshold_is_hourly() {
        let budget = parse_budget("$45");
        assert_eq!(budget.budget_type, Some(BudgetType::Hourly));
    }

    #[test]
    fn empty_input_yields_unknown() {
        let budget = parse_budget("");
        assert_eq!(budget.budget_type, None);
        assert_eq!(budget.budget_min, None);
    }

    #[test]
    fn no_digits_yields_unknown() {
        let budget = parse_budget("negotiable");
        assert_eq!(budget.budget_type, Some(BudgetType::Unknown));
        assert_eq!(budget.budget_min, None);
        assert_eq!(budget.budget_max, None);
    }

    #[test]
    fn spend_parses_million_suffix() {
        let (raw, value) = parse_spend("$1.5M");
        assert_eq!(raw, Some("$1.5M".to_string()));
        assert_eq!(value, Some(1_500_000.0));
    }

    #[test]
    fn spend_parses_thousand_suffix() {
        let (_, value) = parse_spend("$10K");
        assert_eq!(value, Some(10_000.0));
    }

    #[test]
    fn spend_parses_comma_separated_value() {
        let (_, value) = parse_spend("$50,000");
        assert_eq!(value, Some(50_000.0));
    }

    #[test]
    fn hires_count_extracted_from_free_text() {
        assert_eq!(parse_hires_count("12 hires"), Some(12));
        assert_eq!(parse_hires_count("1 hire"), Some(1));
        assert_eq!(parse_hires_count("no history"), None);
    }

    proptest::proptest! {
        #[test]
        fn budget_round_trips_through_render(min in 1i64..5000, spread in 0i64..500) {
            let max = min + spread;
            let budget = BudgetInfo {
                budget_type: Some(BudgetType::Fixed),
                budget_min: Some(min as f64),
                budget_max: Some(max as f64),
            };
            let rendered = render_budget(&budget);
            let reparsed = parse_budget(&rendered);
            prop_assert_eq!(reparsed.budget_type, budget.budget_type);
            prop_assert_eq!(reparsed.budget_min, budget.budget_min);
            prop_assert_eq!(reparsed.budget_max, budget.budget_max);
        }
    }
}
