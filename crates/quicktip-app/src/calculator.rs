// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const PRESET_PERCENTAGES: [i32; 4] = [10, 15, 20, 25];

/// Picker index that selects the custom percentage field.
pub const CUSTOM_PERCENT_INDEX: usize = PRESET_PERCENTAGES.len();

pub fn tip_amount(bill: f64, percent: i32) -> f64 {
    bill * f64::from(percent) / 100.0
}

/// Parses a bill total. Anything that is not a finite number counts as 0.
pub fn parse_bill(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

pub fn parse_percent(raw: &str) -> i32 {
    raw.trim().parse::<i32>().unwrap_or(0)
}

/// Resolves the percentage for a picker index: a preset when the index is in
/// range, otherwise the parsed custom value.
pub fn resolve_percent(index: usize, custom_input: &str) -> i32 {
    match PRESET_PERCENTAGES.get(index) {
        Some(preset) => *preset,
        None => parse_percent(custom_input),
    }
}

pub fn percent_option_label(index: usize) -> String {
    match PRESET_PERCENTAGES.get(index) {
        Some(preset) => format!("{preset}%"),
        None => "custom".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CUSTOM_PERCENT_INDEX, PRESET_PERCENTAGES, parse_bill, parse_percent,
        percent_option_label, resolve_percent, tip_amount,
    };

    #[test]
    fn parse_bill_degrades_to_zero() {
        for raw in ["", "   ", "abc", "1.2.3", "$5", "NaN", "inf", "-inf"] {
            assert_eq!(parse_bill(raw), 0.0, "input {raw:?}");
        }
    }

    #[test]
    fn parse_bill_accepts_decimals() {
        assert_eq!(parse_bill("42.50"), 42.5);
        assert_eq!(parse_bill(" 7 "), 7.0);
        assert_eq!(parse_bill(".5"), 0.5);
    }

    #[test]
    fn parse_percent_degrades_to_zero() {
        assert_eq!(parse_percent("abc"), 0);
        assert_eq!(parse_percent(""), 0);
        assert_eq!(parse_percent("12.5"), 0);
        assert_eq!(parse_percent("18"), 18);
    }

    #[test]
    fn preset_indexes_resolve_exactly() {
        for (index, preset) in PRESET_PERCENTAGES.iter().enumerate() {
            assert_eq!(resolve_percent(index, "99"), *preset);
        }
    }

    #[test]
    fn sentinel_index_uses_custom_value() {
        assert_eq!(resolve_percent(CUSTOM_PERCENT_INDEX, "30"), 30);
        assert_eq!(resolve_percent(CUSTOM_PERCENT_INDEX, "abc"), 0);
        assert_eq!(resolve_percent(CUSTOM_PERCENT_INDEX + 3, "12"), 12);
    }

    #[test]
    fn tip_amount_matches_independent_computation() {
        let bills = [0.0, 1.0, 9.99, 42.5, 120.0, 1_234.56];
        for bill in bills {
            for percent in [0, 10, 15, 18, 20, 25, 100] {
                let expected = bill * percent as f64 / 100.0;
                assert_eq!(tip_amount(bill, percent), expected);
            }
        }
        assert_eq!(tip_amount(42.5, 15), 6.375);
    }

    #[test]
    fn option_labels() {
        assert_eq!(percent_option_label(0), "10%");
        assert_eq!(percent_option_label(CUSTOM_PERCENT_INDEX), "custom");
    }
}
