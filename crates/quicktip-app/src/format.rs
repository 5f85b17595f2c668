// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Rounds to whole cents, half away from zero.
pub fn to_cents(amount: f64) -> i128 {
    (amount * 100.0).round() as i128
}

/// Formats `amount` as currency with two fraction digits and comma
/// grouping, e.g. `$1,234.50`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    format_money(to_cents(amount), symbol)
}

pub fn format_money(cents: i128, symbol: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = group_thousands(absolute / 100);
    let cents_component = absolute % 100;
    format!("{sign}{symbol}{dollars}.{cents_component:02}")
}

pub fn format_percent(percent: i32) -> String {
    format!("{percent}%")
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::{format_currency, format_money, format_percent, to_cents};

    #[test]
    fn rounds_half_cents_up() {
        assert_eq!(to_cents(6.375), 638);
        assert_eq!(format_currency(6.375, "$"), "$6.38");
        assert_eq!(format_currency(0.125, "$"), "$0.13");
    }

    #[test]
    fn zero_and_negative_amounts() {
        assert_eq!(format_currency(0.0, "$"), "$0.00");
        assert_eq!(format_currency(-3.2, "$"), "-$3.20");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_money(123_456_789, "$"), "$1,234,567.89");
        assert_eq!(format_money(100_000, "€"), "€1,000.00");
        assert_eq!(format_money(99_999, "$"), "$999.99");
    }

    #[test]
    fn long_bills_keep_every_digit() {
        assert_eq!(to_cents(1e19), 1_000_000_000_000_000_000_000);
        assert_eq!(
            format_currency(1e19, "$"),
            "$10,000,000,000,000,000,000.00"
        );
    }

    #[test]
    fn percent_suffix() {
        assert_eq!(format_percent(15), "15%");
    }
}
