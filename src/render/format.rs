//! Amount, quantity and date formatting for printed values.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate};

/// `1234.5` in USD prints as `$1,234.50`. Unknown currencies are prefixed
/// with their code: `CHF 1,234.50`.
pub fn format_money(amount: f64, currency: &str) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let negative = amount < 0.0 && (amount * 100.0).round() != 0.0;
    let number = group_thousands(amount.abs());

    let code = currency.trim().to_ascii_uppercase();
    let formatted = match code.as_str() {
        "USD" => format!("${}", number),
        "EUR" => format!("€{}", number),
        "GBP" => format!("£{}", number),
        "JPY" => format!("¥{}", number),
        "" => number,
        other => format!("{} {}", other, number),
    };
    if negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}.{}", grouped, frac_part)
}

/// Quantities drop trailing zeros: `5`, `2.5`, `0.125`.
pub fn format_quantity(quantity: f64) -> String {
    if !quantity.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.3}", quantity);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `20` prints as `20%`, `7.5` as `7.5%`.
pub fn format_percent(rate: f64) -> String {
    format!("{}%", format_quantity(rate))
}

/// Reformat ISO dates (`YYYY-MM-DD` or RFC 3339) with `pattern`. Anything
/// else, or a pattern chrono cannot apply, prints the date as given.
pub fn format_date(raw: &str, pattern: &str) -> String {
    let trimmed = raw.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()));
    if let Some(date) = date {
        let mut out = String::new();
        if write!(out, "{}", date.format(pattern)).is_ok() {
            return out;
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_symbols_and_grouping() {
        assert_eq!(format_money(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_money(1234567.891, "eur"), "€1,234,567.89");
        assert_eq!(format_money(0.0, "GBP"), "£0.00");
        assert_eq!(format_money(999.999, "JPY"), "¥1,000.00");
        assert_eq!(format_money(50.0, "CHF"), "CHF 50.00");
    }

    #[test]
    fn negative_amounts() {
        assert_eq!(format_money(-12.0, "USD"), "-$12.00");
        assert_eq!(format_money(-0.001, "USD"), "$0.00");
    }

    #[test]
    fn quantities() {
        assert_eq!(format_quantity(5.0), "5");
        assert_eq!(format_quantity(2.50), "2.5");
        assert_eq!(format_quantity(0.125), "0.125");
        assert_eq!(format_percent(20.0), "20%");
    }

    #[test]
    fn dates() {
        assert_eq!(format_date("2024-03-05", "%d/%m/%Y"), "05/03/2024");
        assert_eq!(format_date("2024-03-05T10:00:00Z", "%Y-%m-%d"), "2024-03-05");
        assert_eq!(format_date("next Tuesday", "%Y-%m-%d"), "next Tuesday");
    }

    #[test]
    fn unusable_date_pattern_prints_the_raw_date() {
        assert_eq!(format_date("2024-03-05", "%Q"), "2024-03-05");
    }
}
