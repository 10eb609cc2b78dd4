//! FILENAME: core/metrics-engine/src/format.rs
//! PURPOSE: Display formatting for metric values.
//! CONTEXT: The catalog's `FormatKind` decides how a value is shown (currency
//! symbol, percent sign, "days" suffix). Formatting is display only; the
//! numbers the engine computes are never rounded or altered by it.

use serde::{Deserialize, Serialize};

use crate::definition::FormatKind;

/// Options for rendering values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatOptions {
    pub currency_symbol: String,
    pub currency_decimals: u8,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

/// Format a metric value for display.
pub fn format_value(value: f64, kind: FormatKind, options: &FormatOptions) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    match kind {
        FormatKind::Currency => {
            format_currency(value, options.currency_decimals, &options.currency_symbol)
        }
        FormatKind::Number => format_count(value),
        FormatKind::Percentage => format!("{:.1}%", value),
        FormatKind::Days => format!("{:.1} days", value),
    }
}

/// Integers without decimals, everything else with two places.
fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        add_thousands_separator(&format!("{:.0}", value))
    } else {
        add_thousands_separator(&format!("{:.2}", value))
    }
}

/// Format a number as currency; negatives are parenthesized.
fn format_currency(value: f64, decimal_places: u8, symbol: &str) -> String {
    let formatted = add_thousands_separator(&format!(
        "{:.prec$}",
        value.abs(),
        prec = decimal_places as usize
    ));
    let with_symbol = format!("{}{}", symbol, formatted);

    if value < 0.0 {
        format!("({})", with_symbol)
    } else {
        with_symbol
    }
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (s, None),
    };

    let negative = integer_part.starts_with('-');
    let digits: Vec<char> = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::with_capacity(s.len() + digits.len() / 3 + 1);
    if negative {
        result.push('-');
    }
    let len = digits.len();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}
