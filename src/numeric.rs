//! Turkish locale number convention shared by every calculator
//!
//! Amounts are typed the way they are written in tr-TR: `.` groups thousands
//! and `,` marks the decimal part (`1.234,56`). Display goes the same way,
//! always with two fraction digits.

use thiserror::Error;

/// Currency suffix used in result rows
pub const CURRENCY_SYMBOL: &str = "₺";

/// Message shown when an amount field does not hold a positive number
pub const INVALID_AMOUNT_MESSAGE: &str = "Lütfen geçerli bir toplam tutar girin.";

/// Why an amount field could not be used
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a number")]
    Unparseable(String),

    #[error("amount must be positive and finite, got {0}")]
    NotPositive(f64),
}

/// Keep only the characters an amount field accepts (digits, `,` and `.`)
pub fn sanitize_amount_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect()
}

/// Parse a locale-formatted number.
///
/// Every `.` is dropped as a thousands separator, the first `,` becomes the
/// decimal point and anything from a second `,` onwards is ignored.
pub fn parse_locale_number(input: &str) -> Result<f64, AmountError> {
    let stripped = input.trim().replace('.', "");
    let normalized = stripped.replacen(',', ".", 1);
    let numeric = match normalized.find(',') {
        Some(idx) => &normalized[..idx],
        None => normalized.as_str(),
    };

    numeric
        .parse::<f64>()
        .map_err(|_| AmountError::Unparseable(input.to_string()))
}

/// Parse a locale-formatted amount that must be a positive, finite number
pub fn parse_positive_amount(input: &str) -> Result<f64, AmountError> {
    let value = parse_locale_number(input)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(AmountError::NotPositive(value));
    }
    Ok(value)
}

/// Parse an amount field the way it would have been typed: characters other
/// than digits and separators are dropped before parsing (`"1e3"` reads as 13)
pub fn parse_amount_field(input: &str) -> Result<f64, AmountError> {
    parse_positive_amount(&sanitize_amount_input(input))
}

/// Format with exactly two fraction digits in tr-TR grouping (`1.234,56`).
/// Non-finite values render as an empty string.
pub fn format_tr(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit as char);
    }

    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    format!("{}{},{}", sign, grouped, frac_part)
}

/// Format an amount with the currency suffix (`1.234,56₺`)
pub fn format_currency(value: f64) -> String {
    format!("{}{}", format_tr(value), CURRENCY_SYMBOL)
}
