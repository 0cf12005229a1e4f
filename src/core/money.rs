//! Conversion between integer cents and user-facing money text.

use crate::errors::{Error, Result};
use crate::models::Cents;

/// Formats cents as `1,234.56`, with a leading `-` for negative amounts.
#[must_use]
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = (abs / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{:02}", abs % 100)
}

/// Formats a profit with an explicit sign: `+12.34` or `-12.34`.
#[must_use]
pub fn format_signed_cents(cents: Cents) -> String {
    if cents >= 0 {
        format!("+{}", format_cents(cents))
    } else {
        format_cents(cents)
    }
}

fn invalid(text: &str) -> Error {
    Error::Validation {
        message: format!("'{text}' is not a valid amount"),
    }
}

/// Strips grouping separators from the integer part.
///
/// The first group holds one to three digits and every later group exactly three.
fn ungroup(int_part: &str, grouping: char) -> Option<String> {
    let mut groups = int_part.split(grouping);
    let first = groups.next()?;
    if !int_part.contains(grouping) {
        return Some(first.to_string());
    }
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

/// Parses typed money text into cents.
///
/// Accepts an optional `$` or `R$` prefix. When both `.` and `,` appear, the
/// last one is the decimal separator and the other one groups thousands
/// (`1.234,56` and `1,234.56` are both 123456 cents). A separator that appears
/// alone is always decimal, so `1.000` and `1,000` are one unit. Fractions
/// beyond the cent are rounded half up. Empty text is zero.
///
/// # Errors
/// Returns `Error::Validation` for anything else, including a repeated lone
/// separator (`1.2.3`) and misplaced grouping (`12.34,5`).
pub fn parse_cents(text: &str) -> Result<Cents> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let cleaned: String = rest
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Ok(0);
    }

    let Some(decimal_at) = cleaned.rfind(['.', ',']) else {
        return to_cents(text, &cleaned, "", negative);
    };
    let (decimal, grouping) = if cleaned[decimal_at..].starts_with('.') {
        ('.', ',')
    } else {
        (',', '.')
    };

    let int_part = &cleaned[..decimal_at];
    let fraction = &cleaned[decimal_at + 1..];
    if int_part.contains(decimal) {
        return Err(invalid(text));
    }
    let digits = ungroup(int_part, grouping).ok_or_else(|| invalid(text))?;
    to_cents(text, &digits, fraction, negative)
}

fn to_cents(text: &str, digits: &str, fraction: &str, negative: bool) -> Result<Cents> {
    if !digits.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || (digits.is_empty() && fraction.is_empty())
    {
        return Err(invalid(text));
    }

    let units: Cents = if digits.is_empty() {
        0
    } else {
        digits.parse().map_err(|_| invalid(text))?
    };
    let mut fraction_digits = fraction.bytes().map(|b| Cents::from(b - b'0'));
    let tenths = fraction_digits.next().unwrap_or(0);
    let hundredths = fraction_digits.next().unwrap_or(0);
    let round_up = fraction_digits.next().is_some_and(|d| d >= 5);
    let fraction_cents = tenths * 10 + hundredths + Cents::from(round_up);

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction_cents))
        .ok_or_else(|| invalid(text))?;
    Ok(if negative { -cents } else { cents })
}
