//! Number, date and whitespace helpers shared by the parsers.

use crate::error::ParseError;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Collapses runs of whitespace into a single space.
pub fn normalize_chars<I: IntoIterator<Item = char>>(iter: I) -> String {
    let mut output = String::new();
    let mut prev_space = false;
    for ch in iter {
        let is_space = ch.is_whitespace();
        if is_space {
            if !prev_space {
                output.push(' ');
            }
        } else {
            output.push(ch);
        }
        prev_space = is_space;
    }
    output.trim().to_string()
}

/// Collapses whitespace and strips punctuation left over from line wrapping.
pub fn normalize_line(input: &str) -> String {
    normalize_chars(input.chars())
        .trim_end_matches([',', ';', '-'])
        .trim_end()
        .to_string()
}

/// Removes thousands separators and spacing; `(x)` becomes `-x`.
fn normalize_number(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|ch| !matches!(*ch, ' ' | ',' | '\u{a0}' | '\u{202f}' | '+' | '\t'))
        .collect();
    if let Some(inner) = cleaned.strip_prefix('(') {
        let inner = inner.trim_end_matches(')');
        if inner.starts_with('-') {
            inner.to_string()
        } else {
            format!("-{inner}")
        }
    } else {
        cleaned.trim_end_matches(')').to_string()
    }
}

/// Parses a registrar amount such as `1,234.50`, `(1,234.50)` or `-12.5`.
pub fn parse_decimal(value: &str, column: &'static str) -> Result<Decimal, ParseError> {
    let normalized = normalize_number(value);
    Decimal::from_str(&normalized).map_err(|_| ParseError::Number {
        value: value.trim().to_string(),
        column,
    })
}

/// Parses an optional capture, treating absent or blank text as `None`.
pub fn parse_decimal_opt(
    value: Option<&str>,
    column: &'static str,
) -> Result<Option<Decimal>, ParseError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_decimal(text, column).map(Some),
    }
}

/// Parses a date with the given `chrono` format.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value.trim(), format).map_err(|_| ParseError::Date {
        value: value.trim().to_string(),
    })
}

/// Returns the first capture group of the first match.
pub fn capture_text(text: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
