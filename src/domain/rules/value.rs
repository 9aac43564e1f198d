//! Value coercions shared by every rule.
//!
//! Uploaded sheets keep cells exactly as parsed, so the rules compare raw
//! values the way the spreadsheet front end always has: `parseFloat` for
//! numeric tests, loose equality for `eq`/`neq` and string coercion for
//! substring tests.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::domain::entities::cell::Cell;

fn is_js_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// Length of the longest decimal literal at the start of `s` (sign excluded).
fn decimal_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut idx = 0;
    let mut digits = 0;

    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
        digits += 1;
    }
    if idx < bytes.len() && bytes[idx] == b'.' {
        let mut frac = idx + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
            digits += 1;
        }
        idx = frac;
    }
    if digits == 0 {
        return 0;
    }
    if idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
        let mut exp = idx + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits_start {
            idx = exp;
        }
    }
    idx
}

fn split_sign(s: &str) -> (f64, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (-1.0, &s[1..]),
        Some(b'+') => (1.0, &s[1..]),
        _ => (1.0, s),
    }
}

/// `parseFloat` over text: leading whitespace skipped, longest numeric prefix, else NaN.
pub fn parse_float_str(text: &str) -> f64 {
    let (sign, body) = split_sign(text.trim_start_matches(is_js_space));
    if body.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }
    let len = decimal_prefix_len(body);
    if len == 0 {
        return f64::NAN;
    }
    body[..len]
        .parse::<f64>()
        .map(|value| sign * value)
        .unwrap_or(f64::NAN)
}

/// `parseFloat(cell)`: missing and null cells are NaN.
pub fn parse_float(cell: Option<&Cell>) -> f64 {
    match cell {
        Some(Cell::Number(value)) => *value,
        Some(Cell::Text(text)) => parse_float_str(text),
        Some(Cell::Null) | None => f64::NAN,
    }
}

/// `Number(text)`: the whole trimmed string must be numeric; blank is zero.
pub fn to_number(text: &str) -> f64 {
    let trimmed = text.trim_matches(is_js_space);
    if trimmed.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }
    let (sign, body) = split_sign(trimmed);
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    if decimal_prefix_len(body) != body.len() {
        return f64::NAN;
    }
    body.parse::<f64>()
        .map(|value| sign * value)
        .unwrap_or(f64::NAN)
}

/// Loose equality between a cell and a typed filter value.
pub fn loose_eq(cell: Option<&Cell>, value: &str) -> bool {
    match cell {
        Some(Cell::Number(n)) => *n == to_number(value),
        Some(Cell::Text(text)) => text == value,
        Some(Cell::Null) | None => false,
    }
}

/// String coercion for substring tests; null and missing cells read as "".
pub fn coerce_string(cell: Option<&Cell>) -> Cow<'_, str> {
    cell.map(Cell::as_display).unwrap_or(Cow::Borrowed(""))
}

pub fn is_empty_value(cell: Option<&Cell>) -> bool {
    cell.map(Cell::is_blank).unwrap_or(true)
}

/// String ordering by UTF-16 code units, matching relational operators on strings.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

fn class_of(cell: Option<&Cell>) -> u8 {
    match cell {
        None | Some(Cell::Null) => 0,
        Some(Cell::Number(_)) => 1,
        Some(Cell::Text(_)) => 2,
    }
}

/// Total order on raw cells without coercion: blank < numbers < strings.
pub fn raw_order(a: Option<&Cell>, b: Option<&Cell>) -> Ordering {
    match (a, b) {
        (Some(Cell::Number(x)), Some(Cell::Number(y))) => x
            .partial_cmp(y)
            .unwrap_or_else(|| x.is_nan().cmp(&y.is_nan())),
        (Some(Cell::Text(x)), Some(Cell::Text(y))) => compare_strings(x, y),
        _ => class_of(a).cmp(&class_of(b)),
    }
}
