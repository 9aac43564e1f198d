use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A primitive cell value. Parsers and rules never turn one variant into another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

/// One record: column name to cell, in header order.
pub type Row = IndexMap<String, Cell>;

/// An immutable row snapshot shared between lineage, uploads and the worker.
pub type Dataset = Arc<Vec<Row>>;

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(v) => v.is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// String form used for display, CSV output and substring tests.
    pub fn as_display(&self) -> Cow<'_, str> {
        match self {
            Cell::Text(v) => Cow::Borrowed(v.as_str()),
            Cell::Number(n) => Cow::Owned(format_number(*n)),
            Cell::Null => Cow::Borrowed(""),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::empty()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_display())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

/// Formats a number the way a browser's `String(n)` would.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{value:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    format!("{value}")
}

/// Builds a row from `(column, cell)` pairs, keeping their order.
pub fn row_from<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Cell>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_like_browser_strings() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn untagged_json_keeps_cell_kinds() {
        let row: Row = serde_json::from_str(r#"{"a":1.5,"b":"x","c":null}"#)
            .expect("row json should parse");

        assert_eq!(row.get("a"), Some(&Cell::Number(1.5)));
        assert_eq!(row.get("b"), Some(&Cell::text("x")));
        assert_eq!(row.get("c"), Some(&Cell::Null));
        assert_eq!(
            row.keys().collect::<Vec<_>>(),
            vec!["a", "b", "c"],
            "key order should be preserved"
        );
    }

    #[test]
    fn blank_detection_ignores_numbers() {
        assert!(Cell::Null.is_blank());
        assert!(Cell::empty().is_blank());
        assert!(!Cell::Number(0.0).is_blank());
        assert!(!Cell::text(" ").is_blank());
    }
}
