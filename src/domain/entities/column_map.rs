use indexmap::IndexMap;
use std::collections::HashMap;

use crate::domain::entities::cell::Row;
use crate::domain::entities::rule::Rule;
use crate::error::RuleError;

/// Spreadsheet-style letter for a zero-based column index: A..Z, AA, AB, ...
pub fn column_letter(index: usize) -> String {
    let mut name = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

/// Bidirectional mapping between the first row's column names and letters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapper {
    original_columns: Vec<String>,
    mapped_columns: IndexMap<String, String>,
    reverse_mapping: HashMap<String, String>,
}

impl ColumnMapper {
    pub fn new(rows: &[Row]) -> Self {
        let mut mapper = Self::default();
        mapper.update_data(rows);
        mapper
    }

    /// Takes the key order of `rows[0]`; an empty slice leaves no columns.
    pub fn detect_valid_columns(&mut self, rows: &[Row]) {
        self.original_columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
    }

    pub fn generate_mapping(&mut self) {
        self.mapped_columns.clear();
        self.reverse_mapping.clear();
        for (idx, column) in self.original_columns.iter().enumerate() {
            let letter = column_letter(idx);
            self.mapped_columns.insert(letter.clone(), column.clone());
            self.reverse_mapping.insert(column.clone(), letter);
        }
    }

    pub fn update_data(&mut self, rows: &[Row]) {
        self.detect_valid_columns(rows);
        self.generate_mapping();
    }

    pub fn original_column(&self, letter: &str) -> Option<&str> {
        self.mapped_columns.get(letter).map(String::as_str)
    }

    pub fn mapped_column(&self, original: &str) -> Option<&str> {
        self.reverse_mapping.get(original).map(String::as_str)
    }

    pub fn available_columns(&self) -> Vec<&str> {
        self.mapped_columns.keys().map(String::as_str).collect()
    }

    pub fn original_columns(&self) -> &[String] {
        &self.original_columns
    }

    /// `(letter, original)` pairs in column order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapped_columns
            .iter()
            .map(|(letter, original)| (letter.as_str(), original.as_str()))
    }

    /// Replaces the letters in `rule` with original column names.
    pub fn resolve(&self, rule: &Rule) -> Result<Rule, RuleError> {
        rule.map_columns(|letter| {
            self.original_column(letter)
                .map(str::to_string)
                .ok_or_else(|| RuleError::Validation(format!("unknown column `{letter}`")))
        })
    }
}
