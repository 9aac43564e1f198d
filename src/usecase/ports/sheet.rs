use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::domain::entities::cell::Row;
use crate::domain::entities::upload::UploadedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(anyhow!("unsupported export format: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Suggested file name; a timestamped one is generated when absent.
    pub filename: Option<String>,
    pub sheet_name: String,
    /// Columns whose date-looking text must survive a round trip through a spreadsheet program.
    pub date_columns: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: None,
            sheet_name: "Sheet1".to_string(),
            date_columns: Vec::new(),
        }
    }
}

/// One named worksheet of an export.
#[derive(Debug, Clone, Copy)]
pub struct SheetData<'a> {
    pub name: &'a str,
    pub rows: &'a [Row],
}

pub trait SheetParser {
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<UploadedFile>;
}

pub trait SheetExporter {
    fn format(&self) -> ExportFormat;

    fn export_sheets(&self, sheets: &[SheetData<'_>], options: &ExportOptions) -> Result<Vec<u8>>;

    fn export(&self, rows: &[Row], options: &ExportOptions) -> Result<Vec<u8>> {
        self.export_sheets(
            &[SheetData {
                name: &options.sheet_name,
                rows,
            }],
            options,
        )
    }
}
