use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::entities::cell::Row;
use crate::infra::export::{default_filename, exporter_for};
use crate::usecase::ports::sheet::{ExportFormat, ExportOptions, SheetData};

pub const ORIGINAL_SHEET: &str = "原始資料";
pub const PROCESSED_SHEET: &str = "處理結果";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Cancelled,
}

/// Renders rows with the exporter for the chosen format and writes them out.
/// A `None` target means the user dismissed the save dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportService;

impl ExportService {
    pub fn suggested_filename(&self, format: ExportFormat, options: &ExportOptions) -> String {
        options
            .filename
            .clone()
            .unwrap_or_else(|| default_filename("data", format))
    }

    fn write(&self, bytes: &[u8], target: Option<&Path>) -> Result<ExportOutcome> {
        let Some(path) = target else {
            log::info!("export cancelled");
            return Ok(ExportOutcome::Cancelled);
        };
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write export: {}", path.display()))?;
        log::info!("exported {} bytes to {}", bytes.len(), path.display());
        Ok(ExportOutcome::Saved(path.to_path_buf()))
    }

    pub fn export_rows(
        &self,
        rows: &[Row],
        format: ExportFormat,
        options: &ExportOptions,
        target: Option<&Path>,
    ) -> Result<ExportOutcome> {
        if target.is_none() {
            return self.write(&[], None);
        }
        let bytes = exporter_for(format)
            .export(rows, options)
            .with_context(|| format!("{format} export failed"))?;
        self.write(&bytes, target)
    }

    pub fn export_sheets(
        &self,
        sheets: &[SheetData<'_>],
        options: &ExportOptions,
        target: Option<&Path>,
    ) -> Result<ExportOutcome> {
        if target.is_none() {
            return self.write(&[], None);
        }
        let bytes = exporter_for(ExportFormat::Xlsx)
            .export_sheets(sheets, options)
            .context("multi-sheet export failed")?;
        self.write(&bytes, target)
    }

    /// Workbook with the original data and the processed result side by side.
    pub fn export_comparison(
        &self,
        original: &[Row],
        processed: &[Row],
        options: &ExportOptions,
        target: Option<&Path>,
    ) -> Result<ExportOutcome> {
        let sheets = [
            SheetData {
                name: ORIGINAL_SHEET,
                rows: original,
            },
            SheetData {
                name: PROCESSED_SHEET,
                rows: processed,
            },
        ];
        self.export_sheets(&sheets, options, target)
            .context("comparison export failed")
    }
}
