use anyhow::{bail, Context, Result};
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook};

use crate::domain::entities::cell::Cell;
use crate::infra::export::csv::{header_of, STRICT_DATE_PATTERN};
use crate::usecase::ports::sheet::{ExportFormat, ExportOptions, SheetData, SheetExporter};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

pub struct XlsxExporter;

impl SheetExporter for XlsxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    /// One worksheet per non-empty sheet. Date-like text in marked columns
    /// is written with the text format so it stays text.
    fn export_sheets(&self, sheets: &[SheetData<'_>], options: &ExportOptions) -> Result<Vec<u8>> {
        let date_pattern = Regex::new(STRICT_DATE_PATTERN).context("invalid date pattern")?;
        let text_format = Format::new().set_num_format("@");
        let mut workbook = Workbook::new();
        let mut written = 0;

        for (idx, sheet) in sheets.iter().enumerate() {
            if sheet.rows.is_empty() {
                log::warn!("sheet {} is empty, skipping", idx + 1);
                continue;
            }
            let headers = header_of(sheet.rows);
            if headers.len() > MAX_COLUMNS || sheet.rows.len() + 1 > MAX_ROWS {
                bail!("sheet {} exceeds the xlsx size limits", sheet.name);
            }

            let name = if sheet.name.trim().is_empty() {
                format!("Sheet{}", idx + 1)
            } else {
                sheet.name.to_string()
            };
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&name)
                .with_context(|| format!("invalid sheet name: {name}"))?;

            for (col, header) in headers.iter().enumerate() {
                let protect = options.date_columns.contains(header);
                worksheet
                    .write_string(0, col as u16, header.as_str())
                    .with_context(|| format!("failed to write header: {header}"))?;

                for (row_idx, row) in sheet.rows.iter().enumerate() {
                    let target = (row_idx + 1) as u32;
                    match row.get(header) {
                        Some(Cell::Number(value)) => {
                            worksheet.write_number(target, col as u16, *value)?;
                        }
                        Some(Cell::Text(value)) if value.is_empty() => {}
                        Some(Cell::Text(value)) if protect && date_pattern.is_match(value) => {
                            worksheet.write_string_with_format(
                                target,
                                col as u16,
                                value.as_str(),
                                &text_format,
                            )?;
                        }
                        Some(Cell::Text(value)) => {
                            worksheet.write_string(target, col as u16, value.as_str())?;
                        }
                        Some(Cell::Null) | None => {}
                    }
                }
            }
            written += 1;
        }

        if written == 0 {
            bail!("no data to export");
        }
        workbook
            .save_to_buffer()
            .context("failed to build xlsx workbook")
    }
}
