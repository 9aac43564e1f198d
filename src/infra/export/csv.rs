use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::domain::entities::cell::Row;
use crate::usecase::ports::sheet::{ExportFormat, ExportOptions, SheetData, SheetExporter};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Dates a spreadsheet program would silently reinterpret.
pub(crate) const STRICT_DATE_PATTERN: &str =
    r"^(?:\d{4}-\d{1,2}-\d{1,2}|\d{1,2}/\d{1,2}/\d{4}|\d{4}/\d{1,2}/\d{1,2}|\d{1,2}-\d{1,2}-\d{4})$";

pub(crate) fn header_of(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

pub fn rows_to_csv(rows: &[Row], date_columns: &[String]) -> Result<Vec<u8>> {
    if rows.is_empty() {
        bail!("no data to export");
    }
    let date_pattern = Regex::new(STRICT_DATE_PATTERN).context("invalid date pattern")?;
    let headers = header_of(rows);
    let protected: Vec<bool> = headers
        .iter()
        .map(|header| date_columns.contains(header))
        .collect();

    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::WriterBuilder::new().from_writer(&mut buffer);
        writer
            .write_record(&headers)
            .context("failed to write csv header")?;

        for row in rows {
            let record = headers.iter().zip(&protected).map(|(header, protect)| {
                let value = row
                    .get(header)
                    .map(|cell| cell.as_display().into_owned())
                    .unwrap_or_default();
                if *protect && date_pattern.is_match(&value) {
                    format!("'{value}")
                } else {
                    value
                }
            });
            writer
                .write_record(record)
                .context("failed to write csv record")?;
        }
        writer.flush().context("failed to flush csv writer")?;
    }
    Ok(buffer)
}

pub struct CsvExporter;

impl SheetExporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn export_sheets(&self, sheets: &[SheetData<'_>], options: &ExportOptions) -> Result<Vec<u8>> {
        match sheets {
            [sheet] => rows_to_csv(sheet.rows, &options.date_columns),
            [] => bail!("no data to export"),
            _ => bail!("csv holds a single sheet; export {} sheets as xlsx", sheets.len()),
        }
    }
}
