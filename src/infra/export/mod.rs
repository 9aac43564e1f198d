pub mod csv;
pub mod xlsx;

use chrono::NaiveDateTime;

use crate::usecase::ports::sheet::{ExportFormat, SheetExporter};

pub fn exporter_for(format: ExportFormat) -> Box<dyn SheetExporter + Send + Sync> {
    match format {
        ExportFormat::Csv => Box::new(csv::CsvExporter),
        ExportFormat::Xlsx => Box::new(xlsx::XlsxExporter),
    }
}

/// `{prefix}_YYYY-MM-DD_HH-mm-ss.{ext}`
pub fn default_filename_at(prefix: &str, format: ExportFormat, at: NaiveDateTime) -> String {
    format!("{prefix}_{}.{}", at.format("%Y-%m-%d_%H-%M-%S"), format.extension())
}

pub fn default_filename(prefix: &str, format: ExportFormat) -> String {
    default_filename_at(prefix, format, chrono::Local::now().naive_local())
}
