pub mod csv;
pub mod headers;
pub mod xlsx;

use anyhow::{bail, Result};

use crate::config::EngineConfig;
use crate::domain::entities::upload::UploadedFile;
use crate::usecase::ports::sheet::SheetParser;

/// Parses uploads by extension, enforcing the size and row limits.
#[derive(Debug, Clone)]
pub struct FileParser {
    max_file_size: u64,
    max_rows: usize,
}

impl FileParser {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            max_rows: config.max_rows,
        }
    }
}

pub fn file_extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

impl SheetParser for FileParser {
    fn parse(&self, name: &str, bytes: &[u8]) -> Result<UploadedFile> {
        let extension = file_extension(name).unwrap_or_default();
        if !matches!(extension.as_str(), "xlsx" | "xls" | "csv") {
            bail!("unsupported file type: {name} (expected .xlsx, .xls or .csv)");
        }
        if bytes.len() as u64 > self.max_file_size {
            bail!(
                "file too large: {name} is {} bytes, limit is {} bytes",
                bytes.len(),
                self.max_file_size
            );
        }

        let file = if extension == "csv" {
            csv::parse_csv(name, bytes, self.max_rows)?
        } else {
            xlsx::parse_workbook(name, bytes, self.max_rows)?
        };
        log::info!(
            "parsed {name}: {} sheet(s), {} primary rows",
            file.sheets.len(),
            file.row_count()
        );
        Ok(file)
    }
}
