use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::upload::UploadedFile;
use crate::usecase::ports::sheet::SheetParser;

pub struct ImportService<P> {
    parser: P,
}

impl<P: SheetParser> ImportService<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn import_bytes(&self, name: &str, bytes: &[u8]) -> Result<UploadedFile> {
        self.parser.parse(name, bytes)
    }

    pub fn import_path(&self, path: &Path) -> Result<UploadedFile> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("upload")
            .to_string();
        self.import_bytes(&name, &bytes)
            .with_context(|| format!("failed to import: {}", path.display()))
    }
}
