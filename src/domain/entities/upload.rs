use std::sync::Arc;

use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::entities::rule::MergeType;
use crate::error::RuleError;

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Dataset,
}

/// A parsed upload. The first sheet is the file's primary data.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub sheets: Vec<Sheet>,
}

impl UploadedFile {
    pub fn single(name: impl Into<String>, sheet_name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            sheets: vec![Sheet {
                name: sheet_name.into(),
                rows: Arc::new(rows),
            }],
        }
    }

    pub fn primary_rows(&self) -> Option<&Dataset> {
        self.sheets.first().map(|sheet| &sheet.rows)
    }

    pub fn row_count(&self) -> usize {
        self.primary_rows().map(|rows| rows.len()).unwrap_or(0)
    }
}

/// The upload area: every file the user has loaded, in upload order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uploads {
    files: Vec<UploadedFile>,
}

impl Uploads {
    pub fn add(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Primary rows of every file, concatenated in upload order.
    pub fn original_rows(&self) -> Dataset {
        let mut primaries = self.files.iter().filter_map(UploadedFile::primary_rows);
        match (primaries.next(), primaries.next()) {
            (None, _) => Arc::new(Vec::new()),
            (Some(only), None) => Arc::clone(only),
            _ => Arc::new(
                self.files
                    .iter()
                    .filter_map(UploadedFile::primary_rows)
                    .flat_map(|rows| rows.iter().cloned())
                    .collect(),
            ),
        }
    }

    pub fn original_row_count(&self) -> usize {
        self.files.iter().map(UploadedFile::row_count).sum()
    }

    /// Row arrays a merge concatenates: one per file, or one per sheet of the first workbook.
    pub fn merge_sources(&self, merge_type: MergeType) -> Result<Vec<Dataset>, RuleError> {
        let sources: Vec<Dataset> = match merge_type {
            MergeType::Files => self
                .files
                .iter()
                .filter_map(UploadedFile::primary_rows)
                .cloned()
                .collect(),
            MergeType::Sheets => self
                .files
                .first()
                .map(|file| file.sheets.iter().map(|sheet| Arc::clone(&sheet.rows)).collect())
                .unwrap_or_default(),
        };
        if sources.is_empty() {
            return Err(RuleError::NoUploads);
        }
        Ok(sources)
    }

    /// After a merge the merged rows stand in for every upload.
    pub fn replace_with_merged(&mut self, merged: Dataset) {
        self.files = vec![UploadedFile {
            name: "merged".to_string(),
            sheets: vec![Sheet {
                name: "merged".to_string(),
                rows: merged,
            }],
        }];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::cell::row_from;

    fn rows(tag: &str, n: usize) -> Vec<Row> {
        (0..n).map(|i| row_from([("id", format!("{tag}{i}"))])).collect()
    }

    #[test]
    fn original_rows_concatenate_primary_sheets() {
        let mut uploads = Uploads::default();
        uploads.add(UploadedFile::single("a.csv", "a", rows("a", 2)));
        let mut workbook = UploadedFile::single("b.xlsx", "s1", rows("b", 1));
        workbook.sheets.push(Sheet {
            name: "s2".to_string(),
            rows: Arc::new(rows("c", 5)),
        });
        uploads.add(workbook);

        let original = uploads.original_rows();
        assert_eq!(original.len(), 3, "only primary sheets count");
        assert_eq!(original[2].get("id").map(|c| c.to_string()), Some("b0".to_string()));
        assert_eq!(uploads.original_row_count(), 3);
    }

    #[test]
    fn sheet_merge_uses_first_workbook() {
        let mut uploads = Uploads::default();
        let mut workbook = UploadedFile::single("b.xlsx", "s1", rows("b", 1));
        workbook.sheets.push(Sheet {
            name: "s2".to_string(),
            rows: Arc::new(rows("c", 4)),
        });
        uploads.add(workbook);

        let sources = uploads
            .merge_sources(MergeType::Sheets)
            .expect("sheets should be available");
        assert_eq!(sources.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn merge_without_uploads_is_rejected() {
        let uploads = Uploads::default();
        assert_eq!(uploads.merge_sources(MergeType::Files), Err(RuleError::NoUploads));
    }
}
