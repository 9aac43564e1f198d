use anyhow::{bail, Context, Result};

use crate::domain::entities::cell::Cell;
use crate::domain::entities::upload::UploadedFile;
use crate::infra::import::headers::{build_rows, clean_headers};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn sheet_name(file_name: &str) -> &str {
    std::path::Path::new(file_name)
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("Sheet1")
}

/// Reads CSV text as-is: every cell stays a string.
pub fn parse_csv(name: &str, bytes: &[u8], max_rows: usize) -> Result<UploadedFile> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let header_record = match records.next() {
        Some(record) => record.with_context(|| format!("failed to read csv header: {name}"))?,
        None => bail!("csv has no header row: {name}"),
    };
    if header_record.iter().all(|field| field.trim().is_empty()) {
        bail!("csv header is required: {name}");
    }
    let headers = clean_headers(header_record.iter());

    let rows = build_rows(
        &headers,
        records.map(|record| -> Result<Vec<Cell>> {
            let record = record.context("failed to parse csv record")?;
            Ok(record.iter().map(Cell::text).collect())
        }),
        max_rows,
    )
    .with_context(|| format!("failed to parse csv: {name}"))?;

    if rows.is_empty() {
        bail!("csv has no data rows: {name}");
    }
    Ok(UploadedFile::single(name, sheet_name(name), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_keeps_text_and_strips_bom() {
        let bytes = "\u{feff}日期,金額,備註\n2024-01-05,007,\"含,逗號\"\n,,\n1/2,3.50,\n".as_bytes();

        let file = parse_csv("報表.csv", bytes, 100).expect("csv should parse");
        let rows = file.primary_rows().expect("csv has one sheet");

        assert_eq!(file.sheets[0].name, "報表");
        assert_eq!(rows.len(), 2, "blank line should be skipped");
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec!["日期", "金額", "備註"],
            "bom must not leak into the first header"
        );
        assert_eq!(rows[0].get("金額"), Some(&Cell::text("007")));
        assert_eq!(rows[0].get("備註"), Some(&Cell::text("含,逗號")));
        assert_eq!(rows[1].get("日期"), Some(&Cell::text("1/2")));
    }

    #[test]
    fn header_only_csv_is_rejected() {
        let err = parse_csv("empty.csv", b"a,b\n", 100).expect_err("no data rows");
        assert!(err.to_string().contains("no data rows"), "{err}");

        let err = parse_csv("blank.csv", b"", 100).expect_err("no header");
        assert!(err.to_string().contains("no header"), "{err}");
    }
}
