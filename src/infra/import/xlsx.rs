use std::io::Cursor;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::domain::entities::cell::{Cell, Row};
use crate::domain::entities::upload::{Sheet, UploadedFile};
use crate::infra::import::headers::{build_rows, clean_headers};

/// Numbers stay numbers; everything else keeps its text.
pub fn data_to_cell(cell: &Data) -> Cell {
    match cell {
        Data::String(v) => Cell::Text(v.clone()),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(v) => Cell::Text(v.to_string()),
        Data::DateTime(v) => Cell::Text(v.to_string()),
        Data::DateTimeIso(v) => Cell::Text(v.clone()),
        Data::DurationIso(v) => Cell::Text(v.clone()),
        Data::Error(v) => Cell::Text(format!("{v:?}")),
        Data::Empty => Cell::empty(),
    }
}

fn range_to_rows(range: &Range<Data>, max_rows: usize) -> Result<Option<Vec<Row>>> {
    let mut raw_rows = range.rows();
    let Some(header_cells) = raw_rows.next() else {
        return Ok(None);
    };
    let header_cells: Vec<Cell> = header_cells.iter().map(data_to_cell).collect();
    if header_cells.iter().all(Cell::is_blank) {
        return Ok(None);
    }
    let headers = clean_headers(header_cells.iter().map(|cell| cell.as_display()));

    let rows = build_rows(
        &headers,
        raw_rows.map(|cells| -> Result<Vec<Cell>> { Ok(cells.iter().map(data_to_cell).collect()) }),
        max_rows,
    )?;
    Ok(Some(rows))
}

/// Parses every worksheet; the first one with data becomes the primary sheet.
pub fn parse_workbook(name: &str, bytes: &[u8], max_rows: usize) -> Result<UploadedFile> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .with_context(|| format!("failed to open workbook: {name}"))?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet: {sheet_name}"))?;
        match range_to_rows(&range, max_rows)
            .with_context(|| format!("failed to parse sheet: {sheet_name}"))?
        {
            Some(rows) if !rows.is_empty() => sheets.push(Sheet {
                name: sheet_name,
                rows: rows.into(),
            }),
            _ => log::debug!("skipping empty sheet {sheet_name} in {name}"),
        }
    }

    if sheets.is_empty() {
        bail!("workbook has no sheet with data: {name}");
    }
    Ok(UploadedFile {
        name: name.to_string(),
        sheets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_text_keep_their_kind() {
        assert_eq!(data_to_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(data_to_cell(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(
            data_to_cell(&Data::String("2024-01-05".to_string())),
            Cell::text("2024-01-05")
        );
        assert_eq!(data_to_cell(&Data::Empty), Cell::empty());
        assert_eq!(data_to_cell(&Data::Bool(true)), Cell::text("true"));
    }

    #[test]
    fn garbage_bytes_are_a_descriptive_error() {
        let err = parse_workbook("broken.xlsx", b"not a workbook", 100)
            .expect_err("garbage should not parse");
        assert!(format!("{err:#}").contains("broken.xlsx"), "{err:#}");
    }
}
