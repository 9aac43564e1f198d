use std::collections::HashSet;

use anyhow::{bail, Result};

use crate::domain::entities::cell::{Cell, Row};

/// Trims header names, names blank ones `Column_{n}` and suffixes duplicates
/// with `_1`, `_2`, ...
pub fn clean_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut used = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let trimmed = header.as_ref().trim();
            let base = if trimmed.is_empty() {
                format!("Column_{}", idx + 1)
            } else {
                trimmed.to_string()
            };

            let mut name = base.clone();
            let mut counter = 1;
            while used.contains(&name) {
                name = format!("{base}_{counter}");
                counter += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

pub fn is_empty_row(cells: &[Cell]) -> bool {
    cells.iter().all(|cell| cell.as_display().trim().is_empty())
}

/// Zips each record with the headers; short records are padded with `""`,
/// blank records are skipped.
pub fn build_rows<I>(headers: &[String], records: I, max_rows: usize) -> Result<Vec<Row>>
where
    I: IntoIterator<Item = Result<Vec<Cell>>>,
{
    let mut rows = Vec::new();
    for record in records {
        let cells = record?;
        if is_empty_row(&cells) {
            continue;
        }
        if rows.len() == max_rows {
            bail!("too many rows: limit is {max_rows}");
        }

        let mut cells = cells.into_iter();
        let row: Row = headers
            .iter()
            .map(|header| (header.clone(), cells.next().unwrap_or_default()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
