use std::borrow::Cow;
use std::cmp::Ordering;

use crate::domain::entities::cell::{Cell, Row};
use crate::domain::entities::rule::CompareOp;
use crate::domain::rules::batch::{between_batches, Batches, ProgressSink, RunOutcome};
use crate::domain::rules::value::{coerce_string, compare_strings, parse_float};

/// Row appended by a column sum: blank everywhere except the summed column.
pub fn summary_row(template: Option<&Row>, col: &str, sum: f64) -> Row {
    let mut row: Row = template
        .map(|first| first.keys().map(|key| (key.clone(), Cell::empty())).collect())
        .unwrap_or_default();
    row.insert(col.to_string(), Cell::Number(sum));
    row
}

fn numeric_term(row: &Row, col: &str) -> f64 {
    let value = parse_float(row.get(col));
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

pub fn add_rows(rows: &[Row], col: &str) -> Vec<Row> {
    let sum: f64 = rows.iter().map(|row| numeric_term(row, col)).sum();
    let mut result = rows.to_vec();
    result.push(summary_row(rows.first(), col, sum));
    result
}

pub fn add_batched(rows: &[Row], col: &str, batch_size: usize, sink: &mut dyn ProgressSink) -> RunOutcome {
    let total = rows.len();
    let mut sum = 0.0;
    let mut result = Vec::with_capacity(total + 1);
    for range in Batches::new(total, batch_size) {
        if sink.should_stop() {
            return RunOutcome::Cancelled;
        }
        let end = range.end;
        for row in &rows[range] {
            sum += numeric_term(row, col);
            result.push(row.clone());
        }
        between_batches(sink, end, total, &result);
    }
    result.push(summary_row(rows.first(), col, sum));
    sink.progress(100, &result);
    RunOutcome::Completed(result)
}

/// Missing cells and empty strings; a null cell still takes part in a comparison.
fn is_missing_or_empty(cell: Option<&Cell>) -> bool {
    match cell {
        None => true,
        Some(Cell::Text(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// String side of a comparison. Null reads as "null".
fn comparison_text(cell: Option<&Cell>) -> Cow<'_, str> {
    match cell {
        Some(Cell::Null) => Cow::Borrowed("null"),
        other => coerce_string(other),
    }
}

/// Two-column comparison: missing and empty cells never match, numbers compare
/// numerically when both sides parse finite, everything else compares as strings.
pub fn compare_cells(a: Option<&Cell>, b: Option<&Cell>, cmp: CompareOp) -> bool {
    if is_missing_or_empty(a) || is_missing_or_empty(b) {
        return false;
    }
    let (na, nb) = (parse_float(a), parse_float(b));
    let ordering = if na.is_finite() && nb.is_finite() {
        na.partial_cmp(&nb)
    } else {
        Some(compare_strings(&comparison_text(a), &comparison_text(b)))
    };
    matches!(
        (cmp, ordering),
        (CompareOp::Gt, Some(Ordering::Greater))
            | (CompareOp::Eq, Some(Ordering::Equal))
            | (CompareOp::Lt, Some(Ordering::Less))
    )
}

/// Keeps the rows whose comparison holds; no result column is added.
pub fn compare_rows(rows: &[Row], col1: &str, col2: &str, cmp: CompareOp) -> Vec<Row> {
    rows.iter()
        .filter(|row| compare_cells(row.get(col1), row.get(col2), cmp))
        .cloned()
        .collect()
}

pub fn compare_batched(
    rows: &[Row],
    col1: &str,
    col2: &str,
    cmp: CompareOp,
    batch_size: usize,
    sink: &mut dyn ProgressSink,
) -> RunOutcome {
    let total = rows.len();
    let mut kept = Vec::new();
    for range in Batches::new(total, batch_size) {
        if sink.should_stop() {
            return RunOutcome::Cancelled;
        }
        let end = range.end;
        kept.extend(
            rows[range]
                .iter()
                .filter(|row| compare_cells(row.get(col1), row.get(col2), cmp))
                .cloned(),
        );
        between_batches(sink, end, total, &kept);
    }
    sink.progress(100, &kept);
    RunOutcome::Completed(kept)
}
