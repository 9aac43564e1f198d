use crate::domain::entities::cell::{Cell, Row};
use crate::domain::entities::rule::FilterOp;
use crate::domain::rules::batch::{between_batches, Batches, ProgressSink, RunOutcome};
use crate::domain::rules::value::{coerce_string, is_empty_value, loose_eq, parse_float, parse_float_str};

/// Whether a cell passes `op` against the typed filter value.
pub fn matches(cell: Option<&Cell>, op: FilterOp, value: &str) -> bool {
    match op {
        FilterOp::Eq => loose_eq(cell, value),
        FilterOp::Neq => !loose_eq(cell, value),
        // NaN on either side compares false.
        FilterOp::Gt => parse_float(cell) > parse_float_str(value),
        FilterOp::Lt => parse_float(cell) < parse_float_str(value),
        FilterOp::Contains => coerce_string(cell).contains(value),
        FilterOp::NotContains => !coerce_string(cell).contains(value),
        FilterOp::Empty => is_empty_value(cell),
        FilterOp::NotEmpty => !is_empty_value(cell),
    }
}

pub fn filter_rows(rows: &[Row], col: &str, op: FilterOp, value: &str) -> Vec<Row> {
    rows.iter()
        .filter(|row| matches(row.get(col), op, value))
        .cloned()
        .collect()
}

pub fn filter_batched(
    rows: &[Row],
    col: &str,
    op: FilterOp,
    value: &str,
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
                .filter(|row| matches(row.get(col), op, value))
                .cloned(),
        );
        between_batches(sink, end, total, &kept);
    }
    sink.progress(100, &kept);
    RunOutcome::Completed(kept)
}
