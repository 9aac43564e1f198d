use std::cmp::Ordering;

use crate::domain::entities::cell::Row;
use crate::domain::entities::rule::SortOrder;
use crate::domain::rules::batch::{between_batches, Batches, ProgressSink, RunOutcome};
use crate::domain::rules::value::raw_order;

fn compare_rows(a: &Row, b: &Row, col: &str, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => raw_order(a.get(col), b.get(col)),
        SortOrder::Desc => raw_order(b.get(col), a.get(col)),
    }
}

/// Stable sort: equal keys keep their input order in both directions.
pub fn sort_rows(rows: &[Row], col: &str, order: SortOrder) -> Vec<Row> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| compare_rows(a, b, col, order));
    sorted
}

/// Sorts eagerly, then emits the sorted rows in batches.
pub fn sort_batched(
    rows: &[Row],
    col: &str,
    order: SortOrder,
    batch_size: usize,
    sink: &mut dyn ProgressSink,
) -> RunOutcome {
    if sink.should_stop() {
        return RunOutcome::Cancelled;
    }
    let sorted = sort_rows(rows, col, order);
    let total = sorted.len();
    let mut emitted = Vec::with_capacity(total);
    for range in Batches::new(total, batch_size) {
        if sink.should_stop() {
            return RunOutcome::Cancelled;
        }
        let end = range.end;
        emitted.extend_from_slice(&sorted[range]);
        between_batches(sink, end, total, &emitted);
    }
    sink.progress(100, &emitted);
    RunOutcome::Completed(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::cell::{row_from, Cell};

    fn rows() -> Vec<Row> {
        vec![
            row_from([("k", Cell::Number(3.0)), ("tag", Cell::text("a"))]),
            row_from([("k", Cell::Number(1.0)), ("tag", Cell::text("b"))]),
            row_from([("k", Cell::Number(3.0)), ("tag", Cell::text("c"))]),
            row_from([("k", Cell::Null), ("tag", Cell::text("d"))]),
        ]
    }

    fn tags(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|row| row.get("tag").map(|c| c.to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn ascending_and_descending_keep_ties_in_input_order() {
        assert_eq!(tags(&sort_rows(&rows(), "k", SortOrder::Asc)), ["d", "b", "a", "c"]);
        assert_eq!(tags(&sort_rows(&rows(), "k", SortOrder::Desc)), ["a", "c", "b", "d"]);
    }

    #[test]
    fn sorting_sorted_rows_is_a_no_op() {
        let sorted = sort_rows(&rows(), "k", SortOrder::Desc);
        assert_eq!(sort_rows(&sorted, "k", SortOrder::Desc), sorted);
    }
}
