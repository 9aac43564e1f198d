//! Rule semantics over resolved column names.
//!
//! Both the synchronous processor and the background worker call into this
//! module; neither carries its own copy of the rules.

pub mod batch;
pub mod filter;
pub mod merge;
pub mod process;
pub mod sort;
pub mod value;

use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::entities::rule::{ProcessOp, Rule};

pub use batch::{CallbackSink, CancelToken, ProgressSink, RunOutcome, Silent, DEFAULT_BATCH_SIZE};

/// Applies `rule` in one pass. `files` feeds merge; an empty list leaves `rows` as-is.
pub fn apply(rule: &Rule, rows: &[Row], files: &[Dataset]) -> Vec<Row> {
    match rule {
        Rule::Filter { col, op, value } => filter::filter_rows(rows, col, *op, value),
        Rule::Sort { col, order } => sort::sort_rows(rows, col, *order),
        Rule::Process(ProcessOp::Add { col }) => process::add_rows(rows, col),
        Rule::Process(ProcessOp::Compare { col1, col2, cmp }) => {
            process::compare_rows(rows, col1, col2, *cmp)
        }
        Rule::Merge { .. } if files.is_empty() => rows.to_vec(),
        Rule::Merge { .. } => merge::merge_rows(files),
    }
}

/// Applies `rule` in batches of `batch_size`, reporting to `sink` between batches.
pub fn apply_batched(
    rule: &Rule,
    rows: &[Row],
    files: &[Dataset],
    batch_size: usize,
    sink: &mut dyn ProgressSink,
) -> RunOutcome {
    match rule {
        Rule::Filter { col, op, value } => {
            filter::filter_batched(rows, col, *op, value, batch_size, sink)
        }
        Rule::Sort { col, order } => sort::sort_batched(rows, col, *order, batch_size, sink),
        Rule::Process(ProcessOp::Add { col }) => process::add_batched(rows, col, batch_size, sink),
        Rule::Process(ProcessOp::Compare { col1, col2, cmp }) => {
            process::compare_batched(rows, col1, col2, *cmp, batch_size, sink)
        }
        Rule::Merge { .. } if files.is_empty() => {
            if sink.should_stop() {
                return RunOutcome::Cancelled;
            }
            sink.progress(100, rows);
            RunOutcome::Completed(rows.to_vec())
        }
        Rule::Merge { .. } => merge::merge_batched(files, batch_size, sink),
    }
}
