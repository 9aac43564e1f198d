use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::rules::batch::{between_batches, Batches, ProgressSink, RunOutcome};

/// Ordered concatenation; columns are not reconciled.
pub fn merge_rows(files: &[Dataset]) -> Vec<Row> {
    files.iter().flat_map(|rows| rows.iter().cloned()).collect()
}

pub fn merge_batched(files: &[Dataset], batch_size: usize, sink: &mut dyn ProgressSink) -> RunOutcome {
    let total: usize = files.iter().map(|rows| rows.len()).sum();
    let mut source = files.iter().flat_map(|rows| rows.iter());
    let mut merged = Vec::with_capacity(total);
    for range in Batches::new(total, batch_size) {
        if sink.should_stop() {
            return RunOutcome::Cancelled;
        }
        let end = range.end;
        merged.extend(source.by_ref().take(range.len()).cloned());
        between_batches(sink, end, total, &merged);
    }
    sink.progress(100, &merged);
    RunOutcome::Completed(merged)
}
