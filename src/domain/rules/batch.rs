use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::entities::cell::Row;

pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Cooperative cancellation flag, checked at the top of every batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(Vec<Row>),
    Cancelled,
}

/// Receives batch boundaries from a running rule.
pub trait ProgressSink {
    /// Called after each batch; `percent == 100` carries the complete result.
    fn progress(&mut self, percent: u8, partial: &[Row]);

    /// Polled before each batch; `true` abandons the run.
    fn should_stop(&mut self) -> bool;
}

/// Forwards every batch to a callback and stops on a [`CancelToken`].
pub struct CallbackSink<'a> {
    cancel: &'a CancelToken,
    on_progress: &'a mut dyn FnMut(u8, Option<&[Row]>),
}

impl<'a> CallbackSink<'a> {
    pub fn new(cancel: &'a CancelToken, on_progress: &'a mut dyn FnMut(u8, Option<&[Row]>)) -> Self {
        Self {
            cancel,
            on_progress,
        }
    }
}

impl ProgressSink for CallbackSink<'_> {
    fn progress(&mut self, percent: u8, partial: &[Row]) {
        (self.on_progress)(percent, Some(partial));
    }

    fn should_stop(&mut self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Sink for plain synchronous calls.
pub struct Silent;

impl ProgressSink for Silent {
    fn progress(&mut self, _percent: u8, _partial: &[Row]) {}

    fn should_stop(&mut self) -> bool {
        false
    }
}

pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 || done >= total {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Consecutive index ranges of at most `batch_size` covering `0..total`.
pub struct Batches {
    next: usize,
    total: usize,
    batch_size: usize,
}

impl Batches {
    pub fn new(total: usize, batch_size: usize) -> Self {
        Self {
            next: 0,
            total,
            batch_size: batch_size.max(1),
        }
    }
}

impl Iterator for Batches {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next;
        self.next = start.saturating_add(self.batch_size).min(self.total);
        Some(start..self.next)
    }
}

/// Reports an intermediate batch and yields the thread before the next one.
/// Only the final report may say 100, so intermediate ones stop at 99.
pub(crate) fn between_batches(sink: &mut dyn ProgressSink, done: usize, total: usize, partial: &[Row]) {
    if done < total {
        sink.progress(percent(done, total).min(99), partial);
        std::thread::yield_now();
    }
}
