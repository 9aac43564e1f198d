use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::entities::rule::Rule;
use crate::domain::rules::{CancelToken, RunOutcome};
use crate::error::RuleError;

/// A rule with resolved column names plus everything needed to run it elsewhere.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub rule: Rule,
    pub data: Dataset,
    pub files: Vec<Dataset>,
    pub batch_size: usize,
}

/// Runs rules off the calling thread.
pub trait BackgroundEngine: Send {
    /// Blocks until the run ends. `on_progress` sees non-decreasing percents and
    /// a final `100` carrying the result.
    fn run(
        &mut self,
        request: RunRequest,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError>;

    /// Releases any thread held by the engine. The next `run` starts a fresh one.
    fn shutdown(&mut self);
}
