use crate::domain::entities::cell::Dataset;
use crate::error::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineageState {
    NoData,
    HasOriginalOnly,
    HasProcessedResult,
}

/// Stack of successful rule outputs. The current data is always the top entry.
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    history: Vec<Dataset>,
}

impl Lineage {
    pub fn current(&self) -> Option<&Dataset> {
        self.history.last()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn state(&self, has_uploads: bool) -> LineageState {
        match (has_uploads, self.history.is_empty()) {
            (_, false) => LineageState::HasProcessedResult,
            (true, true) => LineageState::HasOriginalOnly,
            (false, true) => LineageState::NoData,
        }
    }

    pub fn push(&mut self, result: Dataset) {
        self.history.push(result);
    }

    /// Drops the newest result; the first result can only be cleared by `reset`.
    pub fn undo(&mut self) -> Result<&Dataset, RuleError> {
        if self.history.len() <= 1 {
            return Err(RuleError::NothingToUndo);
        }
        self.history.pop();
        self.history.last().ok_or(RuleError::NothingToUndo)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
