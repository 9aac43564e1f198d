use std::sync::Arc;

use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::entities::column_map::ColumnMapper;
use crate::domain::entities::rule::{CompareOp, FilterOp, ProcessOp, Rule, SortOrder};
use crate::domain::rules::{self, CallbackSink, CancelToken, RunOutcome};
use crate::error::RuleError;

/// Synchronous rule engine over one dataset. Rules arrive with column letters
/// and are resolved through the owned [`ColumnMapper`].
#[derive(Debug, Clone)]
pub struct RuleProcessor {
    data: Dataset,
    mapper: ColumnMapper,
}

impl RuleProcessor {
    pub fn new(data: Dataset) -> Self {
        let mapper = ColumnMapper::new(&data);
        Self { data, mapper }
    }

    pub fn update_data(&mut self, data: Dataset) {
        self.mapper.update_data(&data);
        self.data = data;
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn mapper(&self) -> &ColumnMapper {
        &self.mapper
    }

    fn column(&self, letter: &str) -> Result<&str, RuleError> {
        self.mapper
            .original_column(letter)
            .ok_or_else(|| RuleError::Validation(format!("unknown column `{letter}`")))
    }

    pub fn resolve(&self, rule: &Rule) -> Result<Rule, RuleError> {
        self.mapper.resolve(rule)
    }

    pub fn filter(&self, letter: &str, op: FilterOp, value: &str) -> Result<Vec<Row>, RuleError> {
        Ok(rules::filter::filter_rows(&self.data, self.column(letter)?, op, value))
    }

    pub fn sort(&self, letter: &str, order: SortOrder) -> Result<Vec<Row>, RuleError> {
        Ok(rules::sort::sort_rows(&self.data, self.column(letter)?, order))
    }

    pub fn add(&self, letter: &str) -> Result<Vec<Row>, RuleError> {
        Ok(rules::process::add_rows(&self.data, self.column(letter)?))
    }

    pub fn compare(&self, col1: &str, col2: &str, cmp: CompareOp) -> Result<Vec<Row>, RuleError> {
        Ok(rules::process::compare_rows(
            &self.data,
            self.column(col1)?,
            self.column(col2)?,
            cmp,
        ))
    }

    pub fn process(&self, op: &ProcessOp) -> Result<Vec<Row>, RuleError> {
        match op {
            ProcessOp::Add { col } => self.add(col),
            ProcessOp::Compare { col1, col2, cmp } => self.compare(col1, col2, *cmp),
        }
    }

    /// Concatenates `files` in order. Merge does not touch the processor's own data.
    pub fn merge(&self, files: &[Dataset]) -> Vec<Row> {
        rules::merge::merge_rows(files)
    }

    /// Resolves `rule` and applies it in one pass.
    pub fn apply(&self, rule: &Rule, files: &[Dataset]) -> Result<Vec<Row>, RuleError> {
        let resolved = self.resolve(rule)?;
        Ok(rules::apply(&resolved, &self.data, files))
    }

    /// Batched variant of [`apply`](Self::apply): progress after every batch,
    /// `cancel` checked before each one.
    pub fn apply_batched(
        &self,
        rule: &Rule,
        files: &[Dataset],
        batch_size: usize,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError> {
        let resolved = self.resolve(rule)?;
        let mut sink = CallbackSink::new(cancel, on_progress);
        Ok(rules::apply_batched(
            &resolved,
            &self.data,
            files,
            batch_size,
            &mut sink,
        ))
    }

    pub fn filter_batched(
        &self,
        letter: &str,
        op: FilterOp,
        value: &str,
        batch_size: usize,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError> {
        let rule = Rule::Filter {
            col: letter.to_string(),
            op,
            value: value.to_string(),
        };
        self.apply_batched(&rule, &[], batch_size, cancel, on_progress)
    }

    pub fn sort_batched(
        &self,
        letter: &str,
        order: SortOrder,
        batch_size: usize,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError> {
        let rule = Rule::Sort {
            col: letter.to_string(),
            order,
        };
        self.apply_batched(&rule, &[], batch_size, cancel, on_progress)
    }

    pub fn process_batched(
        &self,
        op: &ProcessOp,
        batch_size: usize,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError> {
        self.apply_batched(&Rule::Process(op.clone()), &[], batch_size, cancel, on_progress)
    }

    pub fn merge_batched(
        &self,
        files: &[Dataset],
        batch_size: usize,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> RunOutcome {
        let mut sink = CallbackSink::new(cancel, on_progress);
        rules::merge::merge_batched(files, batch_size, &mut sink)
    }
}

impl Default for RuleProcessor {
    fn default() -> Self {
        Self::new(Arc::new(Vec::new()))
    }
}
