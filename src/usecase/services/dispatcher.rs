use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::EngineConfig;
use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::entities::lineage::{Lineage, LineageState};
use crate::domain::entities::rule::{DataSource, Rule, RuleDescriptor};
use crate::domain::entities::upload::{UploadedFile, Uploads};
use crate::domain::rules::{CancelToken, RunOutcome};
use crate::error::RuleError;
use crate::infra::worker::WorkerPool;
use crate::usecase::ports::engine::{BackgroundEngine, RunRequest};
use crate::usecase::services::rule_processor::RuleProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Sync,
    Worker,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied { rows: Dataset, route: Route },
    /// The rule ran and left no rows. The empty result is still the new current data.
    ZeroMatches { route: Route },
    /// Stopped by the caller; lineage is untouched.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageStats {
    pub original_rows: usize,
    pub current_rows: Option<usize>,
    pub history_depth: usize,
}

#[derive(Debug, Default)]
struct Session {
    uploads: Uploads,
    lineage: Lineage,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, RuleError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(RuleError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What a rule will run over, captured while the session lock is held.
struct Prepared {
    rule: Rule,
    data: Dataset,
    files: Vec<Dataset>,
    source_len: usize,
}

/// Owns the uploads and the lineage, and decides where each rule runs.
///
/// All methods take `&self`; one rule may be in flight at a time and a second
/// `apply_rule` during a run fails with [`RuleError::Busy`].
pub struct RuleDispatcher {
    config: EngineConfig,
    session: Mutex<Session>,
    busy: AtomicBool,
    engine: Mutex<Box<dyn BackgroundEngine>>,
}

impl RuleDispatcher {
    pub fn new(config: EngineConfig) -> Self {
        let pool = WorkerPool::new(config.progress_step);
        Self::with_engine(config, Box::new(pool))
    }

    pub fn with_engine(config: EngineConfig, engine: Box<dyn BackgroundEngine>) -> Self {
        Self {
            config,
            session: Mutex::new(Session::default()),
            busy: AtomicBool::new(false),
            engine: Mutex::new(engine),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn route_for(&self, len: usize) -> Route {
        if len > self.config.route_threshold {
            Route::Worker
        } else {
            Route::Sync
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> LineageState {
        let session = self.session();
        session.lineage.state(!session.uploads.is_empty())
    }

    pub fn stats(&self) -> LineageStats {
        let session = self.session();
        LineageStats {
            original_rows: session.uploads.original_row_count(),
            current_rows: session.lineage.current().map(|rows| rows.len()),
            history_depth: session.lineage.depth(),
        }
    }

    pub fn uploads(&self) -> Uploads {
        self.session().uploads.clone()
    }

    pub fn add_upload(&self, file: UploadedFile) {
        log::info!("upload added: {} ({} rows)", file.name, file.row_count());
        self.session().uploads.add(file);
    }

    /// Forgets every upload and every result.
    pub fn clear_uploads(&self) -> Result<(), RuleError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let mut session = self.session();
        session.uploads.clear();
        session.lineage.reset();
        log::info!("uploads cleared");
        Ok(())
    }

    /// Primary rows of every upload, concatenated.
    pub fn original_rows(&self) -> Dataset {
        self.session().uploads.original_rows()
    }

    /// The latest rule output, if any rule has been applied.
    pub fn current_rows(&self) -> Option<Dataset> {
        self.session().lineage.current().cloned()
    }

    /// Rows to show: the latest result, or the original data before any rule.
    pub fn display_rows(&self) -> Dataset {
        let session = self.session();
        session
            .lineage
            .current()
            .cloned()
            .unwrap_or_else(|| session.uploads.original_rows())
    }

    fn source_rows(session: &Session, source: DataSource) -> Result<Dataset, RuleError> {
        match source {
            DataSource::Original => {
                let rows = session.uploads.original_rows();
                if rows.is_empty() {
                    return Err(RuleError::NoData);
                }
                Ok(rows)
            }
            DataSource::Previous => session
                .lineage
                .current()
                .filter(|rows| !rows.is_empty())
                .cloned()
                .ok_or(RuleError::NoPreviousResult),
        }
    }

    /// `(letter, column)` pairs for the rows `source` would feed a rule.
    pub fn column_letters(&self, source: DataSource) -> Result<Vec<(String, String)>, RuleError> {
        let rows = Self::source_rows(&self.session(), source)?;
        let processor = RuleProcessor::new(rows);
        Ok(processor
            .mapper()
            .entries()
            .map(|(letter, column)| (letter.to_string(), column.to_string()))
            .collect())
    }

    fn prepare(&self, descriptor: &RuleDescriptor) -> Result<(Prepared, RuleProcessor), RuleError> {
        let session = self.session();
        if session.lineage.state(!session.uploads.is_empty()) == LineageState::NoData {
            return Err(RuleError::NoData);
        }

        if let Rule::Merge { merge_type } = descriptor.rule {
            let files = session.uploads.merge_sources(merge_type)?;
            let source_len = files.iter().map(|rows| rows.len()).sum();
            return Ok((
                Prepared {
                    rule: descriptor.rule.clone(),
                    data: Arc::new(Vec::new()),
                    files,
                    source_len,
                },
                RuleProcessor::default(),
            ));
        }

        let data = Self::source_rows(&session, descriptor.data_source)?;
        drop(session);

        let processor = RuleProcessor::new(Arc::clone(&data));
        let rule = processor.resolve(&descriptor.rule)?;
        let source_len = data.len();
        Ok((
            Prepared {
                rule,
                data,
                files: Vec::new(),
                source_len,
            },
            processor,
        ))
    }

    /// Applies one rule and records the result in the lineage.
    ///
    /// `on_progress` receives non-decreasing percents; the `100` call carries
    /// the full result. Errors and cancellation leave the lineage as it was.
    pub fn apply_rule(
        &self,
        descriptor: &RuleDescriptor,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<ApplyOutcome, RuleError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let (prepared, processor) = self.prepare(descriptor)?;
        let route = self.route_for(prepared.source_len);
        log::debug!(
            "dispatching {} over {} rows to {:?}",
            prepared.rule.kind(),
            prepared.source_len,
            route
        );

        let outcome = match route {
            Route::Sync => processor.apply_batched(
                &descriptor.rule,
                &prepared.files,
                self.config.batch_size,
                cancel,
                on_progress,
            )?,
            Route::Worker => {
                let request = RunRequest {
                    rule: prepared.rule.clone(),
                    data: prepared.data,
                    files: prepared.files,
                    batch_size: self.config.batch_size,
                };
                let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
                engine.run(request, cancel, on_progress)?
            }
        };

        let rows = match outcome {
            RunOutcome::Completed(rows) => Arc::new(rows),
            RunOutcome::Cancelled => {
                log::info!("{} cancelled", prepared.rule.kind());
                return Ok(ApplyOutcome::Cancelled);
            }
        };

        let mut session = self.session();
        session.lineage.push(Arc::clone(&rows));
        if descriptor.is_merge() {
            session.uploads.replace_with_merged(Arc::clone(&rows));
        }
        log::info!(
            "{} applied via {:?}: {} -> {} rows (history depth {})",
            prepared.rule.kind(),
            route,
            prepared.source_len,
            rows.len(),
            session.lineage.depth()
        );

        if rows.is_empty() {
            Ok(ApplyOutcome::ZeroMatches { route })
        } else {
            Ok(ApplyOutcome::Applied { rows, route })
        }
    }

    /// Drops the newest result and returns the one beneath it.
    pub fn undo(&self) -> Result<Dataset, RuleError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let mut session = self.session();
        let restored = session.lineage.undo().map(Arc::clone)?;
        log::info!("undo: history depth {}", session.lineage.depth());
        Ok(restored)
    }

    pub fn reset_to_original(&self) -> Result<(), RuleError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        self.session().lineage.reset();
        log::info!("lineage reset to original data");
        Ok(())
    }

    /// Stops the background worker; the next large rule starts a new one.
    pub fn shutdown_worker(&self) {
        self.engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown();
    }
}
