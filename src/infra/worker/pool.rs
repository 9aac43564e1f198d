use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::domain::entities::cell::Row;
use crate::domain::rules::{CancelToken, RunOutcome};
use crate::error::RuleError;
use crate::infra::worker::protocol::{WorkerInbound, WorkerOutbound};
use crate::infra::worker::worker::RuleWorker;
use crate::usecase::ports::engine::{BackgroundEngine, RunRequest};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

enum RunFailure {
    Reported(String),
    Lost,
}

/// Holds zero or one rule worker. The worker is created on the first run and
/// reused until `shutdown`, or until it dies.
pub struct WorkerPool {
    worker: Option<RuleWorker>,
    progress_step: u8,
}

impl WorkerPool {
    pub fn new(progress_step: u8) -> Self {
        Self {
            worker: None,
            progress_step,
        }
    }

    pub fn is_spawned(&self) -> bool {
        self.worker.is_some()
    }

    fn worker(&mut self) -> Result<&RuleWorker, RuleError> {
        if self.worker.is_none() {
            let worker = RuleWorker::spawn(self.progress_step)
                .map_err(|err| RuleError::Processing(format!("{err:#}")))?;
            self.worker = Some(worker);
        }
        self.worker
            .as_ref()
            .ok_or_else(|| RuleError::Processing("background worker unavailable".to_string()))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drive(
    worker: &RuleWorker,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
) -> Result<RunOutcome, RunFailure> {
    let mut stop_sent = false;
    loop {
        if cancel.is_cancelled() && !stop_sent {
            log::debug!("forwarding stop to rule worker");
            if !worker.send(WorkerInbound::Stop) {
                return Err(RunFailure::Lost);
            }
            stop_sent = true;
        }

        match worker.recv_timeout(POLL_INTERVAL) {
            Ok(WorkerOutbound::Progress {
                percent,
                partial_result,
            }) => {
                if percent < 100 {
                    on_progress(percent, partial_result.as_deref());
                }
            }
            Ok(WorkerOutbound::Result { data }) => {
                on_progress(100, Some(&data));
                return Ok(RunOutcome::Completed(data));
            }
            Ok(WorkerOutbound::Error { message }) => return Err(RunFailure::Reported(message)),
            Ok(WorkerOutbound::Cancelled) => return Ok(RunOutcome::Cancelled),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Err(RunFailure::Lost),
        }
    }
}

impl BackgroundEngine for WorkerPool {
    fn run(
        &mut self,
        request: RunRequest,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError> {
        let worker = self.worker()?;
        let sent = worker.send(WorkerInbound::Run {
            rule_config: request.rule,
            data: request.data,
            batch_size: Some(request.batch_size),
            files: request.files,
        });

        let result = if sent {
            drive(worker, cancel, on_progress)
        } else {
            Err(RunFailure::Lost)
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(RunFailure::Reported(message)) => Err(RuleError::Processing(message)),
            Err(RunFailure::Lost) => {
                log::warn!("rule worker disconnected; it will be respawned on the next run");
                self.worker = None;
                Err(RuleError::Processing(
                    "background worker stopped unexpectedly".to_string(),
                ))
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}
