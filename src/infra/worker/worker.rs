use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::domain::entities::cell::Row;
use crate::domain::rules::{self, ProgressSink, RunOutcome, DEFAULT_BATCH_SIZE};
use crate::infra::worker::protocol::{WorkerInbound, WorkerOutbound};

/// Handle to the dedicated rule thread.
pub struct RuleWorker {
    inbox: Sender<WorkerInbound>,
    outbox: Receiver<WorkerOutbound>,
    handle: Option<JoinHandle<()>>,
}

impl RuleWorker {
    pub fn spawn(progress_step: u8) -> Result<Self> {
        let (inbox_tx, inbox_rx) = mpsc::channel();
        let (outbox_tx, outbox_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("rule-worker".to_string())
            .spawn(move || worker_loop(inbox_rx, outbox_tx, progress_step))
            .context("failed to spawn rule worker thread")?;
        log::debug!("rule worker spawned");

        Ok(Self {
            inbox: inbox_tx,
            outbox: outbox_rx,
            handle: Some(handle),
        })
    }

    /// Fails only when the worker thread is gone.
    pub fn send(&self, message: WorkerInbound) -> bool {
        self.inbox.send(message).is_ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerOutbound, RecvTimeoutError> {
        self.outbox.recv_timeout(timeout)
    }

    pub fn shutdown(mut self) {
        let _ = self.inbox.send(WorkerInbound::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("rule worker panicked while shutting down");
            }
        }
        log::debug!("rule worker shut down");
    }
}

fn worker_loop(inbox: Receiver<WorkerInbound>, outbox: Sender<WorkerOutbound>, progress_step: u8) {
    while let Ok(message) = inbox.recv() {
        match message {
            WorkerInbound::Run {
                rule_config,
                data,
                batch_size,
                files,
            } => {
                log::debug!("worker run: {} over {} rows", rule_config.kind(), data.len());
                let mut sink = WorkerSink {
                    inbox: &inbox,
                    outbox: &outbox,
                    progress_step: progress_step.max(1),
                    last_sent: 0,
                    stopped: false,
                    shutdown: false,
                };
                let batch_size = batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
                let run = panic::catch_unwind(AssertUnwindSafe(|| {
                    rules::apply_batched(&rule_config, &data, &files, batch_size, &mut sink)
                }));
                let shutdown = sink.shutdown;

                let reply = match run {
                    Ok(RunOutcome::Completed(rows)) => WorkerOutbound::Result { data: rows },
                    Ok(RunOutcome::Cancelled) => WorkerOutbound::Cancelled,
                    Err(payload) => WorkerOutbound::Error {
                        message: panic_message(payload.as_ref()),
                    },
                };
                if outbox.send(reply).is_err() || shutdown {
                    break;
                }
            }
            // A stop that arrives after its run finished has nothing to stop.
            WorkerInbound::Stop => {}
            WorkerInbound::Shutdown => break,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule worker panicked".to_string()
    }
}

/// Throttles progress to `progress_step` points and watches the inbox for stops.
struct WorkerSink<'a> {
    inbox: &'a Receiver<WorkerInbound>,
    outbox: &'a Sender<WorkerOutbound>,
    progress_step: u8,
    last_sent: u8,
    stopped: bool,
    shutdown: bool,
}

impl ProgressSink for WorkerSink<'_> {
    fn progress(&mut self, percent: u8, _partial: &[Row]) {
        // The terminal result carries the rows; 100 is not repeated as progress.
        if percent >= 100 || percent < self.last_sent.saturating_add(self.progress_step) {
            return;
        }
        self.last_sent = percent;
        let _ = self.outbox.send(WorkerOutbound::Progress {
            percent,
            partial_result: None,
        });
    }

    fn should_stop(&mut self) -> bool {
        loop {
            match self.inbox.try_recv() {
                Ok(WorkerInbound::Stop) => self.stopped = true,
                Ok(WorkerInbound::Shutdown) | Err(TryRecvError::Disconnected) => {
                    self.stopped = true;
                    self.shutdown = true;
                }
                Ok(WorkerInbound::Run { .. }) => {
                    log::warn!("rule worker received a run while busy; ignoring it");
                }
                Err(TryRecvError::Empty) => break,
            }
            if self.shutdown {
                break;
            }
        }
        self.stopped
    }
}
