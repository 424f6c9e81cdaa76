//! TransferMonitor: polls the transfer subsystem and turns raw status
//! samples into `MonitorEvent`s.
//!
//! One poll loop runs per `start()` as a tokio task. The loop never touches
//! UI state; it only sends events on the channel returned by `start()`,
//! and it checks its cancellation token before every send.

use crate::core::config::{MAX_CONSECUTIVE_QUERY_ERRORS, POLL_INTERVAL};
use crate::core::subsystem::{StatusSample, TransferStatus, TransferSubsystem};
use crate::core::transfer::{MonitorEvent, ProgressSample, TransferHandle};
use crate::utils::sos::SignalOfStop;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Polling policy.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub max_query_errors: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            max_query_errors: MAX_CONSECUTIVE_QUERY_ERRORS,
        }
    }
}

// ── Sample Classification ────────────────────────────────────────────────────

/// Maps status samples of one transfer to events. Progress never goes
/// backwards and repeated percentages are swallowed.
#[derive(Debug, Default)]
pub struct SampleClassifier {
    last_progress: Option<ProgressSample>,
}

impl SampleClassifier {
    pub fn classify(&mut self, sample: &StatusSample) -> Option<MonitorEvent> {
        match sample.status {
            TransferStatus::Running => {
                // Unknown or zero total: nothing to report.
                let total = sample.total_bytes.filter(|t| *t > 0)?;
                let done = sample.downloaded_bytes?;
                let progress = ProgressSample::from_bytes(done, total)?;
                if self.last_progress.is_some_and(|last| last >= progress) {
                    return None;
                }
                self.last_progress = Some(progress);
                Some(MonitorEvent::Progressed(progress))
            }
            TransferStatus::Successful => Some(MonitorEvent::Succeeded),
            TransferStatus::Failed => Some(MonitorEvent::Failed),
            TransferStatus::Pending | TransferStatus::Paused | TransferStatus::Unknown => None,
        }
    }
}

// ── Transfer Monitor ─────────────────────────────────────────────────────────

struct ActiveRun {
    handle: TransferHandle,
    sos: SignalOfStop,
    task: JoinHandle<()>,
}

pub struct TransferMonitor {
    subsystem: Arc<dyn TransferSubsystem>,
    config: MonitorConfig,
    active: Option<ActiveRun>,
}

impl TransferMonitor {
    pub fn new(subsystem: Arc<dyn TransferSubsystem>, config: MonitorConfig) -> Self {
        Self {
            subsystem,
            config,
            active: None,
        }
    }

    /// Begin polling `handle`. Any previous loop is stopped first, so at
    /// most one loop is alive at a time.
    pub fn start(&mut self, handle: TransferHandle) -> mpsc::UnboundedReceiver<MonitorEvent> {
        if self.is_running()
            && let Some(previous) = &self.active
        {
            warn!(
                event = "monitor_restart",
                previous = %previous.handle,
                handle = %handle,
                "Monitor started while another loop was active"
            );
        }
        self.stop();

        let (tx, rx) = mpsc::unbounded_channel();
        let sos = SignalOfStop::new();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.subsystem),
            handle,
            self.config,
            sos.clone(),
            tx,
        ));

        info!(event = "monitor_start", handle = %handle, "Polling transfer status");
        self.active = Some(ActiveRun { handle, sos, task });
        rx
    }

    /// Stop the current loop. Safe to call repeatedly and after the loop
    /// finished on its own.
    pub fn stop(&mut self) {
        if let Some(run) = self.active.take() {
            run.sos.cancel();
            debug!(event = "monitor_stop", handle = %run.handle, "Polling stopped");
        }
    }

    /// Whether a poll loop is still alive.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.sos.cancelled() && !run.task.is_finished())
    }
}

impl Drop for TransferMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Send `event` unless the run was cancelled meanwhile. Returns `false`
/// when the loop should end.
fn deliver(sos: &SignalOfStop, tx: &mpsc::UnboundedSender<MonitorEvent>, event: MonitorEvent) -> bool {
    if sos.cancelled() {
        return false;
    }
    tx.send(event).is_ok()
}

async fn poll_loop(
    subsystem: Arc<dyn TransferSubsystem>,
    handle: TransferHandle,
    config: MonitorConfig,
    sos: SignalOfStop,
    tx: mpsc::UnboundedSender<MonitorEvent>,
) {
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut classifier = SampleClassifier::default();
    let mut consecutive_errors = 0u32;

    loop {
        tokio::select! {
            _ = sos.wait() => break,
            _ = interval.tick() => {}
        }

        let event = match subsystem.query_status(handle) {
            Ok(sample) => {
                consecutive_errors = 0;
                classifier.classify(&sample)
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!(
                    event = "status_query_failed",
                    handle = %handle,
                    attempt = consecutive_errors,
                    error = %e,
                    "Transfer status query failed"
                );
                if consecutive_errors >= config.max_query_errors {
                    error!(
                        event = "status_query_gave_up",
                        handle = %handle,
                        "Giving up after {} consecutive query errors",
                        consecutive_errors
                    );
                    Some(MonitorEvent::Failed)
                } else {
                    None
                }
            }
        };

        let Some(event) = event else { continue };
        if !deliver(&sos, &tx, event) {
            break;
        }
        if event.is_terminal() {
            info!(event = "monitor_terminal", handle = %handle, outcome = ?event);
            sos.cancel();
            break;
        }
    }
}
