//! TransferCoordinator: owns the single in-flight transfer.
//!
//! Start enqueues with the subsystem, flips the progress control into
//! `Loading` and starts the monitor. Monitor events are drained by the
//! caller and fed back through `on_event`; the terminal event settles the
//! transfer, clears the handle slot and raises the completion alert.

use crate::core::alerts::{AlertDispatcher, NotificationSink};
use crate::core::control::{ControlState, ProgressControl};
use crate::core::error::TransferError;
use crate::core::monitor::{MonitorConfig, TransferMonitor};
use crate::core::subsystem::{EnqueueOptions, TransferSubsystem};
use crate::core::transfer::{MonitorEvent, TransferHandle, TransferRequest};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    InFlight,
    /// Terminal event received, alert not raised yet.
    Settling,
}

/// Fixed inputs of every transfer started by the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub monitor: MonitorConfig,
    pub options: EnqueueOptions,
    /// Caption shown on the control while loading.
    pub loading_label: String,
}

pub struct TransferCoordinator<N: NotificationSink> {
    subsystem: Arc<dyn TransferSubsystem>,
    monitor: TransferMonitor,
    slot: watch::Sender<Option<TransferHandle>>,
    events: Option<mpsc::UnboundedReceiver<MonitorEvent>>,
    current: Option<TransferRequest>,
    phase: CoordinatorPhase,
    alerts: AlertDispatcher<N>,
    options: EnqueueOptions,
    loading_label: String,
}

impl<N: NotificationSink> TransferCoordinator<N> {
    pub fn new(
        subsystem: Arc<dyn TransferSubsystem>,
        alerts: AlertDispatcher<N>,
        settings: CoordinatorSettings,
    ) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            monitor: TransferMonitor::new(Arc::clone(&subsystem), settings.monitor),
            subsystem,
            slot,
            events: None,
            current: None,
            phase: CoordinatorPhase::Idle,
            alerts,
            options: settings.options,
            loading_label: settings.loading_label,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    pub fn active_handle(&self) -> Option<TransferHandle> {
        *self.slot.borrow()
    }

    pub fn current_request(&self) -> Option<&TransferRequest> {
        self.current.as_ref()
    }

    /// Observe the handle slot. The coordinator is the only writer.
    pub fn watch_slot(&self) -> watch::Receiver<Option<TransferHandle>> {
        self.slot.subscribe()
    }

    pub fn alerts(&self) -> &AlertDispatcher<N> {
        &self.alerts
    }

    pub fn alerts_mut(&mut self) -> &mut AlertDispatcher<N> {
        &mut self.alerts
    }

    /// Start `request`. Rejected with `Busy` while another transfer holds
    /// the slot; the subsystem is not contacted in that case.
    pub fn start(
        &mut self,
        request: TransferRequest,
        control: &mut impl ProgressControl,
    ) -> Result<TransferHandle, TransferError> {
        let active = self.active_handle();
        if let Some(active) = active {
            warn!(
                event = "start_rejected",
                active = %active,
                name = %request.display_name,
                "A download is already in progress"
            );
            return Err(TransferError::Busy);
        }

        let handle = self
            .subsystem
            .enqueue(&request.url, &self.options)
            .map_err(|e| {
                warn!(event = "enqueue_failed", url = %request.url, error = %e);
                TransferError::Enqueue(e)
            })?;

        self.slot.send_replace(Some(handle));
        control.set_label(&self.loading_label);
        control.set_state(ControlState::Loading);
        self.events = Some(self.monitor.start(handle));

        info!(
            event = "transfer_started",
            handle = %handle,
            name = %request.display_name,
            url = %request.url,
        );
        self.current = Some(request);
        self.phase = CoordinatorPhase::InFlight;
        Ok(handle)
    }

    /// Next buffered monitor event, without waiting.
    pub fn try_next_event(&mut self) -> Option<MonitorEvent> {
        self.events.as_mut()?.try_recv().ok()
    }

    /// Wait for the next monitor event. `None` once no run is attached or
    /// the run ended.
    #[cfg(test)]
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        self.events.as_mut()?.recv().await
    }

    /// Feed every buffered event into `on_event`. Returns how many were
    /// applied.
    pub fn drain_events(&mut self, control: &mut impl ProgressControl) -> usize {
        let mut applied = 0;
        while let Some(event) = self.try_next_event() {
            self.on_event(event, control);
            applied += 1;
        }
        applied
    }

    pub fn on_event(&mut self, event: MonitorEvent, control: &mut impl ProgressControl) {
        if self.phase != CoordinatorPhase::InFlight {
            debug!(event = "stale_monitor_event", phase = ?self.phase, outcome = ?event);
            return;
        }
        match event {
            MonitorEvent::Progressed(sample) => control.set_progress(f32::from(sample.percent())),
            MonitorEvent::Succeeded => self.settle(true, control),
            MonitorEvent::Failed => self.settle(false, control),
        }
    }

    fn settle(&mut self, succeeded: bool, control: &mut impl ProgressControl) {
        self.phase = CoordinatorPhase::Settling;
        self.monitor.stop();
        self.events = None;
        let handle = self.slot.send_replace(None);
        let request = self.current.take();
        // Finished transfers are dropped from the subsystem's status table;
        // a successful download keeps its file.
        if let Some(handle) = handle {
            self.subsystem.remove(handle);
        }

        control.set_state(if succeeded {
            ControlState::Completed
        } else {
            ControlState::Failed
        });

        // The slot is already empty here: a start() issued from the alert
        // path goes through.
        if let (Some(handle), Some(request)) = (handle, request) {
            info!(
                event = "transfer_finished",
                handle = %handle,
                name = %request.display_name,
                succeeded,
            );
            self.alerts
                .notify(handle.correlation_id(), &request.display_name, succeeded);
        }
        self.phase = CoordinatorPhase::Idle;
    }

    /// Abandon the in-flight transfer without alerting. Returns `false` when
    /// nothing was in flight.
    pub fn cancel(&mut self, control: &mut impl ProgressControl) -> bool {
        let Some(handle) = self.active_handle() else {
            return false;
        };

        self.monitor.stop();
        self.events = None;
        self.subsystem.remove(handle);
        self.slot.send_replace(None);
        self.current = None;
        control.set_state(ControlState::Idle);
        self.phase = CoordinatorPhase::Idle;

        info!(event = "transfer_cancelled", handle = %handle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::testing::{RecordingSink, texts};
    use crate::core::alerts::{Alert, AlertChannel};
    use crate::core::subsystem::testing::ScriptedSubsystem;
    use crate::core::subsystem::{StatusSample, TransferStatus};
    use crate::core::transfer::ProgressSample;
    use crate::ui::widgets::progress_button::{ButtonStyle, ProgressButton};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        State(ControlState),
        Progress(f32),
        Label(String),
    }

    #[derive(Default)]
    struct RecordingControl {
        calls: Vec<Call>,
    }

    impl ProgressControl for RecordingControl {
        fn set_state(&mut self, state: ControlState) {
            self.calls.push(Call::State(state));
        }

        fn set_progress(&mut self, percent: f32) {
            self.calls.push(Call::Progress(percent));
        }

        fn set_label(&mut self, text: &str) {
            self.calls.push(Call::Label(text.to_string()));
        }
    }

    /// Sink that records the slot content at the moment an alert is posted.
    #[derive(Default)]
    struct SlotProbeSink {
        inner: RecordingSink,
        slot: Option<watch::Receiver<Option<TransferHandle>>>,
        slot_at_post: Vec<Option<TransferHandle>>,
    }

    impl NotificationSink for SlotProbeSink {
        fn register_channel(&mut self, channel: &AlertChannel) {
            self.inner.register_channel(channel);
        }

        fn post(&mut self, id: i64, alert: Alert) {
            let seen = self.slot.as_ref().and_then(|rx| *rx.borrow());
            self.slot_at_post.push(seen);
            self.inner.post(id, alert);
        }

        fn cancel(&mut self, id: i64) {
            self.inner.cancel(id);
        }
    }

    fn settings() -> CoordinatorSettings {
        CoordinatorSettings {
            monitor: MonitorConfig {
                poll_interval: Duration::from_millis(10),
                max_query_errors: 3,
            },
            options: EnqueueOptions::new("fetchdrop", "Downloading archive"),
            loading_label: "Downloading".to_string(),
        }
    }

    fn build<N: NotificationSink>(
        subsystem: &Arc<ScriptedSubsystem>,
        sink: N,
    ) -> TransferCoordinator<N> {
        let subsystem: Arc<dyn TransferSubsystem> = subsystem.clone();
        TransferCoordinator::new(subsystem, AlertDispatcher::new(sink, texts()), settings())
    }

    fn glide() -> TransferRequest {
        TransferRequest::new("https://example.com/glide.zip", "Glide")
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_busy_and_does_not_enqueue() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![Ok(StatusSample::of(
            TransferStatus::Pending,
        ))]));
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut control = RecordingControl::default();

        let first = coordinator.start(glide(), &mut control).unwrap();
        let calls_after_first = control.calls.len();
        let second = coordinator.start(glide(), &mut control);

        assert!(matches!(second, Err(TransferError::Busy)));
        assert_eq!(subsystem.enqueue_count(), 1);
        assert_eq!(coordinator.active_handle(), Some(first));
        assert_eq!(coordinator.phase(), CoordinatorPhase::InFlight);
        assert_eq!(control.calls.len(), calls_after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn start_sets_label_then_loading() {
        let subsystem = Arc::new(ScriptedSubsystem::default());
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut control = RecordingControl::default();

        coordinator.start(glide(), &mut control).unwrap();

        assert_eq!(
            control.calls,
            vec![
                Call::Label("Downloading".to_string()),
                Call::State(ControlState::Loading)
            ]
        );
        let enqueued = subsystem.enqueued.lock().unwrap();
        assert_eq!(enqueued[0].0, "https://example.com/glide.zip");
        assert!(enqueued[0].1.allow_metered);
        assert!(enqueued[0].1.allow_roaming);
        assert!(!enqueued[0].1.requires_charging);
    }

    #[tokio::test(start_paused = true)]
    async fn full_run_drives_button_to_completed() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![
            Ok(StatusSample::running(10, 100)),
            Ok(StatusSample::running(55, 100)),
            Ok(StatusSample::of(TransferStatus::Successful)),
        ]));
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut button = ProgressButton::new("Download", ButtonStyle::default());

        let handle = coordinator.start(glide(), &mut button).unwrap();
        let mut seen = Vec::new();
        while let Some(event) = coordinator.next_event().await {
            seen.push(event);
            coordinator.on_event(event, &mut button);
        }

        assert_eq!(
            seen,
            vec![
                MonitorEvent::Progressed(ProgressSample::clamped(10)),
                MonitorEvent::Progressed(ProgressSample::clamped(55)),
                MonitorEvent::Succeeded,
            ]
        );
        assert_eq!(button.state(), ControlState::Completed);
        assert_eq!(button.displayed_progress(), 0.0);
        assert_eq!(button.label(), "Download");
        assert_eq!(coordinator.phase(), CoordinatorPhase::Idle);
        assert_eq!(coordinator.active_handle(), None);
        assert_eq!(*subsystem.removed.lock().unwrap(), vec![handle]);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_forwarded_to_control() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![
            Ok(StatusSample::running(25, 100)),
            Ok(StatusSample::of(TransferStatus::Failed)),
        ]));
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut control = RecordingControl::default();

        coordinator.start(glide(), &mut control).unwrap();
        while let Some(event) = coordinator.next_event().await {
            coordinator.on_event(event, &mut control);
        }

        assert_eq!(
            &control.calls[2..],
            &[Call::Progress(25.0), Call::State(ControlState::Failed)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_event_clears_slot_before_alerting() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![Ok(StatusSample::of(
            TransferStatus::Failed,
        ))]));
        let mut coordinator = build(&subsystem, SlotProbeSink::default());
        let slot = coordinator.watch_slot();
        coordinator.alerts_mut().sink_mut().slot = Some(slot);
        let mut control = RecordingControl::default();

        let handle = coordinator.start(glide(), &mut control).unwrap();
        while let Some(event) = coordinator.next_event().await {
            coordinator.on_event(event, &mut control);
        }

        let sink = coordinator.alerts().sink();
        assert_eq!(sink.slot_at_post, vec![None]);
        assert_eq!(sink.inner.posts.len(), 1);
        let (id, alert) = &sink.inner.posts[0];
        assert_eq!(*id, handle.correlation_id());
        assert_eq!(alert.text, "Your download failed");

        // A fresh start goes through right away.
        coordinator.start(glide(), &mut control).unwrap();
        assert_eq!(subsystem.enqueue_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_failure_stays_idle() {
        let subsystem = Arc::new(ScriptedSubsystem::rejecting());
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut control = RecordingControl::default();

        let result = coordinator.start(glide(), &mut control);

        assert!(matches!(result, Err(TransferError::Enqueue(_))));
        assert_eq!(coordinator.phase(), CoordinatorPhase::Idle);
        assert_eq!(coordinator.active_handle(), None);
        assert!(control.calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_events_and_skips_alert() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![
            Ok(StatusSample::running(20, 100)),
            Ok(StatusSample::of(TransferStatus::Pending)),
        ]));
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut control = RecordingControl::default();

        let handle = coordinator.start(glide(), &mut control).unwrap();
        tokio::time::sleep(Duration::from_millis(35)).await;

        assert!(coordinator.cancel(&mut control));
        assert!(!coordinator.cancel(&mut control));

        assert_eq!(coordinator.try_next_event(), None);
        assert_eq!(coordinator.next_event().await, None);
        assert_eq!(*subsystem.removed.lock().unwrap(), vec![handle]);
        assert_eq!(control.calls.last(), Some(&Call::State(ControlState::Idle)));
        assert!(coordinator.alerts().sink().posts.is_empty());
        assert_eq!(coordinator.active_handle(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_events_after_settle_are_ignored() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![Ok(StatusSample::of(
            TransferStatus::Successful,
        ))]));
        let mut coordinator = build(&subsystem, RecordingSink::default());
        let mut control = RecordingControl::default();

        coordinator.start(glide(), &mut control).unwrap();
        while let Some(event) = coordinator.next_event().await {
            coordinator.on_event(event, &mut control);
        }
        let calls = control.calls.len();

        coordinator.on_event(MonitorEvent::Failed, &mut control);
        coordinator.on_event(
            MonitorEvent::Progressed(ProgressSample::clamped(90)),
            &mut control,
        );

        assert_eq!(control.calls.len(), calls);
        assert_eq!(coordinator.alerts().sink().posts.len(), 1);
    }
}
