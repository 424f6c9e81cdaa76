use crate::core::alerts::AlertDispatcher;
use crate::core::control::ControlState;
use crate::core::coordinator::{CoordinatorSettings, TransferCoordinator};
use crate::core::error::TransferError;
use crate::core::monitor::MonitorConfig;
use crate::core::subsystem::{EnqueueOptions, TransferSubsystem};
use crate::core::transfer::{NotificationPayload, TransferHandle, TransferRequest};
use crate::ui::alert_tray::AlertTray;
use crate::ui::notify::NotifyManager;
use crate::ui::popups::{ResultTick, ResultView};
use crate::ui::widgets::ProgressButton;
use crate::workers::settings::{AppTheme, Settings, Source};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Mode {
    Download,
    Logs,
}

/// Application state shared by the panels and the event loop.
pub struct App {
    pub mode: Mode,
    pub settings: Settings,
    pub theme: AppTheme,
    /// Source chosen in the picker (radio semantics).
    pub selected_source: Option<usize>,
    /// Highlighted row in the picker.
    pub source_cursor: usize,
    pub button: ProgressButton,
    pub coordinator: TransferCoordinator<AlertTray>,
    pub result_view: Option<ResultView>,
    pub notify: NotifyManager,
    pub log_scroll: usize,
}

impl App {
    pub fn new(
        settings: Settings,
        subsystem: Arc<dyn TransferSubsystem>,
        poll_interval: Duration,
    ) -> Self {
        let theme = settings.theme.accent;
        let labels = &settings.labels;
        let alerts = AlertDispatcher::new(AlertTray::new(), labels.alert_texts());
        let coordinator = TransferCoordinator::new(
            subsystem,
            alerts,
            CoordinatorSettings {
                monitor: MonitorConfig {
                    poll_interval,
                    ..MonitorConfig::default()
                },
                options: EnqueueOptions::new(
                    env!("CARGO_PKG_NAME"),
                    labels.download_description.as_str(),
                ),
                loading_label: labels.loading.clone(),
            },
        );

        Self {
            mode: Mode::Download,
            button: ProgressButton::new(labels.idle.as_str(), theme.button_style()),
            theme,
            selected_source: None,
            source_cursor: 0,
            coordinator,
            result_view: None,
            notify: NotifyManager::new(),
            log_scroll: 0,
            settings,
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.settings.sources
    }

    pub fn selected(&self) -> Option<&Source> {
        self.settings.sources.get(self.selected_source?)
    }

    pub fn select_source(&mut self, index: usize) {
        if index < self.settings.sources.len() {
            self.selected_source = Some(index);
        }
    }

    /// Start downloading the selected source. Rejections end up as toasts.
    pub fn start_download(&mut self) -> Option<TransferHandle> {
        let result = match self.selected() {
            None => Err(TransferError::NoSelection),
            Some(source) => {
                let request = TransferRequest::new(source.url.as_str(), source.name.as_str());
                self.coordinator.start(request, &mut self.button)
            }
        };

        match result {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.notify.transfer_error(&e, &self.settings.labels);
                None
            }
        }
    }

    pub fn cancel_download(&mut self) -> bool {
        let name = self
            .coordinator
            .current_request()
            .map(|r| r.display_name.clone());
        let cancelled = self.coordinator.cancel(&mut self.button);
        if let Some(name) = name.filter(|_| cancelled) {
            self.notify.warn(format!("Cancelled: {}", name));
        }
        cancelled
    }

    /// Apply every monitor event buffered since the last frame.
    pub fn drain_transfer_events(&mut self) -> usize {
        let name = self
            .coordinator
            .current_request()
            .map(|r| r.display_name.clone());
        let applied = self.coordinator.drain_events(&mut self.button);

        if let Some(name) = name
            && self.coordinator.current_request().is_none()
        {
            let succeeded = self.button.state() == ControlState::Completed;
            let outcome = self.settings.labels.outcome(succeeded);
            if succeeded {
                self.notify.success(format!("{}: {}", name, outcome));
            } else {
                self.notify.error(format!("{}: {}", name, outcome));
            }
        }
        applied
    }

    /// Open the result view for `payload`, replacing any open one.
    pub fn open_result_at(&mut self, payload: NotificationPayload, now: Instant) {
        let status = self.settings.labels.outcome(payload.succeeded).to_string();
        let sink = self.coordinator.alerts_mut().sink_mut();
        self.result_view = Some(ResultView::open_at(payload, status, sink, now));
    }

    pub fn open_result(&mut self, payload: NotificationPayload) {
        self.open_result_at(payload, Instant::now());
    }

    pub fn confirm_result_at(&mut self, now: Instant) -> bool {
        self.result_view
            .as_mut()
            .is_some_and(|view| view.confirm_at(now))
    }

    /// Advance animations. Returns `true` while the result view is open.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.button.tick_at(now);
        if let Some(view) = self.result_view.as_mut()
            && view.tick_at(now) == ResultTick::Dismissed
        {
            self.result_view = None;
        }
        self.result_view.is_some()
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.button.set_style(self.theme.button_style());
        info!(event = "theme_changed", theme = self.theme.label());
        self.notify.info(format!("Theme: {}", self.theme.label()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RESULT_TRANSITION;
    use crate::core::subsystem::testing::ScriptedSubsystem;
    use crate::core::subsystem::{StatusSample, TransferStatus};
    use crate::ui::notify::NotifyLevel;

    fn app(subsystem: &Arc<ScriptedSubsystem>) -> App {
        let subsystem: Arc<dyn TransferSubsystem> = subsystem.clone();
        App::new(Settings::default(), subsystem, Duration::from_millis(10))
    }

    async fn run_to_completion(app: &mut App) {
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.drain_transfer_events();
            if app.coordinator.active_handle().is_none() {
                return;
            }
        }
        panic!("transfer did not finish");
    }

    #[tokio::test(start_paused = true)]
    async fn start_without_selection_shows_toast() {
        let subsystem = Arc::new(ScriptedSubsystem::default());
        let mut app = app(&subsystem);

        assert_eq!(app.start_download(), None);

        let toast = app.notify.current().unwrap();
        assert_eq!(toast.message, "Please select the file to download");
        assert_eq!(subsystem.enqueue_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_shows_busy_toast() {
        let subsystem = Arc::new(ScriptedSubsystem::default());
        let mut app = app(&subsystem);
        app.select_source(2);

        assert!(app.start_download().is_some());
        assert_eq!(app.start_download(), None);

        let toast = app.notify.current().unwrap();
        assert_eq!(toast.message, "A download is already in progress");
        assert_eq!(toast.level, NotifyLevel::Warning);
        let enqueued = subsystem.enqueued.lock().unwrap();
        assert_eq!(enqueued.len(), 1);
        assert!(enqueued[0].0.contains("square/retrofit"));
    }

    #[test]
    fn selecting_out_of_range_is_ignored() {
        let subsystem = Arc::new(ScriptedSubsystem::default());
        let mut app = app(&subsystem);
        app.select_source(1);
        app.select_source(9);
        assert_eq!(app.selected_source, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_download_alert_opens_result_view() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![
            Ok(StatusSample::running(40, 100)),
            Ok(StatusSample::of(TransferStatus::Successful)),
        ]));
        let mut app = app(&subsystem);
        app.select_source(0);
        let handle = app.start_download().unwrap();
        assert_eq!(app.button.label(), "Downloading");

        run_to_completion(&mut app).await;

        assert_eq!(app.button.state(), ControlState::Completed);
        assert_eq!(app.notify.current().unwrap().level, NotifyLevel::Success);
        let tray = app.coordinator.alerts().sink();
        assert_eq!(tray.entries().len(), 1);
        assert_eq!(tray.entries()[0].id, handle.correlation_id());

        assert_eq!(*subsystem.removed.lock().unwrap(), vec![handle]);

        let payload = app.coordinator.alerts().sink().activate_selected().unwrap();
        let t0 = Instant::now();
        app.open_result_at(payload, t0);
        assert!(app.coordinator.alerts().sink().is_empty());
        let view = app.result_view.as_ref().unwrap();
        assert!(view.payload().succeeded);
        assert!(view.payload().display_name.starts_with("Glide"));

        assert!(app.tick(t0 + RESULT_TRANSITION));
        assert!(app.confirm_result_at(t0 + RESULT_TRANSITION));
        assert!(!app.tick(t0 + RESULT_TRANSITION * 2));
        assert!(app.result_view.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_returns_to_idle_without_alert() {
        let subsystem = Arc::new(ScriptedSubsystem::new(vec![Ok(StatusSample::of(
            TransferStatus::Pending,
        ))]));
        let mut app = app(&subsystem);
        app.select_source(1);
        app.start_download().unwrap();

        assert!(app.cancel_download());
        assert!(!app.cancel_download());

        assert_eq!(app.button.state(), ControlState::Idle);
        assert!(app.coordinator.alerts().sink().is_empty());
        assert_eq!(subsystem.removed.lock().unwrap().len(), 1);
        assert!(app.notify.current().unwrap().message.starts_with("Cancelled"));
    }

    #[test]
    fn theme_cycle_restyles_button() {
        let subsystem = Arc::new(ScriptedSubsystem::default());
        let mut app = app(&subsystem);
        app.cycle_theme();
        assert_eq!(app.theme, AppTheme::Blue);
        assert_eq!(app.notify.current().unwrap().message, "Theme: Blue");
    }
}
