use crate::core::config::FRAME_INTERVAL;
use crate::core::download_manager::HttpDownloadManager;
use crate::core::subsystem::TransferSubsystem;
use crate::core::transfer::TransferHandle;
use crate::ui::helpers::truncate_text;
use crate::ui::panels::{DownloadPanel, LogsPanel};
use crate::ui::popups::{UIContext, UIPopup};
use crate::ui::traits::{Action, Component, Handler};
use crate::utils::log_buffer::LogBuffer;
use crate::utils::sos::SignalOfStop;
use crate::workers::app::{App, Mode};
use crate::workers::args::Args;
use crate::workers::settings::Settings;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::info;

/// Owns the terminal, the panels and the app state for the lifetime of the
/// TUI.
pub struct UIExecuter {
    app: App,
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    context: UIContext,
    slot: watch::Receiver<Option<TransferHandle>>,
    download_dir: PathBuf,

    download_panel: DownloadPanel,
    logs_panel: LogsPanel,
}

pub async fn run(
    args: Args,
    settings: Settings,
    sos: SignalOfStop,
    log_buffer: LogBuffer,
) -> anyhow::Result<()> {
    let download_dir = args.download_dir(crate::utils::data_dir::get());
    let subsystem: Arc<dyn TransferSubsystem> = Arc::new(HttpDownloadManager::new(&download_dir)?);
    let app = App::new(settings, subsystem, args.poll_interval());

    info!(
        event = "ui_start",
        download_dir = %download_dir.display(),
        poll_ms = args.poll_interval().as_millis() as u64,
        sources = app.sources().len(),
    );

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut executer = UIExecuter::new(app, terminal, log_buffer, download_dir);
    let result = executer.run_event_loop(&sos).await;

    // An unfinished download would otherwise keep writing after exit.
    executer.app.cancel_download();

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(executer.terminal.backend_mut(), LeaveAlternateScreen)?;
    executer.terminal.show_cursor()?;

    sos.cancel();
    result
}

impl UIExecuter {
    pub fn new(
        app: App,
        terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
        log_buffer: LogBuffer,
        download_dir: PathBuf,
    ) -> Self {
        let slot = app.coordinator.watch_slot();
        Self {
            app,
            terminal,
            context: UIContext::new(),
            slot,
            download_dir,
            download_panel: DownloadPanel::new(),
            logs_panel: LogsPanel::new(log_buffer),
        }
    }

    fn call_focus_change(&mut self, mode: Mode, focused: bool) {
        let component: &mut dyn Component = match mode {
            Mode::Download => &mut self.download_panel,
            Mode::Logs => &mut self.logs_panel,
        };
        if focused {
            component.on_focus(&mut self.app);
        } else {
            component.on_blur(&mut self.app);
        }
    }

    fn handle_panel_key(&mut self, mode: Mode, key: KeyCode) -> Option<Action> {
        match mode {
            Mode::Download => self.download_panel.handle_key(&mut self.app, key),
            Mode::Logs => self.logs_panel.handle_key(&mut self.app, key),
        }
    }

    fn render_frame(&mut self) -> std::io::Result<()> {
        let context = self.context.clone();
        let app = &mut self.app;
        let download_panel = &mut self.download_panel;
        let logs_panel = &mut self.logs_panel;
        let active = *self.slot.borrow();
        let download_dir = &self.download_dir;

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(3)])
                .split(f.area());

            let help = match context.current_mode {
                Mode::Download => {
                    download_panel.render_with_app(f, app, chunks[0]);
                    download_panel.help()
                }
                Mode::Logs => {
                    logs_panel.render(f, app, chunks[0]);
                    logs_panel.help()
                }
            };

            if context.active_popup == UIPopup::Result
                && let Some(view) = &app.result_view
            {
                view.render(f, app.theme.accent());
            }

            Self::render_status_bar(f, app, help, active, download_dir, chunks[1]);
        })?;

        Ok(())
    }

    /// Help or toast line, then the transfer line fed by the handle slot.
    fn render_status_bar(
        f: &mut Frame,
        app: &App,
        help: &str,
        active: Option<TransferHandle>,
        download_dir: &std::path::Path,
        area: Rect,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(2)])
            .split(area);

        let help_line = if let Some(notif) = app.notify.current() {
            Paragraph::new(format!(" {} {}", notif.level.icon(), notif.message))
                .style(Style::default().fg(notif.level.color()))
        } else {
            Paragraph::new(format!(" {}", help)).style(Style::default().fg(Color::DarkGray))
        };
        f.render_widget(help_line, chunks[0]);

        let transfer = match (active, app.coordinator.current_request()) {
            (Some(handle), Some(request)) => Span::styled(
                format!(
                    "{} {} ({:.0}%)",
                    handle,
                    truncate_text(&request.display_name, 40),
                    app.button.displayed_progress()
                ),
                Style::default().fg(app.theme.accent()),
            ),
            _ => Span::styled("idle", Style::default().fg(Color::DarkGray)),
        };
        let stats_line = Paragraph::new(Line::from(vec![
            Span::styled(" Transfer: ", Style::default().fg(Color::DarkGray)),
            transfer,
            Span::styled("  |  Saving to: ", Style::default().fg(Color::DarkGray)),
            Span::raw(download_dir.display().to_string()),
        ]))
        .style(Style::default().bg(Color::Black));
        f.render_widget(stats_line, chunks[1]);
    }

    /// Returns when the user quits or the stop signal fires.
    async fn run_event_loop(&mut self, sos: &SignalOfStop) -> anyhow::Result<()> {
        loop {
            if !self.app.tick(Instant::now()) && self.context.active_popup == UIPopup::Result {
                self.context.active_popup = UIPopup::None;
            }

            self.render_frame()?;

            if event::poll(FRAME_INTERVAL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                if self.context.has_popup() {
                    self.handle_popup_key(key.code);
                } else if let Some(action) =
                    self.handle_panel_key(self.context.current_mode, key.code)
                    && self.apply_action(action)
                {
                    return Ok(());
                }
            }

            // Monitor events buffered while we waited on the terminal
            self.app.drain_transfer_events();

            if sos.cancelled() {
                return Ok(());
            }
        }
    }

    /// Returns `true` when the app should quit.
    fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::SwitchMode(new_mode) => {
                let old_mode = self.context.current_mode;
                self.call_focus_change(old_mode, false);
                self.context.switch_mode(new_mode);
                self.app.mode = new_mode;
                self.call_focus_change(new_mode, true);
            }
            Action::StartDownload => {
                self.app.start_download();
            }
            Action::CancelDownload => {
                self.app.cancel_download();
            }
            Action::OpenResult(payload) => {
                self.app.open_result(payload);
                self.context.active_popup = UIPopup::Result;
            }
            Action::CycleTheme => self.app.cycle_theme(),
            Action::Quit => return true,
            Action::None => {}
        }
        false
    }

    /// The result view only reacts to confirm keys once fully open.
    fn handle_popup_key(&mut self, key: KeyCode) {
        if self.context.active_popup == UIPopup::Result
            && matches!(key, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' '))
        {
            self.app.confirm_result_at(Instant::now());
        }
    }
}
