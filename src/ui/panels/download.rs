use crate::ui::helpers::{BANNER_HEIGHT, render_banner, truncate_text};
use crate::ui::traits::{Action, Component, Handler};
use crate::workers::app::{App, Mode};
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

const BUTTON_WIDTH: u16 = 36;
const BUTTON_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sources,
    Alerts,
}

/// Main window: source picker, the progress button and the alert tray.
pub struct DownloadPanel {
    focus: Focus,
    list_state: ListState,
}

impl Default for DownloadPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadPanel {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            focus: Focus::Sources,
            list_state,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn help(&self) -> &'static str {
        match self.focus {
            Focus::Sources => {
                "Up/Down: navigate | Space: choose | Enter: download | x: cancel | Tab: alerts | l: logs | t: theme | q: quit"
            }
            Focus::Alerts => "Up/Down: navigate | Enter: open alert | Tab: sources | q: quit",
        }
    }

    /// Render needs the alert tray's list state, so it takes `&mut App`.
    pub fn render_with_app(&mut self, f: &mut Frame, app: &mut App, area: Rect) {
        let sources_height = app.sources().len() as u16 + 2;
        let banner_height = if area.height >= BANNER_HEIGHT + sources_height + BUTTON_HEIGHT + 6 {
            BANNER_HEIGHT
        } else {
            2
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(banner_height),
                Constraint::Length(sources_height),
                Constraint::Length(1),
                Constraint::Length(BUTTON_HEIGHT),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        let accent = app.theme.accent();
        render_banner(f, chunks[0], accent);
        self.render(f, app, chunks[1]);

        let button_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(BUTTON_WIDTH.min(chunks[3].width)),
                Constraint::Fill(1),
            ])
            .split(chunks[3])[1];
        f.render_widget(&app.button, button_area);

        let tray = app.coordinator.alerts_mut().sink_mut();
        tray.render(f, chunks[5], self.focus == Focus::Alerts, accent);
    }
}

impl Component for DownloadPanel {
    /// Source picker with radio marks.
    fn render(&mut self, f: &mut Frame, app: &App, area: Rect) {
        let max_name = area.width.saturating_sub(10) as usize;
        let items: Vec<ListItem> = app
            .sources()
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let chosen = app.selected_source == Some(i);
                let mark = if chosen { "(•) " } else { "( ) " };
                let mark_style = if chosen {
                    Style::default().fg(app.theme.accent())
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, mark_style),
                    Span::raw(truncate_text(&source.name, max_name)),
                ]))
            })
            .collect();

        let focused = self.focus == Focus::Sources;
        let border = if focused {
            app.theme.accent()
        } else {
            Color::DarkGray
        };
        self.list_state.select(Some(app.source_cursor));
        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Sources ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Indexed(236))
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if focused { "  > " } else { "    " });

        f.render_stateful_widget(list, area, &mut self.list_state);
    }
}

impl Handler for DownloadPanel {
    fn handle_key(&mut self, app: &mut App, key: KeyCode) -> Option<Action> {
        match key {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Sources => Focus::Alerts,
                    Focus::Alerts => Focus::Sources,
                };
                Some(Action::None)
            }
            KeyCode::Char('x') => Some(Action::CancelDownload),
            KeyCode::Char('t') => Some(Action::CycleTheme),
            KeyCode::Char('l') => Some(Action::SwitchMode(Mode::Logs)),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => match self.focus {
                Focus::Sources => Self::handle_sources_key(app, key),
                Focus::Alerts => Self::handle_alerts_key(app, key),
            },
        }
    }
}

impl DownloadPanel {
    fn handle_sources_key(app: &mut App, key: KeyCode) -> Option<Action> {
        let count = app.sources().len();
        if count == 0 {
            return Some(Action::None);
        }
        match key {
            KeyCode::Up => {
                app.source_cursor = if app.source_cursor == 0 {
                    count - 1
                } else {
                    app.source_cursor - 1
                };
                Some(Action::None)
            }
            KeyCode::Down => {
                app.source_cursor = (app.source_cursor + 1) % count;
                Some(Action::None)
            }
            KeyCode::Char(' ') => {
                app.select_source(app.source_cursor);
                Some(Action::None)
            }
            KeyCode::Enter => Some(Action::StartDownload),
            _ => Some(Action::None),
        }
    }

    fn handle_alerts_key(app: &mut App, key: KeyCode) -> Option<Action> {
        let tray = app.coordinator.alerts_mut().sink_mut();
        match key {
            KeyCode::Up => {
                tray.select_prev();
                Some(Action::None)
            }
            KeyCode::Down => {
                tray.select_next();
                Some(Action::None)
            }
            KeyCode::Enter => Some(
                tray.activate_selected()
                    .map(Action::OpenResult)
                    .unwrap_or(Action::None),
            ),
            _ => Some(Action::None),
        }
    }
}
