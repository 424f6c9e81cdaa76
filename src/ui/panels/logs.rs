use crate::ui::traits::{Action, Component, Handler};
use crate::utils::log_buffer::{LogBuffer, LogEntry};
use crate::workers::app::{App, Mode};
use crossterm::event::KeyCode;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use tracing::Level;

/// Scrollable view of the in-memory tracing buffer.
pub struct LogsPanel {
    buffer: LogBuffer,
}

impl LogsPanel {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }

    pub fn help(&self) -> &'static str {
        "Up/Down: scroll | PgUp/PgDn: page | d: clear | Esc: back"
    }
}

fn level_style(level: Level) -> (&'static str, Color) {
    match level {
        Level::ERROR => ("ERROR", Color::Red),
        Level::WARN => (" WARN", Color::Yellow),
        Level::INFO => (" INFO", Color::Green),
        Level::DEBUG => ("DEBUG", Color::DarkGray),
        Level::TRACE => ("TRACE", Color::Indexed(240)),
    }
}

fn entry_line(entry: &LogEntry) -> ListItem<'_> {
    let (label, color) = level_style(entry.level);
    ListItem::new(Line::from(vec![
        Span::styled(
            format!(" {} ", entry.timestamp),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{} ", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(entry.message.as_str()),
    ]))
}

impl Component for LogsPanel {
    fn render(&mut self, f: &mut Frame, app: &App, area: Rect) {
        let entries = self.buffer.entries();
        let total = entries.len();

        let visible_height = area.height.saturating_sub(2) as usize; // subtract borders
        let max_scroll = total.saturating_sub(visible_height);
        let scroll = app.log_scroll.min(max_scroll);

        let items: Vec<ListItem> = entries
            .iter()
            .skip(scroll)
            .take(visible_height)
            .map(entry_line)
            .collect();

        let log_list = List::new(items).block(
            Block::default()
                .title(format!(" Logs ({}) ", total))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(log_list, area);
    }

    fn on_blur(&mut self, app: &mut App) {
        app.log_scroll = 0;
    }
}

impl Handler for LogsPanel {
    fn handle_key(&mut self, app: &mut App, key: KeyCode) -> Option<Action> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::SwitchMode(Mode::Download)),
            KeyCode::Up | KeyCode::Char('k') => {
                app.log_scroll = app.log_scroll.saturating_sub(1);
                Some(Action::None)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.log_scroll = app.log_scroll.saturating_add(1);
                Some(Action::None)
            }
            KeyCode::PageUp => {
                app.log_scroll = app.log_scroll.saturating_sub(10);
                Some(Action::None)
            }
            KeyCode::PageDown => {
                app.log_scroll = app.log_scroll.saturating_add(10);
                Some(Action::None)
            }
            KeyCode::Home => {
                app.log_scroll = 0;
                Some(Action::None)
            }
            KeyCode::Char('d') => {
                self.buffer.clear();
                app.log_scroll = 0;
                Some(Action::None)
            }
            _ => Some(Action::None),
        }
    }
}
