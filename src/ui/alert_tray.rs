//! AlertTray: the terminal presentation of completion alerts.
//!
//! Alerts stay listed until the user opens them (or another post with the
//! same id replaces them). The tray never expires entries on its own.

use crate::core::alerts::{Alert, AlertAction, AlertChannel, NotificationSink};
use crate::core::transfer::NotificationPayload;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrayEntry {
    pub id: i64,
    pub alert: Alert,
    pub posted_at: chrono::DateTime<chrono::Local>,
}

impl TrayEntry {
    fn succeeded(&self) -> bool {
        match &self.alert.action {
            AlertAction::OpenResult(payload) => payload.succeeded,
        }
    }
}

#[derive(Default)]
pub struct AlertTray {
    channel: Option<AlertChannel>,
    entries: Vec<TrayEntry>,
    list_state: ListState,
}

impl AlertTray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self) -> Option<&AlertChannel> {
        self.channel.as_ref()
    }

    pub fn entries(&self) -> &[TrayEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn select_prev(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(prev));
    }

    /// Payload of the highlighted alert. The entry itself is removed by the
    /// result view cancelling it.
    pub fn activate_selected(&self) -> Option<NotificationPayload> {
        let entry = self.entries.get(self.list_state.selected()?)?;
        match &entry.alert.action {
            AlertAction::OpenResult(payload) => Some(payload.clone()),
        }
    }

    fn clamp_selection(&mut self) {
        let selected = match (self.entries.len(), self.list_state.selected()) {
            (0, _) => None,
            (len, Some(i)) => Some(i.min(len - 1)),
            (_, None) => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, accent: Color) {
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let color = if entry.succeeded() {
                    Color::Green
                } else {
                    Color::Red
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!(" {} ", entry.posted_at.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("{} ", entry.alert.title),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(entry.alert.text.clone(), Style::default().fg(color)),
                    Span::styled(
                        format!("  [{}]", entry.alert.action_label),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let title = match &self.channel {
            Some(channel) => format!(" {} ({}) ", channel.name, self.entries.len()),
            None => " Alerts ".to_string(),
        };
        let border = if focused { accent } else { Color::DarkGray };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Indexed(236))
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(if focused { "> " } else { "  " });

        f.render_stateful_widget(list, area, &mut self.list_state);
    }
}

impl NotificationSink for AlertTray {
    fn register_channel(&mut self, channel: &AlertChannel) {
        self.channel = Some(channel.clone());
    }

    fn post(&mut self, id: i64, alert: Alert) {
        let entry = TrayEntry {
            id,
            alert,
            posted_at: chrono::Local::now(),
        };
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => self.entries.insert(0, entry),
        }
        self.clamp_selection();
    }

    fn cancel(&mut self, id: i64) {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() != before {
            debug!(event = "alert_dismissed", id);
        }
        self.clamp_selection();
    }
}
