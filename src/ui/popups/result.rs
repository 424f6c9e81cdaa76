//! ResultView: the popup opened from a completion alert.
//!
//! Shows which file was downloaded and whether it succeeded. Opening
//! cancels the correlating alert right away; confirming plays the closing
//! transition, after which the caller drops the view.

use crate::core::alerts::NotificationSink;
use crate::core::config::RESULT_TRANSITION;
use crate::core::transfer::NotificationPayload;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultPhase {
    Opening,
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTick {
    Active,
    Dismissed,
}

pub struct ResultView {
    payload: NotificationPayload,
    status_text: String,
    phase: ResultPhase,
    phase_started: Instant,
    /// 0.0 = hidden, 1.0 = fully shown.
    visibility: f32,
}

impl ResultView {
    pub fn open_at(
        payload: NotificationPayload,
        status_text: impl Into<String>,
        sink: &mut impl NotificationSink,
        now: Instant,
    ) -> Self {
        if payload.correlation_id >= 0 {
            sink.cancel(payload.correlation_id);
        }
        debug!(
            event = "result_view_open",
            name = %payload.display_name,
            succeeded = payload.succeeded,
            id = payload.correlation_id,
        );
        Self {
            payload,
            status_text: status_text.into(),
            phase: ResultPhase::Opening,
            phase_started: now,
            visibility: 0.0,
        }
    }

    pub fn payload(&self) -> &NotificationPayload {
        &self.payload
    }

    pub fn is_interactive(&self) -> bool {
        self.phase == ResultPhase::Open
    }

    /// Start the closing transition. Ignored unless the view is open.
    pub fn confirm_at(&mut self, now: Instant) -> bool {
        if self.phase != ResultPhase::Open {
            return false;
        }
        self.phase = ResultPhase::Closing;
        self.phase_started = now;
        true
    }

    pub fn tick_at(&mut self, now: Instant) -> ResultTick {
        let elapsed = now.saturating_duration_since(self.phase_started);
        let fraction = (elapsed.as_secs_f32() / RESULT_TRANSITION.as_secs_f32()).min(1.0);

        match self.phase {
            ResultPhase::Opening => {
                self.visibility = fraction;
                if fraction >= 1.0 {
                    self.phase = ResultPhase::Open;
                    self.phase_started = now;
                }
            }
            ResultPhase::Open => self.visibility = 1.0,
            ResultPhase::Closing => {
                self.visibility = 1.0 - fraction;
                if fraction >= 1.0 {
                    self.phase = ResultPhase::Closed;
                }
            }
            ResultPhase::Closed => {}
        }

        if self.phase == ResultPhase::Closed {
            ResultTick::Dismissed
        } else {
            ResultTick::Active
        }
    }

    fn status_color(&self) -> Color {
        if self.payload.succeeded {
            Color::Green
        } else {
            Color::Red
        }
    }

    pub fn render(&self, f: &mut Frame, accent: Color) {
        let area = popup_area(f.area(), self.visibility);
        if area.height < 3 {
            return;
        }
        f.render_widget(Clear, area);

        let label = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  File name: ", label),
                Span::styled(
                    self.payload.display_name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Status:    ", label),
                Span::styled(
                    self.status_text.clone(),
                    Style::default()
                        .fg(self.status_color())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
        ];
        if self.is_interactive() {
            lines.push(Line::from(Span::styled("  Enter: OK", label)));
        }

        let popup = Paragraph::new(lines).block(
            Block::default()
                .title(" Download details ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent)),
        );
        f.render_widget(popup, area);
    }
}

/// Centered popup whose height grows with `visibility`.
fn popup_area(area: Rect, visibility: f32) -> Rect {
    const FULL_HEIGHT: u16 = 8;
    let height = (f32::from(FULL_HEIGHT) * visibility.clamp(0.0, 1.0)).round() as u16;
    let width = area.width.min(60);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height.min(area.height)),
            Constraint::Fill(1),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
impl ResultView {
    fn phase(&self) -> ResultPhase {
        self.phase
    }

    fn visibility(&self) -> f32 {
        self.visibility
    }
}
