//! Toasts for the TUI status bar.
//!
//! Short, level-aware messages with auto-expiry. Transfer outcomes are not
//! toasts; they go to the alert tray. Toasts cover immediate feedback to a
//! key press (busy, nothing selected, enqueue refused).
//!
//! - Toasts auto-expire based on severity (info: 5s, error: 10s).
//! - Only one toast is active at a time (newest wins).
//! - If no toast is active, the status bar falls back to help text.

use crate::core::error::TransferError;
use crate::workers::settings::Labels;
use ratatui::style::Color;
use std::time::{Duration, Instant};

// ── Notification Level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotifyLevel {
    pub fn color(self) -> Color {
        match self {
            NotifyLevel::Info => Color::Cyan,
            NotifyLevel::Success => Color::Green,
            NotifyLevel::Warning => Color::Yellow,
            NotifyLevel::Error => Color::Red,
        }
    }

    fn ttl(self) -> Duration {
        match self {
            NotifyLevel::Info | NotifyLevel::Success => Duration::from_secs(5),
            NotifyLevel::Warning => Duration::from_secs(8),
            NotifyLevel::Error => Duration::from_secs(10),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            NotifyLevel::Info => "(i)",
            NotifyLevel::Success => "(+)",
            NotifyLevel::Warning => "(x)",
            NotifyLevel::Error => "(!)",
        }
    }
}

// ── Notification ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
    expires_at: Instant,
}

impl Notification {
    fn new(level: NotifyLevel, message: impl Into<String>, now: Instant) -> Self {
        Self {
            level,
            message: message.into(),
            expires_at: now + level.ttl(),
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// ── Notify Manager ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct NotifyManager {
    current: Option<Notification>,
}

impl NotifyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_at(&mut self, level: NotifyLevel, message: impl Into<String>, now: Instant) {
        self.current = Some(Notification::new(level, message, now));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push_at(NotifyLevel::Info, message, Instant::now());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push_at(NotifyLevel::Success, message, Instant::now());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push_at(NotifyLevel::Warning, message, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(NotifyLevel::Error, message, Instant::now());
    }

    /// Toast for a rejected start, worded with the configured labels.
    pub fn transfer_error(&mut self, err: &TransferError, labels: &Labels) {
        match err {
            TransferError::Busy => self.warn(labels.busy.as_str()),
            TransferError::NoSelection => self.info(labels.no_selection.as_str()),
            TransferError::Enqueue(e) => self.error(e.to_string()),
        }
    }

    pub fn current_at(&self, now: Instant) -> Option<&Notification> {
        self.current.as_ref().filter(|n| !n.is_expired_at(now))
    }

    /// Returns the active toast, or `None` if expired / absent.
    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Instant::now())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
