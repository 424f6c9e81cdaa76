//! Centralized configuration constants for fetchdrop.
//!
//! All tunable timings live here so they can be reviewed and adjusted in a
//! single place. User-facing labels and sources are runtime settings and
//! live in `workers::settings`.

use std::time::Duration;

// ── Transfer Monitor ─────────────────────────────────────────────────────────

/// Interval between two status queries against the transfer subsystem.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Consecutive failed status queries after which the monitor gives up and
/// reports the transfer as failed.
pub const MAX_CONSECUTIVE_QUERY_ERRORS: u32 = 5;

// ── Progress Button Animation ────────────────────────────────────────────────

/// Delay before a new progress target starts animating. Targets arriving
/// inside the window replace the pending one.
pub const PROGRESS_DEBOUNCE: Duration = Duration::from_millis(100);

/// Duration of an intermediate progress animation.
pub const PROGRESS_ANIMATION: Duration = Duration::from_millis(500);

/// Duration of the animation towards 100%. Must stay shorter than
/// `PROGRESS_ANIMATION`.
pub const PROGRESS_FINISH_ANIMATION: Duration = Duration::from_millis(200);

// ── Result View ──────────────────────────────────────────────────────────────

/// Duration of the result view opening and closing transitions.
pub const RESULT_TRANSITION: Duration = Duration::from_millis(300);

// ── Alerts ───────────────────────────────────────────────────────────────────

pub const ALERT_CHANNEL_ID: &str = "downloadNotificationId";
pub const ALERT_CHANNEL_NAME: &str = "Downloads";
pub const ALERT_CHANNEL_DESCRIPTION: &str = "Downloads notification channel";

// ── HTTP Download Manager ────────────────────────────────────────────────────

/// Write buffer flushed to disk once it grows past this size (256 KB).
pub const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Timeout for establishing the HTTP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

// ── UI / Misc ────────────────────────────────────────────────────────────────

/// Timeout of one crossterm event poll; doubles as the frame interval.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Maximum log entries kept in the in-memory ring buffer.
pub const MAX_LOG_ENTRIES: usize = 500;
