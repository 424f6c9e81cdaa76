//! Transfer data model shared by the monitor, the coordinator and the UI.

use std::fmt;

/// Correlation id meaning "no alert is attached".
pub const NO_CORRELATION: i64 = -1;

/// What the user asked to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub url: String,
    pub display_name: String,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
        }
    }
}

/// Opaque id handed out by the transfer subsystem on enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferHandle(pub u64);

impl TransferHandle {
    /// Alert correlation id derived from this handle.
    pub fn correlation_id(self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for TransferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Percent complete of a running transfer, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProgressSample(u8);

impl ProgressSample {
    /// Builds a sample from a possibly out-of-range percentage.
    #[cfg(test)]
    pub fn clamped(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    /// `floor(done * 100 / total)`, or `None` when the total is unknown.
    pub fn from_bytes(done: u64, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let percent = (u128::from(done) * 100 / u128::from(total)).min(100);
        Some(Self(percent as u8))
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

/// Lifecycle events produced by one monitor run. The terminal event is
/// always the last one delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    Progressed(ProgressSample),
    Succeeded,
    Failed,
}

impl MonitorEvent {
    pub fn is_terminal(self) -> bool {
        matches!(self, MonitorEvent::Succeeded | MonitorEvent::Failed)
    }
}

/// Everything the result view needs, carried by an alert action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub display_name: String,
    pub succeeded: bool,
    /// Alert to cancel when the result view opens; `NO_CORRELATION` if none.
    pub correlation_id: i64,
}
