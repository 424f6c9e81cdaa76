//! Boundary to the component that actually performs downloads.
//!
//! The monitor and the coordinator only ever talk to this trait. The
//! production implementation is `HttpDownloadManager`; tests script their
//! own status sequences.

use crate::core::error::SubsystemError;
use crate::core::transfer::TransferHandle;

/// Raw status reported for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    Running,
    Paused,
    Successful,
    Failed,
    Unknown,
}

/// One status query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSample {
    pub status: TransferStatus,
    pub total_bytes: Option<u64>,
    pub downloaded_bytes: Option<u64>,
}

impl StatusSample {
    pub fn running(downloaded: u64, total: u64) -> Self {
        Self {
            status: TransferStatus::Running,
            total_bytes: Some(total),
            downloaded_bytes: Some(downloaded),
        }
    }

    pub fn of(status: TransferStatus) -> Self {
        Self {
            status,
            total_bytes: None,
            downloaded_bytes: None,
        }
    }
}

/// Pass-through request configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOptions {
    pub title: String,
    pub description: String,
    pub allow_metered: bool,
    pub allow_roaming: bool,
    pub requires_charging: bool,
}

impl EnqueueOptions {
    /// Options used for every user-initiated download.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            allow_metered: true,
            allow_roaming: true,
            requires_charging: false,
        }
    }
}

/// A download manager that runs transfers on its own and answers status
/// queries about them.
pub trait TransferSubsystem: Send + Sync + 'static {
    /// Queue a download and return its handle.
    fn enqueue(&self, url: &str, options: &EnqueueOptions)
    -> Result<TransferHandle, SubsystemError>;

    /// Current status of a previously enqueued download.
    fn query_status(&self, handle: TransferHandle) -> Result<StatusSample, SubsystemError>;

    /// Abort the download (if still running) and forget about it.
    fn remove(&self, handle: TransferHandle);
}
