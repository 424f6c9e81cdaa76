use thiserror::Error;

/// Errors reported by a transfer subsystem.
#[derive(Debug, Error)]
pub enum SubsystemError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transfer subsystem unavailable: {0}")]
    Unavailable(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced to the caller of the transfer coordinator.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A transfer is already in flight; the request was ignored.
    #[error("a download is already in progress")]
    Busy,

    /// Start requested without a selected source.
    #[error("no download source selected")]
    NoSelection,

    /// The subsystem refused the request.
    #[error("failed to enqueue download: {0}")]
    Enqueue(#[from] SubsystemError),
}
