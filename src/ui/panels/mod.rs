pub mod download;
pub mod logs;

pub use download::DownloadPanel;
pub use logs::LogsPanel;
