mod core;
mod ui;
mod utils;
mod workers;

use crate::utils::log_buffer::{BufferLayer, FileLogLayer, LogBuffer};
use crate::utils::sos::SignalOfStop;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use workers::args::Args;
use workers::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::load();
    let settings = Settings::load(&args.config_path())?;

    // Must happen before the log file path is resolved
    let data_dir = crate::utils::data_dir::init(args.data_dir.as_deref());

    let filter = match args.verbose {
        0 => "warn,fetchdrop=info",
        1 => "info",
        2 => "debug,hyper_util=info",
        _ => "trace",
    };

    let log_buffer = LogBuffer::new();

    let filter_layer = EnvFilter::new(filter);
    let buffer_layer = BufferLayer::new(log_buffer.clone());

    let log_path = data_dir.join("logs").join("fetchdrop.log");
    let file_layer = FileLogLayer::new(&log_path)?;

    // No fmt layer: writing to stderr would corrupt the TUI. The Logs view
    // shows the buffer, the file keeps the full history.
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(buffer_layer)
        .with(file_layer)
        .init();

    let sos = SignalOfStop::new();

    // Ctrl+C handler
    let sos_clone = sos.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        sos_clone.cancel();
    });

    ui::run(args, settings, sos, log_buffer).await
}
