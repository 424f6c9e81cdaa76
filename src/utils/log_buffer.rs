//! Tracing layers: an in-memory ring buffer for the Logs view and an
//! append-only log file.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::core::config::MAX_LOG_ENTRIES as MAX_ENTRIES;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: LogEntry) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= MAX_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

/// Flattens an event into `message, key = value, ...`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if name == "message" {
            if self.message.is_empty() {
                let _ = self.message.write_fmt(value);
            } else {
                self.message = format!("{}, {}", value, self.message);
            }
            return;
        }
        if !self.message.is_empty() {
            self.message.push_str(", ");
        }
        let _ = write!(self.message, "{} = {}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push_field(field.name(), format_args!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push_field(field.name(), format_args!("{}", value));
    }
}

fn render_event(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);

    let target = event.metadata().target();
    if visitor.message.is_empty() {
        target.to_string()
    } else {
        format!("{}: {}", target, visitor.message)
    }
}

pub struct BufferLayer {
    buffer: LogBuffer,
}

impl BufferLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.buffer.push(LogEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            level: *event.metadata().level(),
            message: render_event(event),
        });
    }
}

// ── File Logging Layer ──────────────────────────────────────────────────────

/// Appends every event to a file with a full ISO 8601 timestamp.
pub struct FileLogLayer {
    writer: Arc<Mutex<File>>,
}

impl FileLogLayer {
    /// Creates parent directories if they don't exist.
    pub fn new(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(file)),
        })
    }
}

impl<S: Subscriber> Layer<S> for FileLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        let log_line = format!(
            "[{}] {} {}\n",
            timestamp,
            event.metadata().level(),
            render_event(event)
        );

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(log_line.as_bytes());
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn buffer_keeps_newest_entries() {
        let buffer = LogBuffer::new();
        for i in 0..MAX_ENTRIES + 3 {
            buffer.push(LogEntry {
                timestamp: String::new(),
                level: Level::INFO,
                message: i.to_string(),
            });
        }

        let entries = buffer.entries();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].message, "3");
        buffer.clear();
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn structured_fields_are_flattened() {
        let buffer = LogBuffer::new();
        let subscriber = tracing_subscriber::registry().with(BufferLayer::new(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(event = "start_rejected", active = 3, "Busy");
        });

        let entries = buffer.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::WARN);
        assert!(entries[0].message.contains("Busy"));
        assert!(entries[0].message.contains("event = start_rejected"));
        assert!(entries[0].message.contains("active = 3"));
    }

    #[test]
    fn file_layer_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("fetchdrop.log");
        let subscriber = tracing_subscriber::registry().with(FileLogLayer::new(&path).unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(event = "transfer_started", "first");
            tracing::info!("second");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].ends_with("first, event = transfer_started"));
    }
}
