use clipwatch_core::ClipboardMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum MonitorEvent {
    Log { level: LogLevel, message: String },
    /// New data was published for the buffer.
    Changed(ClipboardMode),
    Stopped,
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<MonitorEvent>;
