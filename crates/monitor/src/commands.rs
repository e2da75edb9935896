use clipwatch_core::{ClipboardMode, DataMap};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum MonitorCommand {
    SetEnabled(ClipboardMode, bool),
    /// Write to a buffer once queued owner notifications are handled.
    SetData(ClipboardMode, DataMap),
    /// Ask for the last published data.
    Data {
        mode: ClipboardMode,
        formats: Vec<String>,
        reply: oneshot::Sender<DataMap>,
    },
    Stop,
}
