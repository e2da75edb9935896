use crate::error::ReadError;
use anyhow::Result;
use clipwatch_core::{ClipboardMode, DataMap, RawSnapshot};

pub trait ClipboardReader {
    /// Synchronously reads `formats` (plus `TIMESTAMP`) from the buffer.
    /// Implementations must bound the time spent waiting on the owner.
    fn read_buffer(&self, mode: ClipboardMode, formats: &[String]) -> Result<RawSnapshot, ReadError>;

    /// Title of the window currently owning the buffer, empty if unknown.
    fn owner_title(&self, mode: ClipboardMode) -> String;
}

pub trait ClipboardWriter {
    fn set_data(&self, mode: ClipboardMode, data: &DataMap) -> Result<()>;
}

pub trait OwnerChangeListener {
    // Callback is invoked from the listener thread whenever a buffer gets a new owner
    fn start_listener(&self, callback: Box<dyn Fn(ClipboardMode) + Send + Sync>) -> Result<()>;
}
