use crate::traits::ClipboardWriter;
use anyhow::{anyhow, bail, Result};
use arboard::{Clipboard, ImageData, LinuxClipboardKind, SetExtLinux};
use clipwatch_core::{ClipboardMode, DataMap, MIME_HTML, MIME_PNG, MIME_TEXT};
use std::borrow::Cow;
use std::sync::Mutex;

/// Writes buffers through arboard.
///
/// The arboard handle is kept for the lifetime of the store so the data stays
/// served after `set_data` returns.
pub struct ArboardStore {
    clipboard: Mutex<Clipboard>,
}

impl ArboardStore {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().map_err(|e| anyhow!("Failed to init clipboard: {}", e))?;
        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }
}

fn linux_kind(mode: ClipboardMode) -> LinuxClipboardKind {
    match mode {
        ClipboardMode::Clipboard => LinuxClipboardKind::Clipboard,
        ClipboardMode::Selection => LinuxClipboardKind::Primary,
    }
}

impl ClipboardWriter for ArboardStore {
    fn set_data(&self, mode: ClipboardMode, data: &DataMap) -> Result<()> {
        let mut clipboard = self
            .clipboard
            .lock()
            .map_err(|_| anyhow!("Clipboard handle poisoned"))?;
        let kind = linux_kind(mode);
        let text = data
            .get(MIME_TEXT)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

        if let Some(png_data) = data.get(MIME_PNG) {
            let img = image::load_from_memory(png_data)?.to_rgba8();
            let width = img.width() as usize;
            let height = img.height() as usize;
            let image_data = ImageData {
                width,
                height,
                bytes: Cow::from(img.into_raw()),
            };
            clipboard
                .set()
                .clipboard(kind)
                .image(image_data)
                .map_err(|e| anyhow!("Set image failed: {}", e))
        } else if let Some(html) = data.get(MIME_HTML) {
            let html = String::from_utf8_lossy(html).into_owned();
            clipboard
                .set()
                .clipboard(kind)
                .html(html, text)
                .map_err(|e| anyhow!("Set html failed: {}", e))
        } else if let Some(text) = text {
            clipboard
                .set()
                .clipboard(kind)
                .text(text)
                .map_err(|e| anyhow!("Set text failed: {}", e))
        } else {
            bail!("No supported format to write to the {}", mode)
        }
    }
}
