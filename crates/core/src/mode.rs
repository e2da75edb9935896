use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two X11 buffers something concerns.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardMode {
    /// The `CLIPBOARD` selection (Ctrl+C / Ctrl+V).
    Clipboard,
    /// The `PRIMARY` selection (mouse selection, middle-click paste).
    Selection,
}

impl ClipboardMode {
    pub const ALL: [ClipboardMode; 2] = [ClipboardMode::Clipboard, ClipboardMode::Selection];

    pub fn name(self) -> &'static str {
        match self {
            ClipboardMode::Clipboard => "clipboard",
            ClipboardMode::Selection => "selection",
        }
    }
}

impl fmt::Display for ClipboardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
