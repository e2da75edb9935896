/// Plain text, the only format the selection buffer is ever asked for.
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_HTML: &str = "text/html";
pub const MIME_PNG: &str = "image/png";

/// Pseudo-format carrying the owner's acquisition timestamp.
pub const TIMESTAMP_FORMAT: &str = "TIMESTAMP";

/// Present in data written by this application.
pub const MIME_OWNER: &str = "application/x-clipwatch-owner";
/// Title of the window owning the buffer when the data was published.
pub const MIME_WINDOW_TITLE: &str = "application/x-clipwatch-owner-window-title";
