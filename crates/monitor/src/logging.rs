use crate::events::{EventSender, LogLevel, MonitorEvent};
use std::fmt;

/// Writes `args` to tracing and mirrors it to the consumer as a
/// [`MonitorEvent::Log`].
pub fn emit_log(tx: &EventSender, level: LogLevel, args: fmt::Arguments<'_>) {
    let message = args.to_string();
    match level {
        LogLevel::Trace => tracing::trace!(target: "clipwatch", "{}", message),
        LogLevel::Debug => tracing::debug!(target: "clipwatch", "{}", message),
        LogLevel::Info => tracing::info!(target: "clipwatch", "{}", message),
        LogLevel::Warn => tracing::warn!(target: "clipwatch", "{}", message),
        LogLevel::Error => tracing::error!(target: "clipwatch", "{}", message),
    }

    // Consumers may already be gone during teardown.
    let _ = tx.send(MonitorEvent::Log { level, message });
}

#[doc(hidden)]
#[macro_export]
macro_rules! monitor_log {
    ($tx:expr, $level:ident, $($arg:tt)*) => {
        $crate::logging::emit_log($tx, $crate::events::LogLevel::$level, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($tx:expr, $($arg:tt)*) => { $crate::monitor_log!($tx, Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($tx:expr, $($arg:tt)*) => { $crate::monitor_log!($tx, Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($tx:expr, $($arg:tt)*) => { $crate::monitor_log!($tx, Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($tx:expr, $($arg:tt)*) => { $crate::monitor_log!($tx, Error, $($arg)*) };
}
