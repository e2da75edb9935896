pub mod commands;
pub mod driver;
pub mod events;
pub mod gate;
pub mod logging;
pub mod monitor;
pub mod scheduler;
pub mod timer;
pub mod tracker;

pub use commands::MonitorCommand;
pub use driver::run_monitor;
pub use events::{EventSender, LogLevel, MonitorEvent};
pub use gate::is_selection_incomplete;
pub use monitor::ClipboardMonitor;
pub use tracker::{BufferTracker, ReadOutcome};
