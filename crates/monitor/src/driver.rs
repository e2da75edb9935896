use crate::commands::MonitorCommand;
use crate::log_error;
use crate::monitor::ClipboardMonitor;
use clipwatch_core::ClipboardMode;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver};
use tokio::time::Instant;

/// Drives a started monitor until `Stop` is received or every command sender
/// is gone.
///
/// Owner notifications, timers and commands are all handled on the calling
/// task, one at a time.
pub async fn run_monitor(
    mut monitor: ClipboardMonitor,
    mut owner_rx: UnboundedReceiver<ClipboardMode>,
    mut cmd_rx: Receiver<MonitorCommand>,
) {
    loop {
        let deadline = monitor.next_deadline();

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(MonitorCommand::SetEnabled(mode, enabled)) => {
                    monitor.set_monitoring_enabled(mode, enabled);
                }
                Some(MonitorCommand::SetData(mode, data)) => {
                    // Handle ownership changes that are already queued so the
                    // write does not race an in-flight selection request.
                    flush_owner_changes(&mut monitor, &mut owner_rx);
                    if let Err(e) = monitor.set_data(mode, &data) {
                        log_error!(monitor.events(), "Failed to set {} data: {}", mode, e);
                    }
                }
                Some(MonitorCommand::Data { mode, formats, reply }) => {
                    let _ = reply.send(monitor.data(mode, &formats));
                }
                Some(MonitorCommand::Stop) | None => break,
            },

            Some(mode) = owner_rx.recv() => monitor.on_owner_changed(mode),

            _ = sleep_until(deadline) => monitor.fire_due_timers(),
        }
    }

    monitor.stop();
}

fn flush_owner_changes(monitor: &mut ClipboardMonitor, owner_rx: &mut UnboundedReceiver<ClipboardMode>) {
    while let Ok(mode) = owner_rx.try_recv() {
        monitor.on_owner_changed(mode);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
