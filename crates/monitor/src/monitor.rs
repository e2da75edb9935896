use crate::events::{EventSender, MonitorEvent};
use crate::gate::is_selection_incomplete;
use crate::scheduler::Scheduler;
use crate::tracker::BufferTracker;
use crate::{log_debug, log_info};
use anyhow::Result;
use clipwatch_clipboard::{ClipboardReader, ClipboardWriter};
use clipwatch_core::{filter_formats, ClipboardMode, DataMap, MonitorConfig, MIME_OWNER, MIME_WINDOW_TITLE};
use clipwatch_input::PointerStateSource;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DueTimer {
    CheckAgain,
    EmitChange(ClipboardMode),
}

/// Polls the X11 clipboard and primary selection and publishes debounced
/// changes.
///
/// Everything runs on the caller's thread: native owner changes come in
/// through [`ClipboardMonitor::on_owner_changed`] and timers are fired by
/// [`ClipboardMonitor::fire_due_timers`]. `Changed` events are only ever sent
/// from a fired debounce timer.
pub struct ClipboardMonitor {
    reader: Box<dyn ClipboardReader>,
    writer: Box<dyn ClipboardWriter>,
    pointer: Box<dyn PointerStateSource>,
    events: EventSender,
    clipboard: BufferTracker,
    selection: BufferTracker,
    scheduler: Scheduler,
    running: bool,
}

impl ClipboardMonitor {
    pub fn new(
        config: &MonitorConfig,
        reader: Box<dyn ClipboardReader>,
        writer: Box<dyn ClipboardWriter>,
        pointer: Box<dyn PointerStateSource>,
        events: EventSender,
    ) -> Self {
        Self {
            reader,
            writer,
            pointer,
            events,
            clipboard: BufferTracker::new(
                ClipboardMode::Clipboard,
                config.monitor_clipboard,
                config.max_retry_count,
            ),
            selection: BufferTracker::new(
                ClipboardMode::Selection,
                config.monitor_selection,
                config.max_retry_count,
            ),
            scheduler: Scheduler::new(config.min_check_again(), config.max_check_again()),
            running: false,
        }
    }

    pub fn tracker(&self, mode: ClipboardMode) -> &BufferTracker {
        match mode {
            ClipboardMode::Clipboard => &self.clipboard,
            ClipboardMode::Selection => &self.selection,
        }
    }

    fn tracker_mut(&mut self, mode: ClipboardMode) -> &mut BufferTracker {
        match mode {
            ClipboardMode::Clipboard => &mut self.clipboard,
            ClipboardMode::Selection => &mut self.selection,
        }
    }

    pub(crate) fn events(&self) -> &EventSender {
        &self.events
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reads both buffers once and takes the result as published, without
    /// emitting anything.
    pub fn start_monitoring(&mut self, formats: Vec<String>) {
        self.clipboard.set_formats(formats);

        // Asking an app for big data on every mouse selection can make it hang,
        // so the selection is only ever read as plain text.
        self.selection.require_text();

        for mode in ClipboardMode::ALL {
            let tracker = match mode {
                ClipboardMode::Clipboard => &mut self.clipboard,
                ClipboardMode::Selection => &mut self.selection,
            };
            tracker.clear_owners();
            tracker.attempt_read(self.reader.as_ref(), &mut self.scheduler, &self.events);
            tracker.publish(&self.events, true);
        }

        self.running = true;
        log_info!(
            &self.events,
            "Monitoring clipboard formats [{}] and selection formats [{}]",
            self.clipboard.formats().join(", "),
            self.selection.formats().join(", ")
        );
    }

    /// Takes effect on the next read; an armed debounce still fires but
    /// publishes nothing while disabled.
    pub fn set_monitoring_enabled(&mut self, mode: ClipboardMode, enabled: bool) {
        self.tracker_mut(mode).set_enabled(enabled);
    }

    /// Last published data, restricted to `formats` unless empty, with the
    /// owner window title added when the data does not come from us.
    pub fn data(&self, mode: ClipboardMode, formats: &[String]) -> DataMap {
        let published = self.tracker(mode).published();
        let mut data = if formats.is_empty() {
            published.data.clone()
        } else {
            filter_formats(&published.data, formats)
        };
        if !published.data.contains_key(MIME_OWNER) {
            data.insert(MIME_WINDOW_TITLE.to_string(), published.owner.as_bytes().to_vec());
        }
        data
    }

    /// Callers must deliver queued owner notifications first; the driver
    /// does so for `SetData` commands.
    pub fn set_data(&mut self, mode: ClipboardMode, data: &DataMap) -> Result<()> {
        self.writer.set_data(mode, data)
    }

    /// Native "selection owner changed" notification.
    pub fn on_owner_changed(&mut self, mode: ClipboardMode) {
        if !self.running || !self.tracker(mode).is_enabled() {
            return;
        }

        // Take the title right away, it most likely still belongs to the new owner.
        let owner = self.reader.owner_title(mode);
        if self.tracker_mut(mode).note_owner_change(owner.clone()) {
            log_debug!(&self.events, "New {} owner: \"{}\"", mode, owner);
        }

        if mode == ClipboardMode::Selection && self.scheduler.is_active() {
            log_debug!(&self.events, "Postponing fast selection change");
            self.selection.stop_timer();
            return;
        }

        self.check_again_later(true, Duration::ZERO);
    }

    /// Full poll of both buffers, clipboard first.
    pub fn check(&mut self) {
        self.clipboard.stop_timer();
        self.selection.stop_timer();
        self.scheduler.stop();

        let clipboard_changed = self
            .clipboard
            .attempt_read(self.reader.as_ref(), &mut self.scheduler, &self.events)
            .changed();
        let selection_changed = self
            .selection
            .attempt_read(self.reader.as_ref(), &mut self.scheduler, &self.events)
            .changed();

        // A retry is already scheduled.
        if self.scheduler.is_active() {
            return;
        }

        // Check again in case some notifications were not delivered or older
        // data arrived after newer.
        let interval = self.scheduler.next_interval();
        self.check_again_later(clipboard_changed || selection_changed, interval);
    }

    pub fn check_again_later(&mut self, changed: bool, interval: Duration) {
        self.scheduler.check_again_later(changed, interval);

        let describe = |tracker: &BufferTracker| {
            if tracker.has_unpublished_data() {
                "*CHANGED*"
            } else {
                "unchanged"
            }
        };
        let next = match self.scheduler.timer().remaining() {
            Some(_) => format!(" Test clipboard in {}ms.", self.scheduler.timer().interval().as_millis()),
            None => String::new(),
        };
        log_debug!(
            &self.events,
            "Clipboard {}, selection {}.{}",
            describe(&self.clipboard),
            describe(&self.selection),
            next
        );
    }

    /// Debounce handler: publishes the pending data of `mode`.
    ///
    /// A selection is held back while it still looks incomplete.
    pub fn publish(&mut self, mode: ClipboardMode) -> bool {
        let tracker = self.tracker(mode);
        if mode == ClipboardMode::Selection
            && tracker.is_enabled()
            && tracker.is_dirty()
            && is_selection_incomplete(self.pointer.as_ref())
        {
            log_debug!(&self.events, "Selection is incomplete");
            self.selection.stop_timer();
            self.scheduler.check_within(self.scheduler.min_interval());
            return false;
        }

        let tracker = match mode {
            ClipboardMode::Clipboard => &mut self.clipboard,
            ClipboardMode::Selection => &mut self.selection,
        };
        tracker.publish(&self.events, false)
    }

    /// Earliest armed timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.scheduler.timer().deadline(),
            self.clipboard.timer().deadline(),
            self.selection.timer().deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Time until the next full check, if one is scheduled.
    pub fn next_check_in(&self) -> Option<Duration> {
        self.scheduler.timer().remaining()
    }

    /// Fires every timer that is due, earliest first. On equal deadlines the
    /// check runs before clipboard, clipboard before selection.
    ///
    /// Each timer fires at most once per call; one re-armed with a zero
    /// interval is picked up by the next call.
    pub fn fire_due_timers(&mut self) {
        if !self.running {
            return;
        }

        let now = Instant::now();
        let mut fired = Vec::with_capacity(3);
        while let Some(due) = self.next_due(now, &fired) {
            fired.push(due);
            match due {
                DueTimer::CheckAgain => self.check(),
                DueTimer::EmitChange(mode) => {
                    self.tracker_mut(mode).stop_timer();
                    self.publish(mode);
                }
            }
        }
    }

    fn next_due(&self, now: Instant, fired: &[DueTimer]) -> Option<DueTimer> {
        [
            (self.scheduler.timer(), DueTimer::CheckAgain),
            (self.clipboard.timer(), DueTimer::EmitChange(ClipboardMode::Clipboard)),
            (self.selection.timer(), DueTimer::EmitChange(ClipboardMode::Selection)),
        ]
        .into_iter()
        .filter(|(timer, due)| timer.is_due(now) && !fired.contains(due))
        .min_by_key(|(timer, _)| timer.deadline())
        .map(|(_, due)| due)
    }

    /// Stops all timers. No reads happen afterwards.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.scheduler.stop();
        self.clipboard.stop_timer();
        self.selection.stop_timer();
        log_info!(&self.events, "Monitoring stopped");
        let _ = self.events.send(MonitorEvent::Stopped);
    }
}
