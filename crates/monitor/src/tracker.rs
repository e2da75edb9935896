use crate::events::{EventSender, MonitorEvent};
use crate::scheduler::Scheduler;
use crate::timer::Timer;
use crate::{log_debug, log_warn};
use clipwatch_clipboard::ClipboardReader;
use clipwatch_core::{ClipboardMode, ClipboardSnapshot, MIME_TEXT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    NoChange,
    /// A change was already waiting to be published.
    ChangePending,
    ChangeDetected,
}

impl ReadOutcome {
    pub fn changed(self) -> bool {
        self != ReadOutcome::NoChange
    }
}

/// Published and pending state of one X11 buffer.
#[derive(Debug)]
pub struct BufferTracker {
    mode: ClipboardMode,
    enabled: bool,
    formats: Vec<String>,
    published: ClipboardSnapshot,
    pending: ClipboardSnapshot,
    dirty: bool,
    retry: u32,
    max_retry: u32,
    last_timestamp: Option<Vec<u8>>,
    timer_emit_change: Timer,
}

impl BufferTracker {
    pub fn new(mode: ClipboardMode, enabled: bool, max_retry: u32) -> Self {
        Self {
            mode,
            enabled,
            formats: Vec::new(),
            published: ClipboardSnapshot::default(),
            pending: ClipboardSnapshot::default(),
            dirty: false,
            retry: 0,
            max_retry,
            last_timestamp: None,
            timer_emit_change: Timer::default(),
        }
    }

    pub fn mode(&self) -> ClipboardMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn set_formats(&mut self, formats: Vec<String>) {
        self.formats = formats;
    }

    /// Selection only ever grows towards plain text.
    pub fn require_text(&mut self) {
        if !self.formats.iter().any(|format| format == MIME_TEXT) {
            self.formats.push(MIME_TEXT.to_string());
        }
    }

    pub fn published(&self) -> &ClipboardSnapshot {
        &self.published
    }

    pub fn pending(&self) -> &ClipboardSnapshot {
        &self.pending
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn retry_count(&self) -> u32 {
        self.retry
    }

    pub fn has_unpublished_data(&self) -> bool {
        !self.pending.same_data(&self.published, &self.formats)
    }

    pub(crate) fn timer(&self) -> &Timer {
        &self.timer_emit_change
    }

    pub(crate) fn stop_timer(&mut self) {
        self.timer_emit_change.stop();
    }

    pub(crate) fn clear_owners(&mut self) {
        self.published.owner.clear();
        self.pending.owner.clear();
    }

    /// Records the owner reported right after an owner change.
    /// Returns true if it differs from the pending one.
    pub(crate) fn note_owner_change(&mut self, owner: String) -> bool {
        self.dirty = true;
        self.retry = 0;
        if owner == self.pending.owner {
            return false;
        }
        self.pending.owner = owner;
        true
    }

    pub(crate) fn attempt_read(
        &mut self,
        reader: &dyn ClipboardReader,
        scheduler: &mut Scheduler,
        events: &EventSender,
    ) -> ReadOutcome {
        if !self.enabled {
            return ReadOutcome::NoChange;
        }

        let raw = match reader.read_buffer(self.mode, &self.formats) {
            Ok(raw) => raw,
            Err(e) => {
                if self.retry < self.max_retry {
                    self.retry += 1;
                    scheduler.retry_later(self.retry);
                }
                log_warn!(
                    events,
                    "Failed to retrieve {} data (try {}/{}): {}",
                    self.mode,
                    self.retry,
                    self.max_retry,
                    e
                );
                return ReadOutcome::NoChange;
            }
        };
        self.retry = 0;

        let timestamp = raw.timestamp_token();
        if timestamp.is_none() || timestamp != self.last_timestamp.as_deref() {
            self.last_timestamp = timestamp.map(<[u8]>::to_vec);
            self.pending.data = raw.filter(&self.formats);
            if let Some(owner) = raw.owner.filter(|owner| !owner.is_empty()) {
                self.pending.owner = owner;
            }
        } else {
            log_debug!(events, "Skipping unchanged {} data (same timestamp)", self.mode);
        }

        if !self.dirty {
            if !self.has_unpublished_data() {
                return ReadOutcome::NoChange;
            }
            self.dirty = true;
            self.timer_emit_change.start();
            return ReadOutcome::ChangeDetected;
        }

        self.timer_emit_change.start();
        ReadOutcome::ChangePending
    }

    /// Promotes pending data. Emits `Changed` unless `silent`.
    pub(crate) fn publish(&mut self, events: &EventSender, silent: bool) -> bool {
        self.timer_emit_change.stop();
        if !self.enabled || !self.dirty {
            return false;
        }

        self.published = self.pending.clone();
        self.dirty = false;
        if !silent {
            let _ = events.send(MonitorEvent::Changed(self.mode));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipwatch_clipboard::ReadError;
    use clipwatch_core::{data_map, RawSnapshot, MIME_HTML, TIMESTAMP_FORMAT};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct QueuedReader {
        replies: RefCell<VecDeque<Option<RawSnapshot>>>,
    }

    impl QueuedReader {
        fn new(replies: Vec<Option<RawSnapshot>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
            }
        }
    }

    impl ClipboardReader for QueuedReader {
        fn read_buffer(&self, _mode: ClipboardMode, _formats: &[String]) -> Result<RawSnapshot, ReadError> {
            self.replies
                .borrow_mut()
                .pop_front()
                .flatten()
                .ok_or(ReadError::Timeout)
        }

        fn owner_title(&self, _mode: ClipboardMode) -> String {
            String::new()
        }
    }

    fn text(payload: &str, timestamp: &str) -> Option<RawSnapshot> {
        Some(RawSnapshot::new(data_map([(MIME_TEXT, payload), (TIMESTAMP_FORMAT, timestamp)])))
    }

    fn tracker() -> BufferTracker {
        let mut tracker = BufferTracker::new(ClipboardMode::Clipboard, true, 3);
        tracker.set_formats(vec![MIME_TEXT.to_string()]);
        tracker
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(Duration::from_millis(50), Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn detects_and_publishes_change() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![text("a", "1")]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        assert_eq!(tracker.attempt_read(&reader, &mut scheduler, &tx), ReadOutcome::ChangeDetected);
        assert!(tracker.is_dirty());
        assert!(tracker.timer().is_active());
        assert!(tracker.published().data.is_empty());

        assert!(tracker.publish(&tx, false));
        assert_eq!(tracker.published().data, data_map([(MIME_TEXT, "a")]));
        assert!(!tracker.timer().is_active());
        assert_eq!(rx.try_recv().unwrap(), MonitorEvent::Changed(ClipboardMode::Clipboard));
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribed_formats_are_not_a_change() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![
            Some(RawSnapshot::new(data_map([(MIME_TEXT, "a"), (MIME_HTML, "x")]))),
            Some(RawSnapshot::new(data_map([(MIME_TEXT, "a"), (MIME_HTML, "y")]))),
        ]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        tracker.attempt_read(&reader, &mut scheduler, &tx);
        tracker.publish(&tx, true);

        assert_eq!(tracker.attempt_read(&reader, &mut scheduler, &tx), ReadOutcome::NoChange);
        assert!(!tracker.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn same_timestamp_keeps_pending_data() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![text("a", "100"), text("b", "100")]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        tracker.attempt_read(&reader, &mut scheduler, &tx);
        tracker.publish(&tx, true);

        assert_eq!(tracker.attempt_read(&reader, &mut scheduler, &tx), ReadOutcome::NoChange);
        assert_eq!(tracker.pending().data, data_map([(MIME_TEXT, "a")]));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_schedule_bounded_retries() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![None, None, None, None, None]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        for attempt in 1..=3 {
            scheduler.stop();
            assert_eq!(tracker.attempt_read(&reader, &mut scheduler, &tx), ReadOutcome::NoChange);
            assert_eq!(tracker.retry_count(), attempt);
            assert_eq!(scheduler.timer().remaining(), Some(Duration::from_millis(500) * attempt));
        }

        scheduler.stop();
        tracker.attempt_read(&reader, &mut scheduler, &tx);
        assert_eq!(tracker.retry_count(), 3);
        assert!(!scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_retry_count() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![None, text("a", "1")]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        tracker.attempt_read(&reader, &mut scheduler, &tx);
        assert_eq!(tracker.retry_count(), 1);
        tracker.attempt_read(&reader, &mut scheduler, &tx);
        assert_eq!(tracker.retry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_publish_is_a_no_op() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![text("a", "1")]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        tracker.attempt_read(&reader, &mut scheduler, &tx);
        assert!(tracker.publish(&tx, false));
        assert!(!tracker.publish(&tx, false));

        assert_eq!(rx.try_recv().unwrap(), MonitorEvent::Changed(ClipboardMode::Clipboard));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_tracker_neither_reads_nor_publishes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = QueuedReader::new(vec![text("a", "1")]);
        let mut tracker = tracker();
        let mut scheduler = scheduler();

        tracker.attempt_read(&reader, &mut scheduler, &tx);
        tracker.set_enabled(false);
        assert!(!tracker.publish(&tx, false));
        assert_eq!(tracker.attempt_read(&reader, &mut scheduler, &tx), ReadOutcome::NoChange);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn require_text_is_additive() {
        let mut tracker = BufferTracker::new(ClipboardMode::Selection, true, 3);
        tracker.set_formats(vec![MIME_HTML.to_string()]);
        tracker.require_text();
        tracker.require_text();
        assert_eq!(tracker.formats(), &[MIME_HTML.to_string(), MIME_TEXT.to_string()]);
    }
}
