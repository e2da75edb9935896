#![allow(dead_code)]

use anyhow::Result;
use clipwatch_clipboard::{ClipboardReader, ClipboardWriter, ReadError};
use clipwatch_core::{
    data_map, ClipboardMode, DataMap, MonitorConfig, PointerState, RawSnapshot, BUTTON1_MASK, MIME_TEXT,
    TIMESTAMP_FORMAT,
};
use clipwatch_input::PointerStateSource;
use clipwatch_monitor::{ClipboardMonitor, MonitorEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;

#[derive(Default)]
struct FakeState {
    contents: HashMap<ClipboardMode, RawSnapshot>,
    owners: HashMap<ClipboardMode, String>,
    failures: HashMap<ClipboardMode, u32>,
    calls: Vec<String>,
    written: Vec<(ClipboardMode, DataMap)>,
}

/// In-memory X11 buffers shared between a test and the monitor under test.
#[derive(Clone, Default)]
pub struct FakeClipboard {
    state: Arc<Mutex<FakeState>>,
}

impl FakeClipboard {
    pub fn set(&self, mode: ClipboardMode, snapshot: RawSnapshot) {
        self.state.lock().unwrap().contents.insert(mode, snapshot);
    }

    pub fn set_text(&self, mode: ClipboardMode, text: &str, timestamp: &str) {
        self.set(mode, text_snapshot(text, timestamp));
    }

    pub fn set_owner(&self, mode: ClipboardMode, owner: &str) {
        self.state.lock().unwrap().owners.insert(mode, owner.to_string());
    }

    /// Next `count` reads of `mode` time out.
    pub fn fail_next(&self, mode: ClipboardMode, count: u32) {
        self.state.lock().unwrap().failures.insert(mode, count);
    }

    pub fn reads(&self, mode: ClipboardMode) -> usize {
        let name = format!("read {}", mode);
        self.calls().iter().filter(|call| **call == name).count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn written(&self) -> Vec<(ClipboardMode, DataMap)> {
        self.state.lock().unwrap().written.clone()
    }
}

impl ClipboardReader for FakeClipboard {
    fn read_buffer(&self, mode: ClipboardMode, _formats: &[String]) -> Result<RawSnapshot, ReadError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("read {}", mode));

        if let Some(failures) = state.failures.get_mut(&mode) {
            if *failures > 0 {
                *failures -= 1;
                return Err(ReadError::Timeout);
            }
        }

        state.contents.get(&mode).cloned().ok_or(ReadError::NoOwner)
    }

    fn owner_title(&self, mode: ClipboardMode) -> String {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("owner {}", mode));
        state.owners.get(&mode).cloned().unwrap_or_default()
    }
}

impl ClipboardWriter for FakeClipboard {
    fn set_data(&self, mode: ClipboardMode, data: &DataMap) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("write {}", mode));
        state.written.push((mode, data.clone()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakePointer {
    state: Arc<Mutex<Option<PointerState>>>,
}

impl FakePointer {
    pub fn x11() -> Self {
        let pointer = Self::default();
        pointer.release();
        pointer
    }

    pub fn press(&self) {
        *self.state.lock().unwrap() = Some(PointerState {
            button_mask: BUTTON1_MASK,
            modifier_mask: 0,
        });
    }

    pub fn release(&self) {
        *self.state.lock().unwrap() = Some(PointerState::default());
    }
}

impl PointerStateSource for FakePointer {
    fn query_pointer_state(&self) -> Result<Option<PointerState>> {
        Ok(*self.state.lock().unwrap())
    }
}

pub fn text_snapshot(text: &str, timestamp: &str) -> RawSnapshot {
    RawSnapshot::new(data_map([(MIME_TEXT, text), (TIMESTAMP_FORMAT, timestamp)]))
}

pub fn text_formats() -> Vec<String> {
    vec![MIME_TEXT.to_string()]
}

pub fn new_monitor(
    clipboard: &FakeClipboard,
    pointer: &FakePointer,
) -> (ClipboardMonitor, UnboundedReceiver<MonitorEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let monitor = ClipboardMonitor::new(
        &MonitorConfig::default(),
        Box::new(clipboard.clone()),
        Box::new(clipboard.clone()),
        Box::new(pointer.clone()),
        tx,
    );
    (monitor, rx)
}

/// Monitor with both buffers holding text, already started.
pub fn started_monitor(
    clipboard: &FakeClipboard,
    pointer: &FakePointer,
) -> (ClipboardMonitor, UnboundedReceiver<MonitorEvent>) {
    clipboard.set_text(ClipboardMode::Clipboard, "a", "100");
    clipboard.set_text(ClipboardMode::Selection, "s", "200");
    let (mut monitor, rx) = new_monitor(clipboard, pointer);
    monitor.start_monitoring(text_formats());
    (monitor, rx)
}

/// Advances paused time by `duration`, firing timers as they come due.
pub async fn run_for(monitor: &mut ClipboardMonitor, duration: Duration) {
    let end = Instant::now() + duration;
    monitor.fire_due_timers();
    while let Some(deadline) = monitor.next_deadline() {
        if deadline > end {
            break;
        }
        tokio::time::advance(deadline.saturating_duration_since(Instant::now())).await;
        monitor.fire_due_timers();
    }
    tokio::time::advance(end.saturating_duration_since(Instant::now())).await;
}

pub fn drain(rx: &mut UnboundedReceiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn changes(rx: &mut UnboundedReceiver<MonitorEvent>) -> Vec<ClipboardMode> {
    drain(rx)
        .into_iter()
        .filter_map(|event| match event {
            MonitorEvent::Changed(mode) => Some(mode),
            _ => None,
        })
        .collect()
}

pub fn log_messages(events: &[MonitorEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            MonitorEvent::Log { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
