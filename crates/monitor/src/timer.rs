use std::time::Duration;
use tokio::time::Instant;

/// Single-shot timer with a sticky interval.
///
/// Timers never fire on their own; the owner asks for due timers and fires
/// them on its control thread.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// (Re)arms the timer at the current interval.
    pub fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    pub fn start_with(&mut self, interval: Duration) {
        self.interval = interval;
        self.start();
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the interval without arming or disarming.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.map_or(false, |deadline| deadline <= now)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}
