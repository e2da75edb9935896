use crate::timer::Timer;
use std::time::Duration;

/// Shared re-check timer with adaptive backoff.
#[derive(Debug)]
pub struct Scheduler {
    timer: Timer,
    min_interval: Duration,
    max_interval: Duration,
}

impl Scheduler {
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        Self {
            timer: Timer::default(),
            min_interval,
            max_interval,
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Arms for short intervals, caps long ones while something changed and
    /// goes idle otherwise.
    pub fn check_again_later(&mut self, changed: bool, interval: Duration) {
        self.timer.set_interval(interval);
        if interval < self.max_interval {
            self.timer.start();
        } else if changed {
            self.timer.start_with(self.max_interval);
        } else {
            self.timer.stop();
            self.timer.set_interval(Duration::ZERO);
        }
    }

    /// Interval following a check that did not schedule a retry.
    pub fn next_interval(&self) -> Duration {
        self.timer.interval() * 2 + self.min_interval
    }

    pub fn retry_later(&mut self, attempt: u32) {
        self.timer.start_with(self.max_interval * attempt);
    }

    /// Makes sure a check runs within `delay`.
    pub fn check_within(&mut self, delay: Duration) {
        match self.timer.remaining() {
            Some(remaining) if remaining <= delay => {}
            _ => self.timer.start_with(delay),
        }
    }
}
