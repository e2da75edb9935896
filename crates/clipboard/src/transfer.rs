use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// `NONE` as sent in a refused `SelectionNotify`.
const NO_PROPERTY: u32 = 0;

/// Abandoned requests older than this are assumed never to be answered.
const FORGET_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Request {
    pub selection: u32,
    pub target: u32,
    pub property: u32,
}

#[derive(Debug, Clone, Copy)]
struct Abandoned {
    request: Request,
    at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotifyMatch {
    /// Answer to the request being waited on.
    Current,
    /// Late answer to a request that already timed out. `Some` holds a
    /// property that still carries its data.
    Late(Option<u32>),
    Unrelated,
}

/// Hands out transfer properties and keeps timed-out conversions apart from
/// the current one.
///
/// Owners answer conversions in the order they were requested, so a late
/// refusal belongs to the oldest abandoned request for the same selection and
/// target.
#[derive(Debug)]
pub(crate) struct TransferSlots {
    properties: Vec<u32>,
    next: usize,
    abandoned: VecDeque<Abandoned>,
}

impl TransferSlots {
    pub fn new(properties: Vec<u32>) -> Self {
        Self {
            properties,
            next: 0,
            abandoned: VecDeque::new(),
        }
    }

    /// A property that no abandoned request can still write to.
    pub fn acquire(&mut self, now: Instant) -> u32 {
        self.abandoned
            .retain(|entry| now.saturating_duration_since(entry.at) < FORGET_AFTER);

        for _ in 0..self.properties.len() {
            let property = self.properties[self.next];
            self.next = (self.next + 1) % self.properties.len();
            if !self.abandoned.iter().any(|entry| entry.request.property == property) {
                return property;
            }
        }

        // Every property is held; reuse the one of the oldest abandoned request.
        match self.abandoned.pop_front() {
            Some(oldest) => oldest.request.property,
            None => self.properties[0],
        }
    }

    pub fn abandon(&mut self, request: Request, now: Instant) {
        self.abandoned.push_back(Abandoned { request, at: now });
    }

    #[cfg(test)]
    pub fn pending_abandoned(&self) -> usize {
        self.abandoned.len()
    }

    pub fn classify(&mut self, current: &Request, selection: u32, target: u32, property: u32) -> NotifyMatch {
        let late = self.abandoned.iter().position(|entry| {
            entry.request.selection == selection
                && entry.request.target == target
                && (property == NO_PROPERTY || entry.request.property == property)
        });
        if let Some(index) = late {
            self.abandoned.remove(index);
            return NotifyMatch::Late((property != NO_PROPERTY).then_some(property));
        }

        if current.selection == selection
            && current.target == target
            && (property == NO_PROPERTY || property == current.property)
        {
            NotifyMatch::Current
        } else {
            NotifyMatch::Unrelated
        }
    }
}

/// Chunks of an INCR transfer. Each received chunk extends the deadline.
#[derive(Debug)]
pub(crate) struct IncrTransfer {
    data: Vec<u8>,
    chunk_timeout: Duration,
    deadline: Instant,
}

impl IncrTransfer {
    pub fn new(size_hint: usize, chunk_timeout: Duration, now: Instant) -> Self {
        Self {
            data: Vec::with_capacity(size_hint),
            chunk_timeout,
            deadline: now + chunk_timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns true once the terminating empty chunk arrived.
    pub fn push_chunk(&mut self, chunk: Vec<u8>, now: Instant) -> bool {
        if chunk.is_empty() {
            return true;
        }
        self.data.extend(chunk);
        self.deadline = now + self.chunk_timeout;
        false
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
