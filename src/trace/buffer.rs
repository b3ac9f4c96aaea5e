//! Bounded store for promise lifecycle events.
//!
//! Only the most recent `capacity` events are kept, so a long-running host
//! can leave tracing on without unbounded memory growth.

use std::collections::VecDeque;

use super::event::PromiseEvent;

/// Keeps the newest events up to a fixed capacity, oldest first.
#[derive(Debug)]
pub struct TraceBuffer {
    events: VecDeque<PromiseEvent>,
    capacity: usize,
    next_seq: u64,
}

impl TraceBuffer {
    /// Creates an empty buffer. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Stamps `event` with the next sequence number and stores it, evicting
    /// the oldest event when full.
    pub fn push(&mut self, mut event: PromiseEvent) {
        event.seq = self.next_seq;
        self.next_seq += 1;
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Iterates the stored events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PromiseEvent> {
        self.events.iter()
    }

    /// Renders the stored events as newline-delimited JSON, oldest first.
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}
