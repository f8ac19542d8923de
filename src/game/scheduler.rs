//! Event Scheduler
//!
//! Deferred continuations (explosive fuses, blink toggles, chain-detonation
//! delays, flash expiry) are queued here against a monotonic simulation
//! clock and drained once per tick. Nothing runs on another thread.
//!
//! Time is kept in whole microseconds so ordering is exact; the public API
//! speaks milliseconds.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

/// Handle to a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Pending<E> {
    due_us: u64,
    event: E,
}

/// Priority queue of events keyed by `(due time, insertion order)`.
///
/// Cancellation removes the live entry immediately; the heap slot is
/// discarded lazily when it reaches the front.
#[derive(Debug)]
pub struct Scheduler<E> {
    now_us: u64,
    next_id: u64,
    queue: BinaryHeap<Reverse<(u64, u64)>>,
    live: HashMap<u64, Pending<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now_us: 0,
            next_id: 1,
            queue: BinaryHeap::new(),
            live: HashMap::new(),
        }
    }

    /// Current simulation time in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.now_us as f64 / 1000.0
    }

    /// Advance the clock. Negative or non-finite steps are ignored.
    pub fn advance(&mut self, delta_ms: f32) {
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.now_us += ms_to_us(delta_ms);
        }
    }

    /// Queue `event` to fire `delay_ms` from now.
    pub fn schedule_in(&mut self, delay_ms: f32, event: E) -> TimerId {
        let delay = if delay_ms.is_finite() && delay_ms > 0.0 {
            ms_to_us(delay_ms)
        } else {
            0
        };
        let id = self.next_id;
        self.next_id += 1;
        let due_us = self.now_us + delay;
        self.queue.push(Reverse((due_us, id)));
        self.live.insert(id, Pending { due_us, event });
        log::trace!("timer {id} scheduled at {due_us}us");
        TimerId(id)
    }

    /// Cancel a pending event. Returns `false` when it already fired or was
    /// cancelled before, so calling twice is harmless.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.live.remove(&id.0).is_some();
        if removed {
            log::trace!("timer {} cancelled", id.0);
        }
        removed
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains_key(&id.0)
    }

    /// Milliseconds until a pending event fires.
    pub fn remaining_ms(&self, id: TimerId) -> Option<f32> {
        self.live
            .get(&id.0)
            .map(|p| p.due_us.saturating_sub(self.now_us) as f32 / 1000.0)
    }

    /// Pop the earliest event that is due at the current time.
    ///
    /// Events scheduled while draining are returned in the same drain if
    /// they are already due.
    pub fn pop_due(&mut self) -> Option<(TimerId, E)> {
        while let Some(Reverse((due_us, id))) = self.queue.peek().copied() {
            if due_us > self.now_us {
                return None;
            }
            self.queue.pop();
            if let Some(pending) = self.live.remove(&id) {
                return Some((TimerId(id), pending.event));
            }
        }
        None
    }

    /// Number of live (not yet fired, not cancelled) events.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

fn ms_to_us(ms: f32) -> u64 {
    (ms as f64 * 1000.0).round() as u64
}
