//! Transition serialization and the virtual clock that drives it.
//!
//! At most one open/close transition runs at a time. Requests that arrive
//! while one is running are dropped, not queued; the only queued work is an
//! explicit close-all sequence, which is drained from the completion of each
//! transition rather than by polling the lock.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::stack::LayerId;

/// Single-flight lock for open/close transitions.
#[derive(Debug, Default)]
pub struct AnimationLock {
    holder: Option<LayerId>,
    acquisitions: u64,
}

impl AnimationLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `layer`'s transition. Returns false if held.
    pub fn try_acquire(&mut self, layer: LayerId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(layer);
        self.acquisitions = self.acquisitions.saturating_add(1);
        true
    }

    pub fn release(&mut self) {
        self.holder = None;
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn holder(&self) -> Option<LayerId> {
        self.holder
    }

    /// Number of successful acquisitions so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }
}

/// Work scheduled on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    OpenComplete(LayerId),
    CloseComplete(LayerId),
    /// Debounced relayout; only the latest generation acts.
    ResizeSettle(u64),
}

/// Monotonic virtual clock with one-shot timers.
///
/// Timers due at the same instant fire in scheduling order.
#[derive(Debug, Default)]
pub struct Timeline {
    now: Duration,
    seq: u64,
    timers: BTreeMap<(Duration, u64), Timer>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the timeline started.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, timer: Timer) -> Duration {
        let at = self.now.saturating_add(delay);
        self.seq = self.seq.saturating_add(1);
        self.timers.insert((at, self.seq), timer);
        at
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(at, _)| *at)
    }

    /// Pop the earliest timer due at or before `limit`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, limit: Duration) -> Option<Timer> {
        let (&(at, seq), _) = self.timers.iter().next()?;
        if at > limit {
            return None;
        }
        let timer = self.timers.remove(&(at, seq))?;
        self.now = self.now.max(at);
        Some(timer)
    }

    /// Move the clock forward without firing anything.
    pub fn settle_at(&mut self, at: Duration) {
        self.now = self.now.max(at);
    }
}

/// Ordered queue of layers waiting to be closed by a close-all sequence.
#[derive(Debug, Default)]
pub struct CloseQueue {
    pending: VecDeque<LayerId>,
}

impl CloseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue with `layers`, closed front to back.
    pub fn fill(&mut self, layers: impl IntoIterator<Item = LayerId>) {
        self.pending = layers.into_iter().collect();
    }

    pub fn pop(&mut self) -> Option<LayerId> {
        self.pending.pop_front()
    }
}
