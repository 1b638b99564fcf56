use std::collections::BTreeMap;

use crate::foundation::core::{ElementId, Millis};

/// Handle returned by [`TimerQueue::schedule`], used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Work a layer defers to its coarse timer clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Create one element (initial stagger or refill after a failed spawn).
    Spawn,
    /// An ambient element's hold pause is over; start fading out.
    HoldExpired(ElementId),
    /// Sample layers: probabilistic add window elapsed.
    SampleAddWindow,
    /// Sample layers: probabilistic remove window elapsed.
    SampleRemoveWindow,
}

/// Cancellable one-shot timers ordered by due time, then by scheduling order.
///
/// Each layer owns exactly one queue, so cancelling a layer never touches another
/// layer's timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    by_due: BTreeMap<(Millis, TimerId), TimerEvent>,
    due_of: BTreeMap<TimerId, Millis>,
}

impl TimerQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire once the clock reaches `due`.
    pub fn schedule(&mut self, due: Millis, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.by_due.insert((due, id), event);
        self.due_of.insert(id, due);
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_of.remove(&id) {
            Some(due) => self.by_due.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Cancel everything; returns how many timers were pending.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.by_due.len();
        self.by_due.clear();
        self.due_of.clear();
        n
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Popping one at a time lets handlers schedule or cancel timers between firings.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerId, TimerEvent)> {
        let (&(due, id), _) = self.by_due.first_key_value()?;
        if due > now {
            return None;
        }
        let event = self.by_due.remove(&(due, id))?;
        self.due_of.remove(&id);
        Some((id, event))
    }

    /// Number of pending timers.
    pub fn pending(&self) -> usize {
        self.by_due.len()
    }

    /// Return `true` when a timer for `event` is pending.
    pub fn has_pending(&self, event: TimerEvent) -> bool {
        self.by_due.values().any(|e| *e == event)
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.by_due.keys().next().map(|(due, _)| *due)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/timers.rs"]
mod tests;
