//! Deadline queue for chord and easing timers.
//!
//! The original design chained one-shot timers that re-armed themselves from
//! inside their callbacks. Here every armed timer is an entry in a single
//! binary heap keyed by deadline; the engine drains due entries and each
//! tick handler re-arms explicitly. Time is a plain millisecond counter so
//! tests drive the queue with a virtual clock.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Identifies which tick handler an armed timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimerKind {
    /// Selection overlay cursor tracking.
    Select,
    /// Deferred lone-click forwarding.
    ClickTimeout,
    /// Scroll easing step.
    ScrollStep,
    /// Drag-to-scroll cursor sampling.
    ScrollDrag,
    /// Window move easing plus edge auto-scroll.
    MoveScroll,
    /// Zoom level easing.
    Zoom,
    /// Current-screen tracking from the raw cursor.
    CursorTrack,
}

/// Token for one armed entry; cancelling a stale token is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

pub struct Timers {
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    live: Vec<(u64, TimerKind)>,
    seq: u64,
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: Vec::new(),
            seq: 0,
        }
    }

    /// Arms `kind` to fire at `deadline` (absolute milliseconds).
    pub fn arm(&mut self, kind: TimerKind, deadline: u64) -> TimerHandle {
        self.seq += 1;
        let seq = self.seq;
        self.heap.push(Reverse((deadline, seq)));
        self.live.push((seq, kind));
        TimerHandle(seq)
    }

    /// Cancels an armed entry. Safe to call with tokens that already fired.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.live.retain(|(seq, _)| *seq != handle.0);
    }

    /// Earliest live deadline, if any.
    pub fn next_deadline(&mut self) -> Option<u64> {
        while let Some(Reverse((deadline, seq))) = self.heap.peek().copied() {
            if self.live.iter().any(|(s, _)| *s == seq) {
                return Some(deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Pops the next entry due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerHandle, TimerKind)> {
        while let Some(Reverse((deadline, seq))) = self.heap.peek().copied() {
            if deadline > now {
                return None;
            }
            self.heap.pop();
            if let Some(pos) = self.live.iter().position(|(s, _)| *s == seq) {
                let (_, kind) = self.live.swap_remove(pos);
                return Some((TimerHandle(seq), kind));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let mut timers = Timers::new();
        timers.arm(TimerKind::Zoom, 32);
        timers.arm(TimerKind::Select, 16);
        assert_eq!(timers.next_deadline(), Some(16));
        assert_eq!(timers.pop_due(16).map(|(_, k)| k), Some(TimerKind::Select));
        assert_eq!(timers.pop_due(16), None);
        assert_eq!(timers.pop_due(32).map(|(_, k)| k), Some(TimerKind::Zoom));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = Timers::new();
        let handle = timers.arm(TimerKind::ClickTimeout, 125);
        timers.cancel(handle);
        timers.cancel(handle);
        assert_eq!(timers.pop_due(1000), None);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn rearm_replaces_cancelled_entry() {
        let mut timers = Timers::new();
        let first = timers.arm(TimerKind::ScrollStep, 16);
        timers.cancel(first);
        timers.arm(TimerKind::ScrollStep, 48);
        assert_eq!(timers.next_deadline(), Some(48));
    }
}
