//! Discrete-event scheduler.
//!
//! This module implements the queue that orders all timing activity. It provides:
//! 1. **Clock:** `SimClock`, advanced only by dispatch and never decremented.
//! 2. **Ordering:** A binary heap keyed by `(tick, priority, sequence)`; the sequence number
//!    is assigned at schedule time so same-tick, same-priority events pop in insertion order.
//! 3. **Soft cancellation:** Cancelled entries stay in the heap and are skipped when popped,
//!    so cancelling never restructures the heap.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::common::{SimError, Tick};

/// Handle returned by `schedule`, used to cancel an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u64);

/// Process-wide simulated time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    now: Tick,
}

impl SimClock {
    /// Returns the current tick.
    #[inline]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Moves the clock forward to `tick`; earlier ticks are ignored.
    #[inline]
    fn advance_to(&mut self, tick: Tick) {
        debug_assert!(tick >= self.now, "clock moved backwards");
        self.now = self.now.max(tick);
    }
}

/// An event popped from the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event<P> {
    /// Tick at which the event fires.
    pub tick: Tick,
    /// Lower values fire first among events at the same tick.
    pub priority: i32,
    /// Insertion sequence number; breaks `(tick, priority)` ties.
    pub seq: u64,
    /// Handler payload.
    pub payload: P,
}

impl<P> Event<P> {
    /// Returns the handle this event was scheduled under.
    pub const fn id(&self) -> EventId {
        EventId(self.seq)
    }
}

/// Priority queue of future events.
///
/// The heap only stores ordering keys; payloads live in a side table keyed by
/// sequence number. Cancelling removes the payload and leaves the key behind,
/// which `pop_next` discards when it reaches it.
#[derive(Debug)]
pub struct EventQueue<P> {
    heap: BinaryHeap<Reverse<(Tick, i32, u64)>>,
    payloads: HashMap<u64, P>,
    next_seq: u64,
    clock: SimClock,
    dispatched: u64,
    cancelled: u64,
}

impl<P> Default for EventQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventQueue<P> {
    /// Creates an empty queue with the clock at tick 0.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            payloads: HashMap::new(),
            next_seq: 0,
            clock: SimClock::default(),
            dispatched: 0,
            cancelled: 0,
        }
    }

    /// Returns the current simulation tick.
    #[inline]
    pub const fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Returns a copy of the simulation clock.
    pub const fn clock(&self) -> SimClock {
        self.clock
    }

    /// Schedules `payload` at `tick` with default priority 0.
    ///
    /// # Arguments
    ///
    /// * `tick` - Absolute tick at which the event fires.
    /// * `payload` - Handler payload delivered by `pop_next`.
    ///
    /// # Returns
    ///
    /// The event handle, or `SimError::InvalidTick` if `tick` is before the current clock.
    pub fn schedule(&mut self, tick: Tick, payload: P) -> Result<EventId, SimError> {
        self.schedule_with_priority(tick, 0, payload)
    }

    /// Schedules `payload` at `tick`; among same-tick events lower `priority` fires first.
    pub fn schedule_with_priority(
        &mut self,
        tick: Tick,
        priority: i32,
        payload: P,
    ) -> Result<EventId, SimError> {
        let now = self.now();
        if tick < now {
            return Err(SimError::InvalidTick { tick, now });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((tick, priority, seq)));
        let _ = self.payloads.insert(seq, payload);
        Ok(EventId(seq))
    }

    /// Soft-cancels a scheduled event.
    ///
    /// # Returns
    ///
    /// `true` if the event was still pending; `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: EventId) -> bool {
        let removed = self.payloads.remove(&id.0).is_some();
        if removed {
            self.cancelled += 1;
        }
        removed
    }

    /// Returns whether the event is still pending.
    pub fn is_pending(&self, id: EventId) -> bool {
        self.payloads.contains_key(&id.0)
    }

    /// Pops the lowest `(tick, priority, sequence)` live event and advances the clock to it.
    ///
    /// # Returns
    ///
    /// `None` when no live events remain.
    pub fn pop_next(&mut self) -> Option<Event<P>> {
        while let Some(Reverse((tick, priority, seq))) = self.heap.pop() {
            let Some(payload) = self.payloads.remove(&seq) else {
                continue;
            };
            self.clock.advance_to(tick);
            self.dispatched += 1;
            return Some(Event {
                tick,
                priority,
                seq,
                payload,
            });
        }
        None
    }

    /// Returns the tick of the next live event without popping it.
    pub fn peek_tick(&mut self) -> Option<Tick> {
        while let Some(Reverse((tick, _, seq))) = self.heap.peek().copied() {
            if self.payloads.contains_key(&seq) {
                return Some(tick);
            }
            let _ = self.heap.pop();
        }
        None
    }

    /// Number of live (not cancelled, not yet dispatched) events.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Returns whether no live events remain.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Total events dispatched so far.
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Total events cancelled before dispatch.
    pub const fn cancelled(&self) -> u64 {
        self.cancelled
    }
}
