//! In-flight instruction window.
//!
//! The window tracks every instruction of one core from fetch to retirement. It provides:
//! 1. **Allocation:** Assigns monotonically increasing sequence numbers in program order.
//! 2. **State tracking:** Each entry walks the `InstState` lifecycle as its events fire.
//! 3. **In-order retirement:** Entries leave only from the head, and only once finished.
//!
//! Capacity bounds how far fetch may run ahead of retirement.

use std::collections::VecDeque;

use crate::common::Tick;
use crate::isa::Instruction;

/// Lifecycle state of an in-flight instruction.
///
/// Non-memory instructions go `Fetched → Decoded → Issued → Executing → Completed`.
/// Loads and stores replace `Completed` with `MemoryRequested → MemoryCompleted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstState {
    /// Waiting for its instruction-cache line.
    FetchPending,
    /// Instruction bytes available.
    Fetched,
    /// Decoded; waiting to be selected for issue.
    Decoded,
    /// Selected for issue; waiting for its functional unit.
    Issued,
    /// Functional unit reserved.
    Executing,
    /// Data access sent to the data cache.
    MemoryRequested,
    /// Data access finished.
    MemoryCompleted,
    /// Result available.
    Completed,
}

impl InstState {
    /// Returns whether the instruction may retire.
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::MemoryCompleted)
    }
}

/// One in-flight instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowEntry {
    /// Program-order sequence number, unique per core.
    pub seq: u64,
    /// The instruction.
    pub inst: Instruction,
    /// Current lifecycle state.
    pub state: InstState,
    /// Tick the instruction entered the window.
    pub fetch_tick: Tick,
    /// Tick the functional unit finishes, once issued.
    pub complete_at: Option<Tick>,
}

/// Bounded program-order window.
#[derive(Clone, Debug)]
pub struct InFlightWindow {
    entries: VecDeque<WindowEntry>,
    capacity: usize,
    next_seq: u64,
}

impl InFlightWindow {
    /// Creates an empty window holding at most `capacity` instructions.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    /// Returns the window capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of occupied entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the window is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Sequence number the next allocation will receive.
    pub const fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Allocates an entry at the tail. Returns `None` if the window is full.
    pub fn allocate(&mut self, inst: Instruction, state: InstState, tick: Tick) -> Option<u64> {
        if self.is_full() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(WindowEntry {
            seq,
            inst,
            state,
            fetch_tick: tick,
            complete_at: None,
        });
        Some(seq)
    }

    /// Returns the entry with sequence number `seq`.
    pub fn get(&self, seq: u64) -> Option<&WindowEntry> {
        let head = self.entries.front()?.seq;
        self.entries.get(seq.checked_sub(head)? as usize)
    }

    /// Returns the entry with sequence number `seq` mutably.
    pub fn get_mut(&mut self, seq: u64) -> Option<&mut WindowEntry> {
        let head = self.entries.front()?.seq;
        self.entries.get_mut(seq.checked_sub(head)? as usize)
    }

    /// Oldest entry in `state`, if any.
    pub fn oldest_in(&self, state: InstState) -> Option<&WindowEntry> {
        self.entries.iter().find(|e| e.state == state)
    }

    /// Removes the head entry if it has finished.
    pub fn retire_head(&mut self) -> Option<WindowEntry> {
        if self.entries.front()?.state.is_finished() {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Iterates over entries from oldest to youngest.
    pub fn iter(&self) -> impl Iterator<Item = &WindowEntry> {
        self.entries.iter()
    }
}
