//! System interconnect (memory bus) between the per-core caches and memory.
//!
//! This module implements the shared bus that carries cache-line traffic. It provides:
//! 1. **Queueing:** One FIFO per core with a shared capacity; a full bus reports
//!    `QueueOverflow` and the caller retries on a later tick.
//! 2. **Arbitration:** Strict round-robin over core id among cores with a queued transaction.
//! 3. **Occupancy:** A granted transaction holds the bus for its transit time; the next
//!    arbitration is scheduled for the tick the bus becomes idle.
//! 4. **Forwarding:** Winners are handed to the memory controller when they arrive.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::{CoreId, SimError, Tick};
use crate::config::SystemConfig;
use crate::sim::dispatch::SimEvent;
use crate::sim::event::EventQueue;
use crate::soc::memory::MemoryController;
use crate::soc::transaction::BusTransaction;

/// Round-robin grant pointer over `n` requesters.
///
/// After granting requester `w` the search for the next grant starts at `w + 1`,
/// so any set of continuously ready requesters is served once each before any
/// is served again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundRobinArbiter {
    next: usize,
    n: usize,
}

impl RoundRobinArbiter {
    /// Creates an arbiter over `n` requesters with priority starting at 0.
    pub const fn new(n: usize) -> Self {
        Self { next: 0, n }
    }

    /// Grants the first ready requester at or after the pointer.
    ///
    /// # Arguments
    ///
    /// * `ready` - Returns whether requester `i` has a request.
    ///
    /// # Returns
    ///
    /// The winner, or `None` if no requester is ready.
    pub fn grant(&mut self, ready: impl Fn(usize) -> bool) -> Option<usize> {
        let winner = (0..self.n)
            .map(|offset| (self.next + offset) % self.n)
            .find(|&i| ready(i))?;
        self.next = (winner + 1) % self.n;
        Some(winner)
    }

    /// Requester with highest priority for the next grant.
    pub const fn next(&self) -> usize {
        self.next
    }
}

/// Bus counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Transactions accepted into a queue.
    pub routed: u64,
    /// Transactions forwarded to the controller.
    pub granted: u64,
    /// `route` calls refused for lack of capacity.
    pub overflows: u64,
    /// Ticks the bus spent transferring.
    pub busy_ticks: u64,
    /// Largest number of transactions queued at once.
    pub max_queued: usize,
}

/// Shared memory bus.
#[derive(Debug)]
pub struct MemoryBus {
    /// Bus width in bytes; sets how many beats a line transfer takes.
    pub width_bytes: u64,
    /// Base latency in cycles per transaction.
    pub latency_cycles: u64,
    transfer_bytes: usize,
    capacity: usize,
    queues: Vec<VecDeque<BusTransaction>>,
    queued: usize,
    arbiter: RoundRobinArbiter,
    busy_until: Tick,
    arbitration_pending: bool,
    stats: BusStats,
}

impl MemoryBus {
    /// Creates an idle bus.
    ///
    /// # Arguments
    ///
    /// * `config` - Width, latency and queue capacity.
    /// * `num_cores` - Number of requesters.
    /// * `transfer_bytes` - Bytes moved per transaction (the cache line size).
    pub fn new(config: &SystemConfig, num_cores: usize, transfer_bytes: usize) -> Self {
        Self {
            width_bytes: config.bus_width,
            latency_cycles: config.bus_latency,
            transfer_bytes,
            capacity: config.bus_queue_capacity,
            queues: vec![VecDeque::new(); num_cores],
            queued: 0,
            arbiter: RoundRobinArbiter::new(num_cores),
            busy_until: 0,
            arbitration_pending: false,
            stats: BusStats::default(),
        }
    }

    /// Returns the number of cycles to transfer the given number of bytes on this bus.
    ///
    /// # Returns
    ///
    /// Cycles = base latency plus ceiling(bytes / width_bytes) transfers.
    pub const fn calculate_transit_time(&self, bytes: usize) -> u64 {
        let transfers = (bytes as u64).div_ceil(self.width_bytes);
        self.latency_cycles + transfers
    }

    /// Transactions currently queued across all cores.
    pub const fn queued(&self) -> usize {
        self.queued
    }

    /// Transactions queued by one core.
    pub fn queued_for(&self, core: CoreId) -> usize {
        self.queues.get(core).map_or(0, VecDeque::len)
    }

    /// Tick at which the bus is next idle.
    pub const fn busy_until(&self) -> Tick {
        self.busy_until
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> BusStats {
        self.stats
    }

    /// Queues a transaction from its source core.
    ///
    /// Schedules an arbitration for the first tick the bus is idle if none is
    /// pending.
    ///
    /// # Returns
    ///
    /// `Ok(())`, or `SimError::QueueOverflow` if the bus is full. The transaction
    /// is not queued in that case; the caller keeps it and retries.
    pub fn route(
        &mut self,
        txn: BusTransaction,
        tick: Tick,
        queue: &mut EventQueue<SimEvent>,
    ) -> Result<(), SimError> {
        if self.queued >= self.capacity {
            self.stats.overflows += 1;
            trace!(txn = %txn, capacity = self.capacity, "bus full");
            return Err(SimError::QueueOverflow {
                capacity: self.capacity,
            });
        }
        trace!(txn = %txn, "bus route");
        self.queues[txn.source].push_back(txn);
        self.queued += 1;
        self.stats.routed += 1;
        self.stats.max_queued = self.stats.max_queued.max(self.queued);
        if !self.arbitration_pending {
            let _ = queue.post(tick.max(self.busy_until), SimEvent::BusArbitrate)?;
            self.arbitration_pending = true;
        }
        Ok(())
    }

    /// Grants one queued transaction and forwards it to the controller.
    ///
    /// Runs on a `BusArbitrate` event. The winner occupies the bus for its
    /// transit time and reaches the controller when the transfer ends; if more
    /// transactions are waiting, the next arbitration is posted for that tick.
    ///
    /// # Returns
    ///
    /// The granted transaction's source core, or `None` if nothing was queued.
    pub fn arbitrate(
        &mut self,
        controller: &mut MemoryController,
        queue: &mut EventQueue<SimEvent>,
    ) -> Result<Option<CoreId>, SimError> {
        let tick = queue.now();
        self.arbitration_pending = false;
        if tick < self.busy_until {
            let _ = queue.post(self.busy_until, SimEvent::BusArbitrate)?;
            self.arbitration_pending = true;
            return Ok(None);
        }
        let queues = &self.queues;
        let Some(winner) = self.arbiter.grant(|i| !queues[i].is_empty()) else {
            return Ok(None);
        };
        let Some(txn) = self.queues[winner].pop_front() else {
            return Ok(None);
        };
        self.queued -= 1;
        self.stats.granted += 1;

        let transit = self.calculate_transit_time(self.transfer_bytes);
        self.busy_until = tick + transit;
        self.stats.busy_ticks += transit;
        debug!(txn = %txn, arrive = self.busy_until, "bus grant");
        let _ = controller.service(txn, self.busy_until, queue)?;

        if self.queued > 0 {
            let _ = queue.post(self.busy_until, SimEvent::BusArbitrate)?;
            self.arbitration_pending = true;
        }
        Ok(Some(winner))
    }
}
