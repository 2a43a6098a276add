//! Memory controller and DRAM timing models.
//!
//! This module provides:
//! 1. **SimpleTiming:** Fixed latency per access (no row-buffer modeling).
//! 2. **DramTiming:** Row-buffer-aware latency (CAS, RAS, precharge) with an open-row policy.
//! 3. **MemoryController:** Serves one physical address range, serialises requests on a single
//!    channel and schedules each completion back into the event queue.

use tracing::{debug, error};

use crate::common::{AccessType, AddrRange, PhysAddr, SimError, Tick};
use crate::config::{MemoryConfig, MemoryControllerKind};
use crate::sim::dispatch::SimEvent;
use crate::sim::event::EventQueue;
use crate::soc::transaction::BusTransaction;

/// Latency model behind a memory controller.
pub trait TimingModel: Send + Sync + std::fmt::Debug {
    /// Returns the number of cycles required for an access to the given address.
    ///
    /// # Arguments
    ///
    /// * `addr` - Physical address being accessed (may be used for row-buffer modeling).
    ///
    /// # Returns
    ///
    /// Latency in simulation cycles.
    fn access_latency(&mut self, addr: PhysAddr) -> u64;

    /// Accesses that hit the open row, for models that keep one.
    fn row_hits(&self) -> u64 {
        0
    }
}

/// Fixed-latency model; every access takes the same number of cycles.
#[derive(Debug)]
pub struct SimpleTiming {
    latency: u64,
}

impl SimpleTiming {
    /// Creates a simple model with the given fixed latency in cycles.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl TimingModel for SimpleTiming {
    fn access_latency(&mut self, _addr: PhysAddr) -> u64 {
        self.latency
    }
}

/// DRAM-style model with one row buffer; models CAS, RAS, and precharge latencies.
///
/// An access to the open row costs `t_cas`. An access to another row closes the
/// open one first and costs `t_pre + t_ras + t_cas`. The very first access only
/// activates, costing `t_ras + t_cas`.
#[derive(Debug)]
pub struct DramTiming {
    open_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    row_mask: u64,
    row_hits: u64,
}

impl DramTiming {
    /// Creates a DRAM model with the given timing parameters (in cycles).
    ///
    /// # Arguments
    ///
    /// * `t_cas` - Column access strobe latency.
    /// * `t_ras` - Row access strobe latency.
    /// * `t_pre` - Precharge latency.
    /// * `row_bytes` - Row buffer size in bytes; must be a power of two.
    ///
    /// # Returns
    ///
    /// A new `DramTiming` with no row currently open.
    pub const fn new(t_cas: u64, t_ras: u64, t_pre: u64, row_bytes: u64) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
            row_mask: !(row_bytes - 1),
            row_hits: 0,
        }
    }
}

impl TimingModel for DramTiming {
    fn access_latency(&mut self, addr: PhysAddr) -> u64 {
        let row = addr.val() & self.row_mask;
        match self.open_row {
            Some(open) if open == row => {
                self.row_hits += 1;
                self.t_cas
            }
            Some(_) => {
                self.open_row = Some(row);
                self.t_pre + self.t_ras + self.t_cas
            }
            None => {
                self.open_row = Some(row);
                self.t_ras + self.t_cas
            }
        }
    }

    fn row_hits(&self) -> u64 {
        self.row_hits
    }
}

/// Controller counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Read transactions serviced.
    pub reads: u64,
    /// Write transactions serviced.
    pub writes: u64,
    /// Accesses that hit the open DRAM row.
    pub row_hits: u64,
    /// Ticks requests spent waiting for the channel.
    pub queue_ticks: u64,
    /// Ticks spent in the timing model.
    pub busy_ticks: u64,
}

/// Memory controller for a single address range.
#[derive(Debug)]
pub struct MemoryController {
    range: AddrRange,
    timing: Box<dyn TimingModel>,
    busy_until: Tick,
    stats: ControllerStats,
}

impl MemoryController {
    /// Creates a controller over `range` with the given timing model.
    pub fn new(range: AddrRange, timing: Box<dyn TimingModel>) -> Self {
        Self {
            range,
            timing,
            busy_until: 0,
            stats: ControllerStats::default(),
        }
    }

    /// Builds the controller described by a validated `MemoryConfig`.
    pub fn from_config(config: &MemoryConfig) -> Self {
        let timing: Box<dyn TimingModel> = match config.controller {
            MemoryControllerKind::Simple => Box::new(SimpleTiming::new(config.simple_latency)),
            MemoryControllerKind::Dram => Box::new(DramTiming::new(
                config.t_cas,
                config.t_ras,
                config.t_pre,
                config.row_bytes,
            )),
        };
        Self::new(config.range(), timing)
    }

    /// Address range served.
    pub const fn range(&self) -> AddrRange {
        self.range
    }

    /// Tick at which the channel is next free.
    pub const fn busy_until(&self) -> Tick {
        self.busy_until
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            row_hits: self.timing.row_hits(),
            ..self.stats
        }
    }

    /// Services a transaction that reached the controller at `tick`.
    ///
    /// The request starts once the channel is free, takes the timing model's
    /// latency, and its completion is posted as a `MemResponse` event.
    ///
    /// # Returns
    ///
    /// The completion tick, or `SimError::AddressOutOfRange` if the address is
    /// not backed by this controller.
    pub fn service(
        &mut self,
        mut txn: BusTransaction,
        tick: Tick,
        queue: &mut EventQueue<SimEvent>,
    ) -> Result<Tick, SimError> {
        if !self.range.contains(txn.address) {
            error!(txn = %txn, range = %self.range, "access outside physical memory");
            return Err(SimError::AddressOutOfRange {
                address: txn.address,
                range: self.range,
                core: txn.source,
            });
        }
        let start = tick.max(self.busy_until);
        let latency = self.timing.access_latency(txn.address);
        let done = start + latency;
        self.busy_until = done;
        self.stats.queue_ticks += start - tick;
        self.stats.busy_ticks += latency;
        match txn.kind {
            AccessType::Read => self.stats.reads += 1,
            AccessType::Write => self.stats.writes += 1,
        }
        debug!(txn = %txn, start, done, "controller service");
        txn.completion_tick = Some(done);
        let _ = queue.post(done, SimEvent::MemResponse(txn))?;
        Ok(done)
    }
}
