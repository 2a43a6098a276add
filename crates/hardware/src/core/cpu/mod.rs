//! Core Timing Model.
//!
//! This module defines the `Core` structure, the per-core half of the simulated
//! system. It coordinates the following:
//! 1. **Pipeline:** In-order, single-issue fetch, decode, issue, execute and retire, each
//!    stage driven by its own event.
//! 2. **Functional units:** Issue reserves a unit in the pool the core is attached to;
//!    a busy unit stalls issue until the tick it frees.
//! 3. **Memory hierarchy:** Private instruction and data caches; misses and write-backs
//!    leave the core as bus transactions.
//! 4. **Completion:** Once the instruction stream is exhausted, the window has drained and
//!    every queued transaction has reached the bus, the core raises a workload-exit event.
//!
//! Shared resources (event queue, functional-unit pool, bus) are lent to the core
//! for the duration of one handler through `CoreCtx`.

/// Pipeline stage handlers (fetch, decode, issue, execute, retire).
pub mod execution;

/// Cache access, memory responses and bus hand-off.
pub mod memory;

use std::collections::VecDeque;

use crate::common::{AccessType, CachePort, CoreId, PhysAddr, SimError, Tick};
use crate::config::Config;
use crate::core::pipeline::InFlightWindow;
use crate::core::units::cache::CacheModel;
use crate::core::units::fu::{FunctionalUnitPool, PoolId};
use crate::isa::Instruction;
use crate::sim::dispatch::{CoreAction, SimEvent};
use crate::sim::event::EventQueue;
use crate::soc::interconnect::MemoryBus;
use crate::soc::transaction::{BusTransaction, TxnId};
use crate::stats::CoreStats;

/// Shared state a core handler may touch.
#[derive(Debug)]
pub struct CoreCtx<'a> {
    /// Event queue; also the clock.
    pub queue: &'a mut EventQueue<SimEvent>,
    /// The pool this core issues into.
    pub pool: &'a mut FunctionalUnitPool,
    /// Shared memory bus.
    pub bus: &'a mut MemoryBus,
    /// System-wide transaction id counter.
    pub next_txn: &'a mut u64,
}

impl CoreCtx<'_> {
    /// Current tick.
    pub fn now(&self) -> Tick {
        self.queue.now()
    }

    /// Posts a core event at `tick`.
    pub fn post(&mut self, tick: Tick, core: CoreId, action: CoreAction) -> Result<(), SimError> {
        let _ = self.queue.post(tick, SimEvent::core(core, action))?;
        Ok(())
    }

    fn alloc_txn(&mut self) -> TxnId {
        let id = TxnId(*self.next_txn);
        *self.next_txn += 1;
        id
    }
}

/// One simulated core.
#[derive(Debug)]
pub struct Core {
    id: CoreId,
    pool: PoolId,
    /// L1 instruction cache.
    pub icache: CacheModel,
    /// L1 data cache.
    pub dcache: CacheModel,
    program: Vec<Instruction>,
    next_fetch: usize,
    window: InFlightWindow,
    fetch_scheduled: bool,
    fetch_stalled: bool,
    issue_scheduled: bool,
    last_issue_tick: Option<Tick>,
    retry_scheduled: bool,
    outbox: VecDeque<BusTransaction>,
    exited: bool,
    stats: CoreStats,
}

impl Core {
    /// Creates a core running `program`.
    ///
    /// # Arguments
    ///
    /// * `id` - Core index.
    /// * `pool` - Functional-unit pool the core issues into.
    /// * `program` - The core's instruction stream.
    /// * `config` - Validated system configuration (caches, window size).
    pub fn new(
        id: CoreId,
        pool: PoolId,
        program: Vec<Instruction>,
        config: &Config,
    ) -> Result<Self, SimError> {
        Ok(Self {
            id,
            pool,
            icache: CacheModel::new("icache", &config.cache.l1_i)?,
            dcache: CacheModel::new("dcache", &config.cache.l1_d)?,
            program,
            next_fetch: 0,
            window: InFlightWindow::new(config.pipeline.max_in_flight),
            fetch_scheduled: false,
            fetch_stalled: false,
            issue_scheduled: false,
            last_issue_tick: None,
            retry_scheduled: false,
            outbox: VecDeque::new(),
            exited: false,
            stats: CoreStats::default(),
        })
    }

    /// Core index.
    pub const fn id(&self) -> CoreId {
        self.id
    }

    /// Pool the core issues into.
    pub const fn pool(&self) -> PoolId {
        self.pool
    }

    /// Returns whether the core has raised its exit event.
    pub const fn has_exited(&self) -> bool {
        self.exited
    }

    /// Instructions not yet fetched.
    pub fn remaining(&self) -> usize {
        self.program.len() - self.next_fetch
    }

    /// Transactions waiting in the core for bus capacity.
    pub fn pending_transactions(&self) -> usize {
        self.outbox.len()
    }

    /// The in-flight window.
    pub const fn window(&self) -> &InFlightWindow {
        &self.window
    }

    /// Counters, including both caches.
    pub fn stats(&self) -> CoreStats {
        CoreStats {
            icache: self.icache.stats(),
            dcache: self.dcache.stats(),
            ..self.stats
        }
    }

    /// Installs every instruction line of the program into the icache.
    pub fn warm_icache(&mut self) {
        for inst in &self.program {
            self.icache.warm(inst.pc);
        }
    }

    /// Schedules the first fetch at the current tick.
    pub fn start(&mut self, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        let now = ctx.now();
        self.schedule_fetch(ctx, now)
    }

    /// Runs one pipeline action.
    pub fn handle(&mut self, action: CoreAction, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        match action {
            CoreAction::Fetch => self.fetch(ctx),
            CoreAction::Decode(seq) => self.decode(seq, ctx),
            CoreAction::Issue => self.issue(ctx),
            CoreAction::ExecuteDone(seq) => self.execute_done(seq, ctx),
            CoreAction::MemoryDone(seq) => self.memory_done(seq, ctx),
            CoreAction::BusRetry => {
                self.retry_scheduled = false;
                self.drain_outbox(ctx)?;
                self.check_exit(ctx)
            }
        }
    }

    fn schedule_fetch(&mut self, ctx: &mut CoreCtx<'_>, tick: Tick) -> Result<(), SimError> {
        if self.fetch_scheduled || self.fetch_stalled {
            return Ok(());
        }
        self.fetch_scheduled = true;
        ctx.post(tick, self.id, CoreAction::Fetch)
    }

    fn new_transaction(
        &self,
        ctx: &mut CoreCtx<'_>,
        port: CachePort,
        line: PhysAddr,
        kind: AccessType,
    ) -> BusTransaction {
        let id = ctx.alloc_txn();
        BusTransaction::new(id, self.id, port, line, kind, ctx.now())
    }
}
