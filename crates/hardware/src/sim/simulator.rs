//! System coordinator: builds the simulated machine and runs the event loop.
//!
//! The coordinator owns every component side by side so that handlers can borrow
//! the pieces they need without interior mutability. It provides:
//! 1. **Build:** Validates the configuration, resolves the workload, and wires cores,
//!    functional-unit pools, bus and memory controller.
//! 2. **Run:** Pops events in `(tick, priority, sequence)` order and dispatches each to
//!    the component that owns it until a termination condition fires.
//! 3. **Report:** Final tick, exit cause and the counters of every component.

use std::fmt;

use tracing::{debug, error, info, trace};

use crate::common::{ConfigError, SimError, Tick};
use crate::config::{Config, FuPoolSharing};
use crate::core::Core;
use crate::core::cpu::CoreCtx;
use crate::core::units::fu::{FunctionalUnitPool, PoolId};
use crate::sim::dispatch::SimEvent;
use crate::sim::event::EventQueue;
use crate::sim::workload::Workload;
use crate::soc::interconnect::{BusStats, MemoryBus};
use crate::soc::memory::{ControllerStats, MemoryController};
use crate::stats::CoreStats;

/// Why the run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCause {
    /// Every core exhausted its instruction stream.
    WorkloadComplete,
    /// `general.max_ticks` was reached first.
    TickLimit,
    /// No events were left while some core had not finished.
    QueueDrained,
}

impl fmt::Display for ExitCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WorkloadComplete => "workload complete",
            Self::TickLimit => "simulate() limit reached",
            Self::QueueDrained => "event queue drained",
        };
        f.write_str(s)
    }
}

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExitReport {
    /// Tick at which the run stopped.
    pub tick: Tick,
    /// Termination condition.
    pub cause: ExitCause,
    /// `tick` converted to seconds at the configured clock.
    pub simulated_seconds: f64,
    /// Per-core counters, indexed by core id.
    pub cores: Vec<CoreStats>,
    /// Bus counters.
    pub bus: BusStats,
    /// Memory controller counters.
    pub controller: ControllerStats,
    /// Events dispatched over the run.
    pub events_dispatched: u64,
}

/// One dispatched event: `(tick, sequence, payload)`.
pub type DispatchRecord = (Tick, u64, SimEvent);

/// Owns the whole simulated system.
#[derive(Debug)]
pub struct SystemCoordinator {
    config: Config,
    queue: EventQueue<SimEvent>,
    cores: Vec<Core>,
    pools: Vec<FunctionalUnitPool>,
    bus: MemoryBus,
    controller: MemoryController,
    next_txn: u64,
    active: usize,
    dispatch_log: Option<Vec<DispatchRecord>>,
}

impl SystemCoordinator {
    /// Builds the system described by `config`, resolving `general.cmd` as the workload.
    ///
    /// Nothing is scheduled until [`run`](Self::run) is called.
    ///
    /// # Returns
    ///
    /// The coordinator, or `SimError::Config` if the configuration or the
    /// workload descriptor is invalid.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let workload = Workload::resolve(&config.general.cmd, config.general.num_cpus)?;
        Self::build(config, workload)
    }

    /// Builds the system with an explicit workload instead of `general.cmd`.
    pub fn with_workload(config: &Config, workload: Workload) -> Result<Self, SimError> {
        config.validate()?;
        Self::build(config, workload)
    }

    fn build(config: &Config, workload: Workload) -> Result<Self, SimError> {
        let n = config.general.num_cpus;
        if workload.threads.len() != n {
            return Err(ConfigError::InvalidWorkload {
                descriptor: workload.descriptor,
                reason: format!("{} threads for {n} cores", workload.threads.len()),
            }
            .into());
        }

        for inst in workload.threads.iter().flatten() {
            let kind = inst.op.unit();
            if config.fu_pool.unit(kind).is_none() {
                return Err(ConfigError::UnknownUnitKind(kind.to_string()).into());
            }
        }

        let pools = match config.fu_pool.sharing {
            FuPoolSharing::Shared => vec![FunctionalUnitPool::from_config(&config.fu_pool)?],
            FuPoolSharing::PerCore => (0..n)
                .map(|_| FunctionalUnitPool::from_config(&config.fu_pool))
                .collect::<Result<_, _>>()?,
        };

        let mut cores = Vec::with_capacity(n);
        for (id, program) in workload.threads.into_iter().enumerate() {
            let pool = match config.fu_pool.sharing {
                FuPoolSharing::Shared => PoolId(0),
                FuPoolSharing::PerCore => PoolId(id),
            };
            let mut core = Core::new(id, pool, program, config)?;
            if config.general.warm_icache {
                core.warm_icache();
            }
            cores.push(core);
        }

        let bus = MemoryBus::new(&config.system, n, config.cache.l1_d.line_bytes);
        let controller = MemoryController::from_config(&config.memory);
        info!(
            cores = n,
            pools = pools.len(),
            workload = %workload.descriptor,
            memory = %controller.range(),
            "system built"
        );

        Ok(Self {
            config: config.clone(),
            queue: EventQueue::new(),
            cores,
            pools,
            bus,
            controller,
            next_txn: 0,
            active: n,
            dispatch_log: config.general.record_dispatch.then(Vec::new),
        })
    }

    /// Current tick.
    pub const fn now(&self) -> Tick {
        self.queue.now()
    }

    /// Configuration the system was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Core `id`, if it exists.
    pub fn core(&self, id: usize) -> Option<&Core> {
        self.cores.get(id)
    }

    /// All cores, indexed by id.
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Functional-unit pools; one when shared, one per core otherwise.
    pub fn pools(&self) -> &[FunctionalUnitPool] {
        &self.pools
    }

    /// Shared memory bus.
    pub const fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    /// Memory controller.
    pub const fn controller(&self) -> &MemoryController {
        &self.controller
    }

    /// Dispatch log, when `general.record_dispatch` is set.
    pub fn dispatch_log(&self) -> Option<&[DispatchRecord]> {
        self.dispatch_log.as_deref()
    }

    /// Runs the event loop to a termination condition.
    ///
    /// # Returns
    ///
    /// The exit report, or the first fatal error raised by a component. Retryable
    /// conditions (busy units, bus back-pressure) never surface here.
    pub fn run(&mut self) -> Result<ExitReport, SimError> {
        for id in 0..self.cores.len() {
            self.with_core(id, |core, ctx| core.start(ctx))?;
        }

        loop {
            if let Some(limit) = self.config.general.max_ticks {
                if self.queue.peek_tick().is_some_and(|t| t > limit) {
                    info!(tick = limit, "tick limit reached");
                    return Ok(self.report(limit, ExitCause::TickLimit));
                }
            }
            let Some(event) = self.queue.pop_next() else {
                info!(tick = self.now(), active = self.active, "event queue drained");
                return Ok(self.report(self.now(), ExitCause::QueueDrained));
            };
            trace!(tick = event.tick, seq = event.seq, event = %event.payload, "dispatch");
            if let Some(log) = &mut self.dispatch_log {
                log.push((event.tick, event.seq, event.payload.clone()));
            }

            if let Err(e) = self.dispatch(event.payload) {
                error!(tick = self.now(), error = %e, "simulation aborted");
                return Err(e);
            }
            if self.active == 0 {
                let tick = self.now();
                info!(tick, "all cores finished");
                return Ok(self.report(tick, ExitCause::WorkloadComplete));
            }
        }
    }

    fn dispatch(&mut self, event: SimEvent) -> Result<(), SimError> {
        match event {
            SimEvent::Core { core, action } => self.with_core(core, |c, ctx| c.handle(action, ctx)),
            SimEvent::MemResponse(txn) => self.with_core(txn.source, |c, ctx| c.on_response(&txn, ctx)),
            SimEvent::BusArbitrate => {
                let _ = self.bus.arbitrate(&mut self.controller, &mut self.queue)?;
                Ok(())
            }
            SimEvent::WorkloadExit { core } => {
                self.active = self.active.saturating_sub(1);
                debug!(core, tick = self.now(), remaining = self.active, "core exited");
                Ok(())
            }
        }
    }

    /// Lends core `id` the shared state for one handler.
    fn with_core<F>(&mut self, id: usize, f: F) -> Result<(), SimError>
    where
        F: FnOnce(&mut Core, &mut CoreCtx<'_>) -> Result<(), SimError>,
    {
        let cores = self.cores.len();
        let Some(core) = self.cores.get_mut(id) else {
            return Err(SimError::UnknownCore { core: id, cores });
        };
        let pool = &mut self.pools[core.pool().0];
        let mut ctx = CoreCtx {
            queue: &mut self.queue,
            pool,
            bus: &mut self.bus,
            next_txn: &mut self.next_txn,
        };
        f(core, &mut ctx)
    }

    fn report(&self, tick: Tick, cause: ExitCause) -> ExitReport {
        ExitReport {
            tick,
            cause,
            simulated_seconds: tick as f64 / self.config.system.clock_hz as f64,
            cores: self.cores.iter().map(Core::stats).collect(),
            bus: self.bus.stats(),
            controller: self.controller.stats(),
            events_dispatched: self.queue.dispatched(),
        }
    }
}
