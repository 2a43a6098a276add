//! Event payloads and same-tick ordering.
//!
//! Every future action in the system is one `SimEvent` in the coordinator's
//! `EventQueue`. Among events due in the same tick the classes fire in a fixed
//! order:
//! 1. **Memory responses**, so data is visible to cores in the tick it arrives.
//! 2. **Core pipeline actions**, in insertion order across cores.
//! 3. **Bus arbitration**, once every core has queued its requests for the tick,
//!    so the round-robin pointer alone picks among them.
//! 4. **Workload exits**, after every core has acted in the tick.

use std::fmt;

use super::event::{EventId, EventQueue};
use crate::common::{CoreId, SimError, Tick};
use crate::soc::transaction::BusTransaction;

/// Pipeline step a core performs when its event fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoreAction {
    /// Fetch the next instruction through the icache.
    Fetch,
    /// Decode the instruction with this sequence number.
    Decode(u64),
    /// Try to issue the oldest decoded instruction.
    Issue,
    /// Functional unit finished the instruction.
    ExecuteDone(u64),
    /// Data access of the instruction completed.
    MemoryDone(u64),
    /// Retry handing queued transactions to the bus after back-pressure.
    BusRetry,
}

/// Payload of every scheduled event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// Work for one core.
    Core {
        /// Target core.
        core: CoreId,
        /// Pipeline step.
        action: CoreAction,
    },
    /// The memory controller finished a transaction.
    MemResponse(BusTransaction),
    /// The bus may grant the next queued transaction.
    BusArbitrate,
    /// A core's instruction stream is exhausted and its window drained.
    WorkloadExit {
        /// Finished core.
        core: CoreId,
    },
}

impl SimEvent {
    /// Same-tick ordering class; lower fires first.
    pub const fn priority(&self) -> i32 {
        match self {
            Self::MemResponse(_) => 0,
            Self::Core { .. } => 1,
            Self::BusArbitrate => 2,
            Self::WorkloadExit { .. } => 3,
        }
    }

    /// Shorthand for a core event.
    pub const fn core(core: CoreId, action: CoreAction) -> Self {
        Self::Core { core, action }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core { core, action } => write!(f, "core{core} {action:?}"),
            Self::MemResponse(txn) => write!(f, "response {txn}"),
            Self::BusArbitrate => write!(f, "bus arbitrate"),
            Self::WorkloadExit { core } => write!(f, "core{core} exit"),
        }
    }
}

impl EventQueue<SimEvent> {
    /// Schedules `event` at `tick` with its class priority.
    pub fn post(&mut self, tick: Tick, event: SimEvent) -> Result<EventId, SimError> {
        let priority = event.priority();
        self.schedule_with_priority(tick, priority, event)
    }
}
