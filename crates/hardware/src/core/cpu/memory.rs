//! Memory Access Handling.
//!
//! This module connects a core's caches to the shared bus. It handles:
//! 1. **Data accesses:** Loads and stores look up the dcache once their unit finishes; a miss
//!    (including a store miss, which allocates) requests the line with a read.
//! 2. **Responses:** Fills wake every instruction waiting on the line.
//! 3. **Back-pressure:** Transactions the bus refuses stay queued in the core and are retried
//!    on the next tick; none are ever dropped.

use tracing::{debug, trace};

use super::{Core, CoreCtx};
use crate::common::{AccessType, CachePort, PhysAddr, SimError};
use crate::core::pipeline::InstState;
use crate::core::units::cache::CacheAccess;
use crate::sim::dispatch::CoreAction;
use crate::soc::transaction::BusTransaction;

impl Core {
    pub(super) fn access_data(
        &mut self,
        seq: u64,
        addr: PhysAddr,
        kind: AccessType,
        ctx: &mut CoreCtx<'_>,
    ) -> Result<(), SimError> {
        let now = ctx.now();
        match self.dcache.access(addr, kind, now, seq) {
            CacheAccess::Hit { ready_at } => ctx.post(ready_at, self.id, CoreAction::MemoryDone(seq)),
            CacheAccess::Miss { line, merged } => {
                debug!(core = self.id, seq, %addr, %kind, merged, "dcache miss");
                if merged {
                    return Ok(());
                }
                let txn = self.new_transaction(ctx, CachePort::Data, line, AccessType::Read);
                self.send(txn, ctx)
            }
        }
    }

    /// Handles a completed bus transaction issued by this core.
    pub fn on_response(&mut self, txn: &BusTransaction, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        let now = ctx.now();
        self.stats.mem_responses += 1;
        trace!(core = self.id, txn = %txn, latency = ?txn.latency(), "response");
        match (txn.port, txn.kind) {
            (CachePort::Instruction, AccessType::Read) => {
                for seq in self.icache.fill(txn.address, now) {
                    if let Some(entry) = self.window.get_mut(seq) {
                        entry.state = InstState::Fetched;
                        ctx.post(now, self.id, CoreAction::Decode(seq))?;
                    }
                }
                self.fetch_stalled = false;
                if self.next_fetch < self.program.len() && !self.window.is_full() {
                    self.schedule_fetch(ctx, now)?;
                }
                Ok(())
            }
            (CachePort::Data, AccessType::Read) => {
                for seq in self.dcache.fill(txn.address, now) {
                    ctx.post(now, self.id, CoreAction::MemoryDone(seq))?;
                }
                self.drain_outbox(ctx)
            }
            // Write-back acknowledgements carry nothing back to the pipeline.
            (_, AccessType::Write) => Ok(()),
        }
    }

    pub(super) fn send(&mut self, txn: BusTransaction, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        self.outbox.push_back(txn);
        self.drain_outbox(ctx)
    }

    /// Hands queued transactions, dirty victims first, to the bus in order.
    pub(super) fn drain_outbox(&mut self, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        while let Some(line) = self.dcache.pop_writeback() {
            let txn = self.new_transaction(ctx, CachePort::Data, line, AccessType::Write);
            self.outbox.push_back(txn);
        }
        let now = ctx.now();
        while let Some(txn) = self.outbox.pop_front() {
            match ctx.bus.route(txn.clone(), now, ctx.queue) {
                Ok(()) => {}
                Err(SimError::QueueOverflow { capacity }) => {
                    self.outbox.push_front(txn);
                    self.stats.bus_retries += 1;
                    debug!(core = self.id, capacity, "bus full, retrying next tick");
                    if !self.retry_scheduled {
                        self.retry_scheduled = true;
                        ctx.post(now + 1, self.id, CoreAction::BusRetry)?;
                    }
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
