//! Pipeline Stage Handlers.
//!
//! This module implements the event handlers that move instructions through a core. It performs:
//! 1. **Fetch:** One instruction per cycle through the icache while the window has room.
//! 2. **Decode:** Marks the instruction decoded and wakes issue if it is next in program order.
//! 3. **Issue:** Single-issue, in order. A busy functional unit re-queues issue for the tick it frees.
//! 4. **Execute:** On unit completion, non-memory instructions finish; loads and stores go to the dcache.
//! 5. **Retire:** Strictly in program order from the window head. The exit event follows the last
//!    retirement once the core has no transactions left waiting for the bus.

use tracing::{debug, trace};

use super::{Core, CoreCtx};
use crate::common::{AccessType, CachePort, SimError, Tick};
use crate::core::pipeline::{InstState, WindowEntry};
use crate::core::units::cache::CacheAccess;
use crate::core::units::fu::IssueOutcome;
use crate::isa::Op;
use crate::sim::dispatch::{CoreAction, SimEvent};

impl Core {
    pub(super) fn fetch(&mut self, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        self.fetch_scheduled = false;
        if self.fetch_stalled {
            return Ok(());
        }
        if self.next_fetch >= self.program.len() {
            return self.check_exit(ctx);
        }
        if self.window.is_full() {
            return Ok(());
        }

        let now = ctx.now();
        let inst = self.program[self.next_fetch];
        let seq = self.window.next_seq();
        match self.icache.access(inst.pc, AccessType::Read, now, seq) {
            CacheAccess::Hit { ready_at } => {
                let _ = self.window.allocate(inst, InstState::Fetched, now);
                self.next_fetch += 1;
                trace!(core = self.id, seq, %inst, "fetch");
                ctx.post(ready_at, self.id, CoreAction::Decode(seq))?;
                if !self.window.is_full() {
                    self.schedule_fetch(ctx, now + 1)?;
                }
            }
            CacheAccess::Miss { line, merged } => {
                let _ = self.window.allocate(inst, InstState::FetchPending, now);
                self.next_fetch += 1;
                self.fetch_stalled = true;
                debug!(core = self.id, seq, %line, "icache miss");
                if !merged {
                    let txn =
                        self.new_transaction(ctx, CachePort::Instruction, line, AccessType::Read);
                    self.send(txn, ctx)?;
                }
            }
        }
        Ok(())
    }

    pub(super) fn decode(&mut self, seq: u64, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        let Some(entry) = self.window.get_mut(seq) else {
            return Ok(());
        };
        entry.state = InstState::Decoded;
        trace!(core = self.id, seq, "decode");
        let now = ctx.now();
        self.schedule_issue(ctx, now)
    }

    /// Oldest instruction that has not reserved a functional unit yet.
    fn issue_candidate(&self) -> Option<&WindowEntry> {
        self.window.iter().find(|e| {
            matches!(
                e.state,
                InstState::FetchPending | InstState::Fetched | InstState::Decoded | InstState::Issued
            )
        })
    }

    fn schedule_issue(&mut self, ctx: &mut CoreCtx<'_>, tick: Tick) -> Result<(), SimError> {
        if self.issue_scheduled {
            return Ok(());
        }
        let ready = self
            .issue_candidate()
            .is_some_and(|e| matches!(e.state, InstState::Decoded | InstState::Issued));
        if !ready {
            return Ok(());
        }
        let tick = self.last_issue_tick.map_or(tick, |last| tick.max(last + 1));
        self.issue_scheduled = true;
        ctx.post(tick, self.id, CoreAction::Issue)
    }

    pub(super) fn issue(&mut self, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        self.issue_scheduled = false;
        let now = ctx.now();
        let Some(seq) = self
            .issue_candidate()
            .filter(|e| matches!(e.state, InstState::Decoded | InstState::Issued))
            .map(|e| e.seq)
        else {
            return Ok(());
        };
        let id = self.id;
        let Some(entry) = self.window.get_mut(seq) else {
            return Ok(());
        };
        entry.state = InstState::Issued;
        let unit = entry.inst.op.unit();

        match ctx.pool.try_issue(unit, now)? {
            IssueOutcome::Issued { complete_at } => {
                entry.state = InstState::Executing;
                entry.complete_at = Some(complete_at);
                self.last_issue_tick = Some(now);
                trace!(core = id, seq, %unit, complete_at, "issue");
                ctx.post(complete_at, id, CoreAction::ExecuteDone(seq))?;
                self.schedule_issue(ctx, now + 1)
            }
            IssueOutcome::Busy { free_at } => {
                self.stats.fu_busy_stalls += 1;
                self.stats.fu_stall_ticks += free_at - now;
                debug!(core = id, seq, %unit, free_at, "functional unit busy");
                self.issue_scheduled = true;
                ctx.post(free_at, id, CoreAction::Issue)
            }
        }
    }

    pub(super) fn execute_done(&mut self, seq: u64, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        let Some(entry) = self.window.get_mut(seq) else {
            return Ok(());
        };
        match entry.inst.op.memory_access() {
            None => {
                entry.state = InstState::Completed;
                self.retire(ctx)
            }
            Some((addr, kind)) => {
                entry.state = InstState::MemoryRequested;
                self.access_data(seq, addr, kind, ctx)
            }
        }
    }

    pub(super) fn memory_done(&mut self, seq: u64, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        let Some(entry) = self.window.get_mut(seq) else {
            return Ok(());
        };
        entry.state = InstState::MemoryCompleted;
        self.retire(ctx)
    }

    fn retire(&mut self, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        let now = ctx.now();
        let mut retired = false;
        while let Some(entry) = self.window.retire_head() {
            retired = true;
            self.stats.instructions_retired += 1;
            self.stats.last_retire_tick = now;
            match entry.inst.op {
                Op::IntAlu => self.stats.inst_int_alu += 1,
                Op::IntMultDiv => self.stats.inst_int_mult_div += 1,
                Op::FloatSimd => self.stats.inst_float_simd += 1,
                Op::Load { .. } => self.stats.inst_load += 1,
                Op::Store { .. } => self.stats.inst_store += 1,
            }
            trace!(core = self.id, seq = entry.seq, "retire");
        }
        if retired && self.next_fetch < self.program.len() {
            self.schedule_fetch(ctx, now)?;
        }
        self.check_exit(ctx)
    }

    /// Raises the exit event once nothing is left to fetch, retire or hand to the bus.
    pub(super) fn check_exit(&mut self, ctx: &mut CoreCtx<'_>) -> Result<(), SimError> {
        if self.exited
            || self.next_fetch < self.program.len()
            || !self.window.is_empty()
            || !self.outbox.is_empty()
        {
            return Ok(());
        }
        self.exited = true;
        let now = ctx.now();
        debug!(
            core = self.id,
            tick = now,
            retired = self.stats.instructions_retired,
            "instruction stream exhausted"
        );
        let _ = ctx.queue.post(now, SimEvent::WorkloadExit { core: self.id })?;
        Ok(())
    }
}
