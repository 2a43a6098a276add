//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the multi-core simulator. It provides:
//! 1. **Per-core counters:** Retired instructions by class, functional-unit stalls and bus retries.
//! 2. **Cache counters:** Hits, misses, merged misses and write-backs for both L1 caches.
//! 3. **Shared counters:** Bus grants and overflows, controller reads, writes and row hits.
//! 4. **Reporting:** A gem5-style text dump of the exit report.

use crate::common::Tick;
use crate::core::units::cache::CacheStats;
use crate::sim::simulator::ExitReport;

/// Counters for one core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreStats {
    /// Instructions retired.
    pub instructions_retired: u64,
    /// Integer ALU instructions retired.
    pub inst_int_alu: u64,
    /// Integer multiply/divide instructions retired.
    pub inst_int_mult_div: u64,
    /// Float/SIMD instructions retired.
    pub inst_float_simd: u64,
    /// Loads retired.
    pub inst_load: u64,
    /// Stores retired.
    pub inst_store: u64,
    /// Issue attempts that found their functional unit busy.
    pub fu_busy_stalls: u64,
    /// Ticks instructions waited on a busy functional unit.
    pub fu_stall_ticks: u64,
    /// `route` attempts refused by a full bus.
    pub bus_retries: u64,
    /// Memory responses received.
    pub mem_responses: u64,
    /// Instruction cache counters.
    pub icache: CacheStats,
    /// Data cache counters.
    pub dcache: CacheStats,
    /// Tick the last instruction retired.
    pub last_retire_tick: Tick,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"core"`, `"memory"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "core", "memory"];

impl ExitReport {
    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let ticks = self.tick.max(1);
        let retired: u64 = self.cores.iter().map(|c| c.instructions_retired).sum();

        if want("summary") {
            println!("\n==========================================================");
            println!("MULTI-CORE TIMING SIMULATION STATISTICS");
            println!("==========================================================");
            println!("sim_ticks                {}", self.tick);
            println!("sim_seconds              {:.9}", self.simulated_seconds);
            println!("sim_insts                {retired}");
            println!("sim_ipc                  {:.4}", retired as f64 / ticks as f64);
            println!("sim_events               {}", self.events_dispatched);
            println!("exit_cause               {}", self.cause);
            println!("----------------------------------------------------------");
        }
        if want("core") {
            println!("CORE BREAKDOWN");
            for (i, c) in self.cores.iter().enumerate() {
                println!(
                    "  cpu{i:<3} insts: {:<10} | ipc: {:.4} | fu_stalls: {:<8} | bus_retries: {}",
                    c.instructions_retired,
                    c.instructions_retired as f64 / ticks as f64,
                    c.fu_busy_stalls,
                    c.bus_retries
                );
                println!(
                    "          mix: int {} | mul {} | fp {} | load {} | store {}",
                    c.inst_int_alu, c.inst_int_mult_div, c.inst_float_simd, c.inst_load, c.inst_store
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("memory") {
            let print_cache = |name: String, s: &CacheStats| {
                let total = s.hits + s.misses;
                let miss_rate = if total > 0 {
                    (s.misses as f64 / total as f64) * 100.0
                } else {
                    0.0
                };
                println!(
                    "  {name:<10} accesses: {total:<10} | hits: {:<10} | miss_rate: {miss_rate:.2}% | writebacks: {}",
                    s.hits, s.writebacks
                );
            };
            println!("MEMORY HIERARCHY");
            for (i, c) in self.cores.iter().enumerate() {
                print_cache(format!("cpu{i}.L1-I"), &c.icache);
                print_cache(format!("cpu{i}.L1-D"), &c.dcache);
            }
            println!(
                "  membus     granted: {} | overflows: {} | max_queued: {} | busy: {} ticks",
                self.bus.granted, self.bus.overflows, self.bus.max_queued, self.bus.busy_ticks
            );
            println!(
                "  mem_ctrl   reads: {} | writes: {} | row_hits: {} | queue: {} ticks",
                self.controller.reads,
                self.controller.writes,
                self.controller.row_hits,
                self.controller.queue_ticks
            );
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
