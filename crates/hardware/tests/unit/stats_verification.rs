//! # Statistics Verification Tests
//!
//! Checks that the exit report's counters agree with each other and with the
//! workload that produced them.

use mcsim_core::config::FuPoolSharing;
use mcsim_core::core::units::cache::CacheStats;
use mcsim_core::stats::{CoreStats, STATS_SECTIONS};

use crate::common::harness::{config, fp_config, run};

#[test]
fn instruction_mix_sums_to_retired() {
    let (_, report) = run(&config(2, "daxpy:20"));
    for s in &report.cores {
        let mix = s.inst_int_alu + s.inst_int_mult_div + s.inst_float_simd + s.inst_load + s.inst_store;
        assert_eq!(mix, s.instructions_retired);
        assert_eq!(s.inst_float_simd, 2 * s.inst_store);
        assert_eq!(s.inst_int_alu, 2 * s.inst_store);
    }
}

#[test]
fn cache_accesses_cover_every_instruction() {
    let c = fp_config(1, "fp:40", 1, 1, FuPoolSharing::Shared);
    let (_, report) = run(&c);
    let s = report.cores[0];
    assert_eq!(s.icache.hits + s.icache.misses, 40);
    assert_eq!(s.icache.misses, 0);
    assert_eq!(s.dcache, CacheStats::default());
    assert_eq!(s.mem_responses, 0);
}

#[test]
fn stall_ticks_accumulate_with_stalls() {
    let c = fp_config(2, "fp:5", 4, 4, FuPoolSharing::Shared);
    let (_, report) = run(&c);
    let stalls: u64 = report.cores.iter().map(|s| s.fu_busy_stalls).sum();
    let ticks: u64 = report.cores.iter().map(|s| s.fu_stall_ticks).sum();
    assert!(stalls > 0);
    assert!(ticks >= stalls);
}

#[test]
fn report_prints_every_section() {
    let (_, report) = run(&config(1, "int:3"));
    assert_eq!(STATS_SECTIONS, &["summary", "core", "memory"]);
    report.print();
    report.print_sections(&["summary".to_string()]);
    assert_eq!(CoreStats::default().instructions_retired, 0);
}
