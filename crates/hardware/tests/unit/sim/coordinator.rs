//! # System Coordinator Tests
//!
//! Whole-system timing scenarios: functional-unit contention across cores,
//! memory traffic, termination causes and run-to-run determinism.

use mcsim_core::common::{ConfigError, SimError};
use mcsim_core::config::{FuPoolSharing, MemoryControllerKind};
use mcsim_core::core::units::fu::FuKind;
use mcsim_core::sim::workload::Workload;
use mcsim_core::sim::{ExitCause, SystemCoordinator};
use pretty_assertions::assert_eq;

use crate::common::harness::{config, fp_config, run};

// ══════════════════════════════════════════════════════════
// 1. Functional-unit timing
// ══════════════════════════════════════════════════════════

#[test]
fn single_core_float_stream_is_fu_bound() {
    let c = fp_config(1, "fp:100", 4, 4, FuPoolSharing::Shared);
    let mut cold = c.clone();
    cold.general.warm_icache = false;

    for c in [c, cold] {
        let (_, report) = run(&c);
        assert_eq!(report.cause, ExitCause::WorkloadComplete);
        assert!(report.tick >= 800, "finished at {}", report.tick);
        assert_eq!(report.cores[0].instructions_retired, 100);
        assert_eq!(report.cores[0].inst_float_simd, 100);
        assert_eq!(report.cause.to_string(), "workload complete");
    }
}

#[test]
fn shared_pool_serialises_cores() {
    let c = fp_config(4, "fp:1", 4, 4, FuPoolSharing::Shared);
    let (system, report) = run(&c);

    assert_eq!(system.pools().len(), 1);
    // icache hit latency 2, then issue + op latency of 8 per core in turn.
    let done: Vec<_> = report.cores.iter().map(|s| s.last_retire_tick).collect();
    assert_eq!(done, vec![10, 18, 26, 34]);
    let stalls: Vec<_> = report.cores.iter().map(|s| s.fu_busy_stalls).collect();
    assert_eq!(stalls[0], 0);
    assert!(stalls[1..].iter().all(|&n| n >= 1), "stalls {stalls:?}");
    assert_eq!(report.tick, 34);
}

#[test]
fn private_pools_run_in_parallel() {
    let c = fp_config(4, "fp:1", 4, 4, FuPoolSharing::PerCore);
    let (system, report) = run(&c);

    assert_eq!(system.pools().len(), 4);
    assert!(report.cores.iter().all(|s| s.last_retire_tick == 10));
    assert!(report.cores.iter().all(|s| s.fu_busy_stalls == 0));
    assert_eq!(report.tick, 10);
}

#[test]
fn independent_units_overlap() {
    let c = fp_config(1, "int:4", 4, 4, FuPoolSharing::Shared);
    let (_, report) = run(&c);
    // IntAlu is 1 + 3 and single-issue: the unit frees every 4 ticks.
    assert_eq!(report.cores[0].instructions_retired, 4);
    assert_eq!(report.cores[0].last_retire_tick, 2 + 4 * 4);
}

// ══════════════════════════════════════════════════════════
// 2. Configuration errors
// ══════════════════════════════════════════════════════════

#[test]
fn zero_cores_fails_before_running() {
    let c = config(0, "fp:1");
    let err = SystemCoordinator::new(&c).unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::InvalidCoreCount { got: 0, .. })
    ));
}

#[test]
fn zero_float_latency_rejected() {
    let c = fp_config(1, "fp:1", 4, 0, FuPoolSharing::Shared);
    assert!(matches!(
        SystemCoordinator::new(&c),
        Err(SimError::Config(ConfigError::InvalidLatency { .. }))
    ));
}

#[test]
fn pool_without_a_needed_unit_fails_at_setup() {
    let mut c = config(2, "fp:10");
    c.fu_pool.units.retain(|u| u.kind != FuKind::FloatSimd);
    match SystemCoordinator::new(&c) {
        Err(SimError::Config(ConfigError::UnknownUnitKind(kind))) => {
            assert_eq!(kind, FuKind::FloatSimd.to_string());
        }
        other => panic!("expected UnknownUnitKind, got {other:?}"),
    }

    // Units the workload never uses may be left out.
    let mut c = config(2, "int:4");
    c.fu_pool.units.retain(|u| u.kind != FuKind::FloatSimd);
    let (_, report) = run(&c);
    assert_eq!(report.cause, ExitCause::WorkloadComplete);
}

#[test]
fn workload_must_match_core_count() {
    let c = config(2, "fp:1");
    let w = Workload::resolve("fp:1", 3).unwrap();
    assert!(SystemCoordinator::with_workload(&c, w).is_err());
}

// ══════════════════════════════════════════════════════════
// 3. Memory traffic
// ══════════════════════════════════════════════════════════

#[test]
fn daxpy_completes_through_memory() {
    let c = config(2, "daxpy:64");
    let (system, report) = run(&c);

    assert_eq!(report.cause, ExitCause::WorkloadComplete);
    let retired: u64 = report.cores.iter().map(|s| s.instructions_retired).sum();
    assert_eq!(retired, 64 * 7);
    for s in &report.cores {
        assert_eq!(s.inst_load, 64);
        assert_eq!(s.inst_store, 32);
        assert!(s.dcache.misses > 0);
        assert!(s.dcache.hits > 0);
        assert_eq!(s.icache.misses, 1);
    }
    assert!(report.controller.reads > 0);
    assert_eq!(report.bus.granted, report.controller.reads + report.controller.writes);
    assert_eq!(system.bus().queued(), 0);
    assert_eq!(system.controller().stats(), report.controller);
    assert_eq!(system.config(), &c);
    assert!(
        system
            .cores()
            .iter()
            .all(|core| core.has_exited() && core.remaining() == 0 && core.window().is_empty())
    );
    assert_eq!(system.core(1).map(|core| core.id()), Some(1));
}

#[test]
fn simple_controller_runs() {
    let mut c = config(1, "daxpy:16");
    c.memory.controller = MemoryControllerKind::Simple;
    let (_, report) = run(&c);
    assert_eq!(report.cause, ExitCause::WorkloadComplete);
    assert_eq!(report.controller.row_hits, 0);
}

#[test]
fn bus_backpressure_is_retried_not_dropped() {
    let mut c = config(4, "daxpy:64");
    c.system.bus_queue_capacity = 1;
    let (_, report) = run(&c);

    assert_eq!(report.cause, ExitCause::WorkloadComplete);
    let retired: u64 = report.cores.iter().map(|s| s.instructions_retired).sum();
    assert_eq!(retired, 64 * 7);
    assert!(report.cores.iter().map(|s| s.bus_retries).sum::<u64>() > 0);
    assert!(report.bus.overflows > 0);
    assert!(report.bus.max_queued <= 1);
}

#[test]
fn exit_waits_for_queued_transactions() {
    let mut c = config(4, "daxpy:64");
    c.system.bus_queue_capacity = 1;
    let (system, report) = run(&c);

    assert_eq!(report.cause, ExitCause::WorkloadComplete);
    assert!(system.cores().iter().all(|core| core.pending_transactions() == 0));
    let writebacks: u64 = report.cores.iter().map(|s| s.dcache.writebacks).sum();
    assert!(report.bus.routed >= writebacks);
}

#[test]
fn same_tick_misses_queue_before_the_first_grant() {
    // Both cold icaches miss at tick 0; arbitration must see both requests.
    let c = config(2, "fp:1");
    let (_, report) = run(&c);

    assert_eq!(report.bus.max_queued, 2);
    assert_eq!(report.bus.granted, 2);
    assert!(report.cores[0].last_retire_tick < report.cores[1].last_retire_tick);
}

#[test]
fn address_outside_memory_aborts() {
    let mut c = config(1, "daxpy:8");
    c.memory.size = 0x2_0000;
    let mut system = SystemCoordinator::new(&c).unwrap();
    match system.run() {
        Err(SimError::AddressOutOfRange { core, range, .. }) => {
            assert_eq!(core, 0);
            assert_eq!(range.size, 0x2_0000);
        }
        other => panic!("expected AddressOutOfRange, got {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════
// 4. Termination and determinism
// ══════════════════════════════════════════════════════════

#[test]
fn tick_limit_stops_the_run() {
    let mut c = fp_config(1, "fp:100", 4, 4, FuPoolSharing::Shared);
    c.general.max_ticks = Some(50);
    let (_, report) = run(&c);
    assert_eq!(report.cause, ExitCause::TickLimit);
    assert_eq!(report.tick, 50);
    assert!(report.cores[0].instructions_retired < 100);
    assert_eq!(report.cause.to_string(), "simulate() limit reached");
}

#[test]
fn empty_streams_finish_immediately() {
    let c = config(2, "fp:0");
    let (_, report) = run(&c);
    assert_eq!(report.cause, ExitCause::WorkloadComplete);
    assert_eq!(report.tick, 0);
}

#[test]
fn identical_runs_dispatch_identically() {
    let mut c = config(3, "daxpy:48");
    c.general.record_dispatch = true;
    let (a, ra) = run(&c);
    let (b, rb) = run(&c);

    let log = a.dispatch_log().unwrap();
    assert!(!log.is_empty());
    assert_eq!(log, b.dispatch_log().unwrap());
    assert_eq!(ra, rb);
    assert_eq!(ra.events_dispatched, log.len() as u64);
    assert!(log.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[test]
fn simulated_seconds_follow_clock() {
    let mut c = fp_config(1, "fp:10", 4, 4, FuPoolSharing::Shared);
    c.system.clock_hz = 1_000;
    let (_, report) = run(&c);
    let expected = report.tick as f64 / 1_000.0;
    assert!((report.simulated_seconds - expected).abs() < 1e-12);
}
