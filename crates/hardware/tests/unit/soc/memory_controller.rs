//! # Memory Controller Tests
//!
//! Open-row DRAM latencies, channel serialisation and range checking.

use mcsim_core::common::{AccessType, AddrRange, CachePort, PhysAddr, SimError};
use mcsim_core::config::MemoryConfig;
use mcsim_core::sim::dispatch::SimEvent;
use mcsim_core::sim::event::EventQueue;
use mcsim_core::soc::memory::{DramTiming, MemoryController, SimpleTiming, TimingModel};
use mcsim_core::soc::transaction::{BusTransaction, TxnId};
use rstest::rstest;

fn read(id: u64, addr: u64) -> BusTransaction {
    BusTransaction::new(TxnId(id), 0, CachePort::Data, PhysAddr::new(addr), AccessType::Read, 0)
}

/// `(previous access, this access, expected latency)` with tCAS 10, tRAS 20, tPRE 30, 2 KiB rows.
#[rstest]
#[case(None, 0x0000, 20 + 10)]
#[case(Some(0x0000), 0x07c0, 10)]
#[case(Some(0x0000), 0x0800, 30 + 20 + 10)]
#[case(Some(0x1800), 0x1fff, 10)]
fn dram_open_row_latency(#[case] previous: Option<u64>, #[case] addr: u64, #[case] expected: u64) {
    let mut dram = DramTiming::new(10, 20, 30, 2048);
    if let Some(p) = previous {
        let _ = dram.access_latency(PhysAddr::new(p));
    }
    assert_eq!(dram.access_latency(PhysAddr::new(addr)), expected);
}

#[test]
fn dram_counts_row_hits() {
    let mut dram = DramTiming::new(1, 1, 1, 1024);
    for addr in [0x000, 0x040, 0x400, 0x440, 0x000] {
        let _ = dram.access_latency(PhysAddr::new(addr));
    }
    assert_eq!(dram.row_hits(), 2);
}

#[test]
fn service_posts_completion() {
    let mut ctrl = MemoryController::new(AddrRange::new(0, 1 << 20), Box::new(SimpleTiming::new(100)));
    let mut q = EventQueue::new();
    assert_eq!(ctrl.service(read(1, 0x40), 12, &mut q).unwrap(), 112);

    let ev = q.pop_next().unwrap();
    assert_eq!(ev.tick, 112);
    match ev.payload {
        SimEvent::MemResponse(txn) => {
            assert_eq!(txn.id, TxnId(1));
            assert_eq!(txn.completion_tick, Some(112));
            assert_eq!(txn.latency(), Some(112));
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn channel_serialises_requests() {
    let mut ctrl = MemoryController::new(AddrRange::new(0, 1 << 20), Box::new(SimpleTiming::new(50)));
    let mut q = EventQueue::new();
    assert_eq!(ctrl.service(read(1, 0x000), 10, &mut q).unwrap(), 60);
    assert_eq!(ctrl.service(read(2, 0x040), 20, &mut q).unwrap(), 110);
    assert_eq!(ctrl.service(read(3, 0x080), 200, &mut q).unwrap(), 250);
    let s = ctrl.stats();
    assert_eq!(s.reads, 3);
    assert_eq!(s.queue_ticks, 40);
    assert_eq!(s.busy_ticks, 150);
}

#[test]
fn out_of_range_is_fatal() {
    let mut ctrl = MemoryController::from_config(&MemoryConfig {
        size: 0x1000,
        ..MemoryConfig::default()
    });
    let mut q = EventQueue::new();
    let err = ctrl.service(read(1, 0x1000), 0, &mut q).unwrap_err();
    assert!(matches!(err, SimError::AddressOutOfRange { core: 0, .. }));
    assert!(err.is_fatal());
    assert!(q.is_empty());
}

#[test]
fn default_config_uses_ddr3_timing() {
    let mut ctrl = MemoryController::from_config(&MemoryConfig::default());
    let mut q = EventQueue::new();
    assert_eq!(ctrl.service(read(1, 0x0), 0, &mut q).unwrap(), 42 + 42);
    assert_eq!(ctrl.service(read(2, 0x40), 84, &mut q).unwrap(), 84 + 42);
    assert_eq!(ctrl.stats().row_hits, 1);
}
