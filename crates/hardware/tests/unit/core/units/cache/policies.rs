//! # Cache Replacement Policy Tests
//!
//! Verifies victim selection for the LRU and FIFO policies on hand-built sets.

use mcsim_core::common::PhysAddr;
use mcsim_core::core::units::cache::policies::{FifoPolicy, LruPolicy, ReplacementPolicy};
use mcsim_core::core::units::cache::{CacheLine, LineState};

fn line(addr: u64, last_access_tick: u64, fill_tick: u64) -> CacheLine {
    CacheLine {
        address: PhysAddr::new(addr),
        state: LineState::Shared,
        last_access_tick,
        fill_tick,
    }
}

#[test]
fn lru_picks_oldest_access() {
    let set = [line(0x000, 9, 1), line(0x040, 3, 2), line(0x080, 7, 3), line(0x0c0, 5, 4)];
    assert_eq!(LruPolicy.get_victim(&set), 1);
}

#[test]
fn lru_ties_broken_by_lowest_address() {
    let set = [line(0x1c0, 4, 0), line(0x0c0, 4, 0), line(0x140, 4, 0), line(0x2c0, 8, 0)];
    assert_eq!(LruPolicy.get_victim(&set), 1);
}

#[test]
fn fifo_ignores_recent_hits() {
    let set = [line(0x000, 50, 2), line(0x040, 1, 1)];
    assert_eq!(FifoPolicy.get_victim(&set), 1);
    let set = [line(0x000, 1, 1), line(0x040, 0, 2)];
    assert_eq!(FifoPolicy.get_victim(&set), 0);
}

#[test]
fn names() {
    assert_eq!(LruPolicy.name(), "LRU");
    assert_eq!(FifoPolicy.name(), "FIFO");
}
