//! # In-Flight Window Tests
//!
//! Program-order allocation and in-order retirement.

use mcsim_core::core::pipeline::{InFlightWindow, InstState};
use mcsim_core::isa::{Instruction, Op};

fn inst(i: u64) -> Instruction {
    Instruction::new(0x1000 + 4 * i, Op::IntAlu)
}

#[test]
fn allocation_stops_at_capacity() {
    let mut w = InFlightWindow::new(2);
    assert_eq!(w.allocate(inst(0), InstState::Fetched, 0), Some(0));
    assert_eq!(w.allocate(inst(1), InstState::Fetched, 1), Some(1));
    assert!(w.is_full());
    assert_eq!(w.allocate(inst(2), InstState::Fetched, 2), None);
    assert_eq!(w.next_seq(), 2);
}

#[test]
fn retirement_is_in_program_order() {
    let mut w = InFlightWindow::new(4);
    for i in 0..3 {
        let _ = w.allocate(inst(i), InstState::Decoded, i);
    }
    w.get_mut(1).unwrap().state = InstState::Completed;
    assert!(w.retire_head().is_none());

    w.get_mut(0).unwrap().state = InstState::MemoryCompleted;
    assert_eq!(w.retire_head().map(|e| e.seq), Some(0));
    assert_eq!(w.retire_head().map(|e| e.seq), Some(1));
    assert!(w.retire_head().is_none());
    assert_eq!(w.len(), 1);
    assert_eq!(w.oldest_in(InstState::Decoded).map(|e| e.seq), Some(2));
}

#[test]
fn lookup_after_retire() {
    let mut w = InFlightWindow::new(4);
    let _ = w.allocate(inst(0), InstState::Completed, 0);
    let _ = w.allocate(inst(1), InstState::Fetched, 0);
    let _ = w.retire_head();
    assert!(w.get(0).is_none());
    assert_eq!(w.get(1).map(|e| e.inst.pc.val()), Some(0x1004));
    assert!(w.get(9).is_none());
}
