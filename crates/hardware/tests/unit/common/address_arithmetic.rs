//! # Address Arithmetic Tests
//!
//! Line alignment and range membership of physical addresses.

use mcsim_core::common::{AddrRange, PhysAddr};
use rstest::rstest;

#[rstest]
#[case(0x1000, 64, 0x1000)]
#[case(0x103f, 64, 0x1000)]
#[case(0x1040, 64, 0x1040)]
#[case(0x1fff, 4096, 0x1000)]
fn align_down_to_line(#[case] addr: u64, #[case] line: u64, #[case] expected: u64) {
    assert_eq!(PhysAddr::new(addr).align_down(line), PhysAddr::new(expected));
}

#[test]
fn range_is_half_open() {
    let r = AddrRange::new(0x1000, 0x1000);
    assert_eq!(r.end(), 0x2000);
    assert!(r.contains(PhysAddr::new(0x1000)));
    assert!(r.contains(PhysAddr::new(0x1fff)));
    assert!(!r.contains(PhysAddr::new(0x2000)));
    assert!(!r.contains(PhysAddr::new(0x0fff)));
}

#[test]
fn from_u64_and_display() {
    let a: PhysAddr = 0x8000_0000.into();
    assert_eq!(a.val(), 0x8000_0000);
    assert_eq!(a.to_string(), "0x80000000");
}
