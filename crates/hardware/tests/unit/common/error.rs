//! # Error Tests
//!
//! Display text and fatality classification of simulation errors.

use mcsim_core::common::{AddrRange, ConfigError, PhysAddr, SimError};
use mcsim_core::core::units::fu::FuKind;

#[test]
fn only_queue_overflow_is_recoverable() {
    assert!(!SimError::QueueOverflow { capacity: 4 }.is_fatal());
    assert!(SimError::InvalidTick { tick: 1, now: 2 }.is_fatal());
    assert!(SimError::UnknownUnitKind(FuKind::FloatSimd).is_fatal());
    assert!(
        SimError::AddressOutOfRange {
            address: PhysAddr::new(0x9000_0000),
            range: AddrRange::new(0, 0x1000),
            core: 3,
        }
        .is_fatal()
    );
}

#[test]
fn out_of_range_names_core_and_range() {
    let e = SimError::AddressOutOfRange {
        address: PhysAddr::new(0x2000),
        range: AddrRange::new(0, 0x1000),
        core: 1,
    };
    assert_eq!(e.to_string(), "core 1 accessed 0x2000, outside memory range [0x0, 0x1000)");
}

#[test]
fn config_errors_convert() {
    let e: SimError = ConfigError::InvalidCoreCount { got: 0, max: 1024 }.into();
    assert!(matches!(e, SimError::Config(ConfigError::InvalidCoreCount { got: 0, .. })));
    assert!(e.to_string().contains("num_cpus must be between 1 and 1024"));
}
