//! System-on-Chip (SoC) Components.
//!
//! This module organizes the shared side of the simulated system: the
//! transactions the caches emit, the bus that arbitrates them, and the memory
//! controller that services them.

/// Memory bus with round-robin arbitration.
pub mod interconnect;

/// Memory controller and DRAM timing models.
pub mod memory;

/// Bus transactions and their wire encoding.
pub mod transaction;

pub use interconnect::{MemoryBus, RoundRobinArbiter};
pub use memory::MemoryController;
pub use transaction::{BusTransaction, TxnId};
