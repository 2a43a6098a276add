//! Common utilities and types used throughout the simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Time and Identity:** The `Tick` time unit and `CoreId` core index.
//! 2. **Address Types:** Strong types for physical addresses and address ranges.
//! 3. **Constants:** Instruction size, element size and topology limits.
//! 4. **Memory Access:** Direction of an access and the cache port it belongs to.
//! 5. **Error Handling:** Configuration, simulation and wire-decoding errors.

/// Address type definitions (physical addresses and ranges).
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types.
pub mod error;

/// Indivisible unit of simulated time; one core clock cycle.
pub type Tick = u64;

/// Index of a core inside the simulated system, `0..num_cpus`.
pub type CoreId = usize;

pub use addr::{AddrRange, PhysAddr};
pub use data::{AccessType, CachePort};
pub use error::{ConfigError, SimError, WireError};
