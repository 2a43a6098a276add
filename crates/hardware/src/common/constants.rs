//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Instruction Constants:** Encoded instruction size used to lay out synthetic program counters.
//! 2. **Data Constants:** Element width of the workloads' double-precision arrays.
//! 3. **Topology Limits:** Upper bounds enforced by configuration validation.

/// Size of one instruction in bytes; consecutive program counters differ by this.
pub const INSTRUCTION_BYTES: u64 = 4;

/// Size of one double-precision element in bytes.
pub const ELEMENT_BYTES: u64 = 8;

/// Largest supported core count (core ids are carried as `u16` on the wire).
pub const MAX_CORES: usize = 1024;

/// Sentinel written in place of a completion tick for transactions still in flight.
pub const PENDING_TICK: u64 = u64::MAX;
