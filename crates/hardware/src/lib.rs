//! Multi-core functional-unit and memory-timing simulator library.
//!
//! This crate implements a deterministic, cycle-level discrete-event simulator with the following:
//! 1. **Core:** In-order single-issue pipeline per core, timed against configurable functional units.
//! 2. **Memory:** Private L1 instruction and data caches with LRU or FIFO replacement.
//! 3. **SoC:** A shared round-robin memory bus and a DRAM-timed memory controller.
//! 4. **Simulation:** Event queue, workload resolution, the system coordinator and exit reporting.

/// Common types and constants (addresses, access types, errors).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU core timing model (pipeline, window, functional units, caches).
pub mod core;
/// Timing-level instruction representation.
pub mod isa;
/// Event queue, workloads and the system coordinator.
pub mod sim;
/// System-on-chip (transactions, bus, memory controller).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Per-core timing model.
pub use crate::core::Core;
/// Top-level system; construct with `SystemCoordinator::new` and call `run`.
pub use crate::sim::{ExitCause, ExitReport, SystemCoordinator};
