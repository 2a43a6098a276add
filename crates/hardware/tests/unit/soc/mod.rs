//! Unit tests for the shared side of the system.

/// Round-robin arbitration, queue capacity and transit timing.
pub mod interconnect;

/// DRAM and fixed-latency controller timing.
pub mod memory_controller;
