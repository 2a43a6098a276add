//! # Unit Components
//!
//! This module serves as the central hub for the component tests, organised the
//! way the library is: common types, configuration, the per-core model, the
//! shared SoC side, and the simulation engine.

/// Unit tests for address and error types.
pub mod common;


/// Functional-unit pool, caches and the in-flight window.
pub mod core;

/// Event queue, workloads and whole-system scenarios.
pub mod sim;

/// Bus transactions, interconnect and memory controller.
pub mod soc;

/// Exit report counters.
pub mod stats_verification;
