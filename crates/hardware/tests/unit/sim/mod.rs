//! Unit tests for the simulation engine.

/// Whole-system timing scenarios.
pub mod coordinator;


/// Workload descriptor resolution.
pub mod workload;
