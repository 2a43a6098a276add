//! Unit tests for the per-core components.

/// In-flight window ordering.
pub mod pipeline;

/// Functional units and caches.
pub mod units;
