//! Simulation engine.
//!
//! Provides the discrete-event queue that drives every component, the event
//! payloads exchanged between them, workload resolution, and the coordinator
//! that owns the system and runs the loop.

/// Event payloads and their same-tick ordering.
pub mod dispatch;

/// Deterministic discrete-event queue.
pub mod event;

/// System coordinator and exit report.
pub mod simulator;

/// Workload descriptors and instruction streams.
pub mod workload;

pub use simulator::{ExitCause, ExitReport, SystemCoordinator};
