//! Core timing model.
//!
//! This module contains the per-core half of the system: the event-driven
//! in-order pipeline, its in-flight window, and the units it issues into
//! (functional-unit pools and private L1 caches).

/// Core timing model (pipeline handlers and memory hand-off).
pub mod cpu;

/// In-flight instruction window.
pub mod pipeline;

/// Functional units and caches.
pub mod units;

pub use self::cpu::Core;
